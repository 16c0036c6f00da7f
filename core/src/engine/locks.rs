//! Container Locks
//!
//! Serializes mutation per ordering domain. Operations touching several
//! domains acquire their keys in sorted order so two movers can never wait
//! on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::Container;

/// One ordering domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    /// The global collection list
    Collections,
    /// Counters of the pool or of one collection
    Container(Container),
}

impl From<Container> for LockKey {
    fn from(container: Container) -> Self {
        LockKey::Container(container)
    }
}

/// Guards held for the duration of one operation
#[must_use]
pub struct LockSet {
    keys: Vec<LockKey>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

/// Registry of per-domain async mutexes
#[derive(Default)]
pub struct ContainerLocks {
    slots: StdMutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl ContainerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: LockKey) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key).or_default().clone()
    }

    /// Lock every key in `keys` (duplicates collapse)
    pub async fn acquire<I>(&self, keys: I) -> LockSet
    where
        I: IntoIterator<Item = LockKey>,
    {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(self.slot(*key).lock_owned().await);
        }
        LockSet { keys, _guards: guards }
    }

    /// Drop the slot of a domain that no longer exists
    pub fn forget(&self, key: LockKey) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CollectionId;
    use std::time::Duration;

    #[tokio::test]
    async fn test_keys_are_sorted_and_deduplicated() {
        let locks = ContainerLocks::new();
        let x = LockKey::Container(Container::Collection(CollectionId(4)));
        let set = locks
            .acquire([x, LockKey::Container(Container::Pool), x, LockKey::Collections])
            .await;
        assert_eq!(
            set.keys(),
            &[LockKey::Collections, LockKey::Container(Container::Pool), x]
        );
    }

    #[tokio::test]
    async fn test_same_container_is_serialized() {
        let locks = Arc::new(ContainerLocks::new());
        let held = locks.acquire([LockKey::Container(Container::Pool)]).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _set = locks.acquire([LockKey::Container(Container::Pool)]).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should get the lock")
            .unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_containers_do_not_block() {
        let locks = ContainerLocks::new();
        let _pool = locks.acquire([LockKey::Container(Container::Pool)]).await;
        let other = LockKey::Container(Container::Collection(CollectionId(1)));
        tokio::time::timeout(Duration::from_secs(1), locks.acquire([other]))
            .await
            .expect("disjoint container should not wait");
    }
}
