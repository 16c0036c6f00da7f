//! In-Memory Entity Store
//!
//! Map-backed store used by tests and by sessions that don't persist.
//! Batches are applied to a copy of the state and swapped in on success.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::domain::{Collection, CollectionId, Counter, CounterId, DomainError, DomainResult};
use super::traits::{EntityStore, Mutation};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    counters: BTreeMap<CounterId, Counter>,
    collections: BTreeMap<CollectionId, Collection>,
    last_counter_id: u32,
    last_collection_id: u32,
}

impl MemoryState {
    fn apply_one(&mut self, mutation: &Mutation) -> DomainResult<()> {
        match mutation {
            Mutation::UpdateCounter { id, fields } => {
                let counter = self.counters.get_mut(id)
                    .ok_or_else(|| DomainError::NotFound(format!("Counter {} not found", id)))?;
                for field in fields {
                    field.apply_to(counter);
                }
            }
            Mutation::UpdateCollection { id, fields } => {
                let collection = self.collections.get_mut(id)
                    .ok_or_else(|| DomainError::NotFound(format!("Collection {} not found", id)))?;
                for field in fields {
                    field.apply_to(collection);
                }
            }
            Mutation::DeleteCounter(id) => {
                self.counters.remove(id)
                    .ok_or_else(|| DomainError::NotFound(format!("Counter {} not found", id)))?;
            }
            Mutation::DeleteCollection(id) => {
                self.collections.remove(id)
                    .ok_or_else(|| DomainError::NotFound(format!("Collection {} not found", id)))?;
            }
        }
        Ok(())
    }
}

/// Entity store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn fetch_counter(&self, id: CounterId) -> DomainResult<Option<Counter>> {
        Ok(self.state.lock().await.counters.get(&id).cloned())
    }

    async fn fetch_collection(&self, id: CollectionId) -> DomainResult<Option<Collection>> {
        Ok(self.state.lock().await.collections.get(&id).cloned())
    }

    async fn fetch_all_counters(&self) -> DomainResult<Vec<Counter>> {
        Ok(self.state.lock().await.counters.values().cloned().collect())
    }

    async fn fetch_all_collections(&self) -> DomainResult<Vec<Collection>> {
        Ok(self.state.lock().await.collections.values().cloned().collect())
    }

    async fn apply(&self, mutations: &[Mutation]) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        for mutation in mutations {
            next.apply_one(mutation)?;
        }
        *state = next;
        Ok(())
    }

    async fn insert_counter(&self, counter: &Counter) -> DomainResult<Counter> {
        let mut state = self.state.lock().await;
        if let Some(collection) = counter.collection {
            if !state.collections.contains_key(&collection) {
                return Err(DomainError::NotFound(format!("Collection {} not found", collection)));
            }
        }
        state.last_counter_id += 1;
        let mut created = counter.clone();
        created.id = CounterId(state.last_counter_id);
        state.counters.insert(created.id, created.clone());
        Ok(created)
    }

    async fn insert_collection(&self, collection: &Collection) -> DomainResult<Collection> {
        let mut state = self.state.lock().await;
        state.last_collection_id += 1;
        let mut created = collection.clone();
        created.id = CollectionId(state.last_collection_id);
        state.collections.insert(created.id, created.clone());
        Ok(created)
    }
}
