//! Drop Resolution
//!
//! A drag carries the counter id as plain UTF-8 text. On drop the text is
//! decoded and looked up again; anything that doesn't resolve to a live
//! counter turns the drop into a no-op.

use std::sync::Arc;

use crate::domain::{Counter, CounterId};
use crate::repository::EntityStore;

/// Plain-text drag payload
pub struct DragPayload;

impl DragPayload {
    /// Payload written at drag start
    pub fn for_counter(counter: &Counter) -> String {
        counter.id.to_string()
    }

    /// Decode a payload back into an id
    pub fn decode(payload: &str) -> Option<CounterId> {
        payload.parse::<CounterId>().ok()
    }
}

/// Resolves drag payloads against the entity store
#[derive(Clone)]
pub struct DropResolver {
    store: Arc<dyn EntityStore>,
}

impl DropResolver {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Best-effort lookup of the dragged counter. Never fails loudly.
    pub async fn resolve(&self, payload: &str) -> Option<Counter> {
        let Some(id) = DragPayload::decode(payload) else {
            log::debug!("Rejected drop: payload {:?} is not a counter id", payload);
            return None;
        };

        match self.store.fetch_counter(id).await {
            Ok(Some(counter)) => Some(counter),
            Ok(None) => {
                log::debug!("Rejected drop: counter {} no longer exists", id);
                None
            }
            Err(e) => {
                log::warn!("Rejected drop: lookup of counter {} failed: {}", id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryStore, Mutation};

    #[tokio::test]
    async fn test_resolves_live_counter() {
        let store = Arc::new(MemoryStore::new());
        let counter = store.insert_counter(&Counter::new(CounterId(0), "Laps")).await.unwrap();
        let resolver = DropResolver::new(store);

        let payload = DragPayload::for_counter(&counter);
        let resolved = resolver.resolve(&payload).await.expect("should resolve");
        assert_eq!(resolved.id, counter.id);
    }

    #[tokio::test]
    async fn test_bad_payloads_are_rejected() {
        let resolver = DropResolver::new(Arc::new(MemoryStore::new()));
        assert!(resolver.resolve("").await.is_none());
        assert!(resolver.resolve("not-an-id").await.is_none());
        assert!(resolver.resolve("4294967296").await.is_none());
        assert!(resolver.resolve("12").await.is_none());
    }

    #[tokio::test]
    async fn test_counter_deleted_mid_drag() {
        let store = Arc::new(MemoryStore::new());
        let counter = store.insert_counter(&Counter::new(CounterId(0), "Temp")).await.unwrap();
        let payload = DragPayload::for_counter(&counter);

        store.mutate(Mutation::DeleteCounter(counter.id)).await.unwrap();

        let resolver = DropResolver::new(store);
        assert!(resolver.resolve(&payload).await.is_none());
    }
}
