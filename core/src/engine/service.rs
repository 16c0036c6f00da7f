//! Ordering Engine
//!
//! Applies the planner's output to the entity store. Every operation locks
//! the ordering domains it touches, re-reads the snapshot it plans against
//! while holding those locks, and writes the plan in one batch.

use std::sync::Arc;

use crate::domain::{
    Collection, CollectionId, Container, Counter, CounterId, DomainError, DomainResult,
};
use crate::repository::{EntityStore, Mutation};
use super::locks::{ContainerLocks, LockKey};
use super::ordering;
use super::resolve::DropResolver;

/// How many times a cross-container move re-reads a counter that keeps
/// changing containers under it
pub(super) const MOVE_ATTEMPTS: usize = 3;

/// Result of a move request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The store was updated
    Moved,
    /// The ordering already matched the request; nothing was written
    Unchanged,
    /// The source index did not point at a member; nothing was written
    OutOfRange,
}

/// How a destination index is read
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Final position of the moved counter
    Position(usize),
    /// Insertion gap counted with the moved counter still in place
    Gap(usize),
}

/// Ordering and reassignment service over an entity store
pub struct OrderingEngine {
    pub(super) store: Arc<dyn EntityStore>,
    pub(super) locks: ContainerLocks,
    resolver: DropResolver,
}

impl OrderingEngine {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            resolver: DropResolver::new(store.clone()),
            store,
            locks: ContainerLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Members of a container in display order
    pub async fn container_members(&self, container: Container) -> DomainResult<Vec<Counter>> {
        let counters = self.store.fetch_all_counters().await?;
        Ok(ordering::container_members(&counters, container))
    }

    /// All collections in display order
    pub async fn list_collections(&self) -> DomainResult<Vec<Collection>> {
        let mut collections = self.store.fetch_all_collections().await?;
        ordering::sort_by_order(&mut collections);
        Ok(collections)
    }

    pub(super) async fn ensure_container(&self, container: Container) -> DomainResult<()> {
        if let Container::Collection(id) = container {
            if self.store.fetch_collection(id).await?.is_none() {
                return Err(DomainError::NotFound(format!("Collection {} not found", id)));
            }
        }
        Ok(())
    }

    /// Write a plan; an empty plan is not sent to the store
    pub(super) async fn commit(&self, plan: Vec<Mutation>) -> DomainResult<MoveOutcome> {
        if plan.is_empty() {
            return Ok(MoveOutcome::Unchanged);
        }
        self.store.apply(&plan).await?;
        Ok(MoveOutcome::Moved)
    }

    /// Debug builds re-read the touched containers and report any ordering
    /// that isn't `0..n-1`
    pub(super) async fn audit(&self, containers: &[Container]) {
        if !cfg!(debug_assertions) {
            return;
        }
        let counters = match self.store.fetch_all_counters().await {
            Ok(counters) => counters,
            Err(e) => {
                log::warn!("Ordering audit skipped: {}", e);
                return;
            }
        };
        for container in containers {
            let members = ordering::container_members(&counters, *container);
            if let Err(violation) = ordering::check_contiguous(&members) {
                log::error!("Ordering invariant broken in {}: {}", container, violation);
            }
        }
    }

    /// Reorder a counter inside one container
    pub async fn move_within_container(
        &self,
        container: Container,
        from: usize,
        to: usize,
    ) -> DomainResult<MoveOutcome> {
        let _locks = self.locks.acquire([LockKey::from(container)]).await;
        self.ensure_container(container).await?;

        let members = self.container_members(container).await?;
        let Some(plan) = ordering::plan_move_within(&members, from, to) else {
            log::warn!(
                "Ignoring reorder in {}: index {} out of range ({} members)",
                container, from, members.len()
            );
            return Ok(MoveOutcome::OutOfRange);
        };

        log::debug!("Reorder in {}: {} -> {} ({} writes)", container, from, to, plan.len());
        let outcome = self.commit(plan).await?;
        self.audit(&[container]).await;
        Ok(outcome)
    }

    /// Move a counter into `dest` (None = pool) at `dest_index`.
    ///
    /// The destination index is clamped to the destination's size, and a
    /// drop onto the counter's current position writes nothing.
    pub async fn move_across_containers(
        &self,
        id: CounterId,
        dest: Option<CollectionId>,
        dest_index: usize,
    ) -> DomainResult<MoveOutcome> {
        self.relocate(id, Container::from(dest), Slot::Position(dest_index)).await
    }

    /// Drop a counter into the insertion gap `gap` of `dest`.
    ///
    /// Gaps are counted the way a list shows them while the counter is still
    /// in place: gap `i` sits above row `i`. The two gaps around the
    /// counter's own row write nothing.
    pub async fn drop_into_gap(
        &self,
        id: CounterId,
        dest: Option<CollectionId>,
        gap: usize,
    ) -> DomainResult<MoveOutcome> {
        self.relocate(id, Container::from(dest), Slot::Gap(gap)).await
    }

    async fn relocate(&self, id: CounterId, dest: Container, slot: Slot) -> DomainResult<MoveOutcome> {
        for _ in 0..MOVE_ATTEMPTS {
            let counter = self.store.fetch_counter(id).await?
                .ok_or_else(|| DomainError::NotFound(format!("Counter {} not found", id)))?;
            let source = Container::from(counter.collection);

            let _locks = self
                .locks
                .acquire([LockKey::from(source), LockKey::from(dest)])
                .await;

            // Re-read under lock: the counter may have moved while we waited
            let counter = self.store.fetch_counter(id).await?
                .ok_or_else(|| DomainError::NotFound(format!("Counter {} not found", id)))?;
            if Container::from(counter.collection) != source {
                log::debug!("Counter {} changed container while waiting, retrying", id);
                continue;
            }
            self.ensure_container(dest).await?;

            let counters = self.store.fetch_all_counters().await?;
            let source_members = ordering::container_members(&counters, source);

            let dest_index = match slot {
                Slot::Position(index) => index,
                Slot::Gap(gap) => {
                    let current = if source == dest {
                        ordering::index_of(&source_members, id)
                    } else {
                        None
                    };
                    match ordering::gap_to_position(current, gap) {
                        Some(index) => index,
                        None => {
                            log::debug!("Counter {} dropped next to itself", id);
                            return Ok(MoveOutcome::Unchanged);
                        }
                    }
                }
            };

            if ordering::is_self_drop(&source_members, source, id, dest, dest_index) {
                log::debug!("Counter {} dropped onto itself", id);
                return Ok(MoveOutcome::Unchanged);
            }

            let plan = if source == dest {
                let from = ordering::index_of(&source_members, id).ok_or_else(|| {
                    DomainError::Internal(format!("Counter {} missing from {}", id, source))
                })?;
                ordering::plan_move_within(&source_members, from, dest_index).unwrap_or_default()
            } else {
                let dest_members = ordering::container_members(&counters, dest);
                ordering::plan_move_across(&counter, &source_members, dest, &dest_members, dest_index)
            };

            log::debug!(
                "Move counter {}: {} -> {} at {} ({} writes)",
                id, source, dest, dest_index, plan.len()
            );
            let outcome = self.commit(plan).await?;
            self.audit(&[source, dest]).await;
            return Ok(outcome);
        }

        Err(DomainError::Conflict(format!(
            "Counter {} kept changing container during move",
            id
        )))
    }

    /// Reorder the collection list
    pub async fn move_collection(&self, from: usize, to: usize) -> DomainResult<MoveOutcome> {
        let _locks = self.locks.acquire([LockKey::Collections]).await;

        let collections = self.list_collections().await?;
        let Some(plan) = ordering::plan_move_collection(&collections, from, to) else {
            log::warn!(
                "Ignoring collection reorder: index {} out of range ({} collections)",
                from, collections.len()
            );
            return Ok(MoveOutcome::OutOfRange);
        };

        log::debug!("Reorder collections: {} -> {} ({} writes)", from, to, plan.len());
        self.commit(plan).await
    }

    /// Decode a drag payload into the id of a live counter
    pub async fn resolve_dragged_entity(&self, payload: &str) -> Option<CounterId> {
        self.resolver.resolve(payload).await.map(|counter| counter.id)
    }
}
