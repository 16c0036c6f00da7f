//! Counter and Collection Lifecycle
//!
//! Creation, deletion and value changes. Structural operations go through
//! the same locks as moves so the ordering stays contiguous.

use chrono::Utc;

use crate::domain::{
    validate_name, Collection, CollectionId, Container, Counter, CounterEdit, CounterId,
    DomainError, DomainResult,
};
use crate::repository::{CollectionField, CounterField, Mutation};
use super::locks::LockKey;
use super::ordering;
use super::service::{OrderingEngine, MOVE_ATTEMPTS};

fn validate_positive(value: u32, what: &str) -> DomainResult<u32> {
    if value == 0 {
        return Err(DomainError::InvalidInput(format!("{} must be at least 1", what)));
    }
    Ok(value)
}

impl OrderingEngine {
    async fn require_counter(&self, id: CounterId) -> DomainResult<Counter> {
        self.store.fetch_counter(id).await?
            .ok_or_else(|| DomainError::NotFound(format!("Counter {} not found", id)))
    }

    async fn require_collection(&self, id: CollectionId) -> DomainResult<Collection> {
        self.store.fetch_collection(id).await?
            .ok_or_else(|| DomainError::NotFound(format!("Collection {} not found", id)))
    }

    /// Create a counter at the end of `container`.
    ///
    /// The draft's id, order and collection are replaced.
    pub async fn create_counter(&self, draft: Counter, container: Container) -> DomainResult<Counter> {
        let name = validate_name(&draft.name, "Counter")?;
        validate_positive(draft.step, "Step")?;
        validate_positive(draft.daily_increment, "Daily increment")?;

        let _locks = self.locks.acquire([LockKey::from(container)]).await;
        self.ensure_container(container).await?;

        let members = self.container_members(container).await?;
        let counter = Counter {
            name,
            order: members.len() as i32,
            collection: container.collection_id(),
            ..draft
        };
        let created = self.store.insert_counter(&counter).await?;
        log::info!("Created counter {} in {}", created.id, container);
        Ok(created)
    }

    /// Create a collection at the end of the collection list
    pub async fn create_collection(
        &self,
        name: &str,
        icon_name: Option<String>,
    ) -> DomainResult<Collection> {
        let name = validate_name(name, "Collection")?;
        let _locks = self.locks.acquire([LockKey::Collections]).await;

        let existing = self.store.fetch_all_collections().await?;
        let collection = Collection {
            order: existing.len() as i32,
            icon_name,
            ..Collection::new(CollectionId(0), name)
        };
        let created = self.store.insert_collection(&collection).await?;
        log::info!("Created collection {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Delete a counter and close the gap in its container
    pub async fn delete_counter(&self, id: CounterId) -> DomainResult<()> {
        for _ in 0..MOVE_ATTEMPTS {
            let counter = self.require_counter(id).await?;
            let container = Container::from(counter.collection);
            let _locks = self.locks.acquire([LockKey::from(container)]).await;

            let members = self.container_members(container).await?;
            if ordering::index_of(&members, id).is_none() {
                // moved away while we waited for the lock
                continue;
            }

            self.store.apply(&ordering::plan_counter_removal(&members, id)).await?;
            log::info!("Deleted counter {} from {}", id, container);
            self.audit(&[container]).await;
            return Ok(());
        }

        Err(DomainError::Conflict(format!(
            "Counter {} kept changing container during delete",
            id
        )))
    }

    /// Delete a collection together with its counters
    pub async fn delete_collection(&self, id: CollectionId) -> DomainResult<()> {
        let container = Container::Collection(id);
        let _locks = self
            .locks
            .acquire([LockKey::Collections, LockKey::from(container)])
            .await;

        let collections = self.list_collections().await?;
        if ordering::index_of(&collections, id).is_none() {
            return Err(DomainError::NotFound(format!("Collection {} not found", id)));
        }
        let members = self.container_members(container).await?;

        let plan = ordering::plan_collection_removal(&collections, id, &members);
        self.store.apply(&plan).await?;
        self.locks.forget(LockKey::from(container));
        log::info!("Deleted collection {} and {} counters", id, members.len());
        Ok(())
    }

    /// Add one step to the counter's value
    pub async fn increment(&self, id: CounterId) -> DomainResult<Counter> {
        self.write_value(id, CounterField::AddSteps(1)).await
    }

    /// Subtract one step from the counter's value
    pub async fn decrement(&self, id: CounterId) -> DomainResult<Counter> {
        self.write_value(id, CounterField::AddSteps(-1)).await
    }

    pub async fn set_value(&self, id: CounterId, value: i64) -> DomainResult<Counter> {
        self.write_value(id, CounterField::Value(value)).await
    }

    async fn write_value(&self, id: CounterId, change: CounterField) -> DomainResult<Counter> {
        self.store
            .mutate(Mutation::counter(id, vec![change, CounterField::LastUpdated(Utc::now())]))
            .await?;
        let counter = self.require_counter(id).await?;
        if counter.has_reached_goal() {
            log::info!("Counter {} reached its goal", id);
        }
        Ok(counter)
    }

    /// Apply edits from the edit form
    pub async fn edit_counter(&self, id: CounterId, edit: CounterEdit) -> DomainResult<Counter> {
        let mut fields = Vec::new();
        if let Some(name) = &edit.name {
            fields.push(CounterField::Name(validate_name(name, "Counter")?));
        }
        if let Some(step) = edit.step {
            fields.push(CounterField::Step(validate_positive(step, "Step")?));
        }
        if let Some(daily) = edit.daily_increment {
            fields.push(CounterField::DailyIncrement(validate_positive(daily, "Daily increment")?));
        }
        if let Some(goal) = edit.goal {
            fields.push(CounterField::Goal(goal));
        }
        if let Some(notes) = edit.notes {
            fields.push(CounterField::Notes(notes));
        }
        if let Some(icon) = edit.icon_name {
            fields.push(CounterField::IconName(icon));
        }
        if let Some(theme) = edit.theme_name {
            fields.push(CounterField::ThemeName(theme));
        }

        if !fields.is_empty() {
            self.store.mutate(Mutation::counter(id, fields)).await?;
        }
        self.require_counter(id).await
    }

    /// Flip the expanded flag of a collection; returns the new state
    pub async fn toggle_collection_expanded(&self, id: CollectionId) -> DomainResult<bool> {
        let collection = self.require_collection(id).await?;
        let expanded = !collection.is_expanded;
        self.store
            .mutate(Mutation::collection(id, vec![CollectionField::Expanded(expanded)]))
            .await?;
        Ok(expanded)
    }

    pub async fn rename_collection(&self, id: CollectionId, name: &str) -> DomainResult<Collection> {
        let name = validate_name(name, "Collection")?;
        self.store
            .mutate(Mutation::collection(id, vec![CollectionField::Name(name)]))
            .await?;
        self.require_collection(id).await
    }

    /// Renormalize every container and the collection list.
    ///
    /// Returns the number of entities whose order was rewritten.
    pub async fn repair_all(&self) -> DomainResult<usize> {
        let collections = self.store.fetch_all_collections().await?;
        let mut keys = vec![LockKey::Collections, LockKey::from(Container::Pool)];
        keys.extend(collections.iter().map(|c| LockKey::from(Container::Collection(c.id))));
        let _locks = self.locks.acquire(keys).await;

        let counters = self.store.fetch_all_counters().await?;
        let collections = self.store.fetch_all_collections().await?;
        let plan = ordering::plan_repair(&counters, &collections);
        let rewritten = plan.len();
        if rewritten > 0 {
            log::warn!("Repairing ordering: {} entities renumbered", rewritten);
            self.store.apply(&plan).await?;
        }
        Ok(rewritten)
    }
}
