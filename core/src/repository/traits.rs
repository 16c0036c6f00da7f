//! Repository Layer - Core Traits
//!
//! Defines the entity store the ordering engine calls into.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Collection, CollectionId, Counter, CounterId, DomainResult, Goal,
};

/// Field-level update of a counter
#[derive(Debug, Clone, PartialEq)]
pub enum CounterField {
    Order(i32),
    Collection(Option<CollectionId>),
    Value(i64),
    /// Add `n` steps to the value, read and written inside the batch
    AddSteps(i64),
    Name(String),
    Step(u32),
    DailyIncrement(u32),
    Goal(Option<Goal>),
    Notes(Option<String>),
    IconName(Option<String>),
    ThemeName(String),
    LastUpdated(DateTime<Utc>),
}

impl CounterField {
    pub fn apply_to(&self, counter: &mut Counter) {
        match self {
            CounterField::Order(order) => counter.order = *order,
            CounterField::Collection(collection) => counter.collection = *collection,
            CounterField::Value(value) => counter.value = *value,
            CounterField::AddSteps(n) => {
                counter.value = counter.value.saturating_add(n.saturating_mul(counter.step as i64));
            }
            CounterField::Name(name) => counter.name = name.clone(),
            CounterField::Step(step) => counter.step = *step,
            CounterField::DailyIncrement(daily) => counter.daily_increment = *daily,
            CounterField::Goal(goal) => counter.goal = goal.clone(),
            CounterField::Notes(notes) => counter.notes = notes.clone(),
            CounterField::IconName(icon) => counter.icon_name = icon.clone(),
            CounterField::ThemeName(theme) => counter.theme_name = theme.clone(),
            CounterField::LastUpdated(at) => counter.last_updated = *at,
        }
    }
}

/// Field-level update of a collection
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionField {
    Order(i32),
    Name(String),
    Expanded(bool),
    IconName(Option<String>),
}

impl CollectionField {
    pub fn apply_to(&self, collection: &mut Collection) {
        match self {
            CollectionField::Order(order) => collection.order = *order,
            CollectionField::Name(name) => collection.name = name.clone(),
            CollectionField::Expanded(expanded) => collection.is_expanded = *expanded,
            CollectionField::IconName(icon) => collection.icon_name = icon.clone(),
        }
    }
}

/// One write against the store
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UpdateCounter { id: CounterId, fields: Vec<CounterField> },
    UpdateCollection { id: CollectionId, fields: Vec<CollectionField> },
    DeleteCounter(CounterId),
    /// Removes the collection row only; member counters must be deleted
    /// in the same batch.
    DeleteCollection(CollectionId),
}

impl Mutation {
    pub fn counter(id: CounterId, fields: Vec<CounterField>) -> Self {
        Mutation::UpdateCounter { id, fields }
    }

    pub fn collection(id: CollectionId, fields: Vec<CollectionField>) -> Self {
        Mutation::UpdateCollection { id, fields }
    }
}

/// Durable keyed storage for counters and collections
///
/// All operations are async to support various backends.
/// `apply` is all-or-nothing: either every mutation lands or none does.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Find a counter by ID
    async fn fetch_counter(&self, id: CounterId) -> DomainResult<Option<Counter>>;

    /// Find a collection by ID
    async fn fetch_collection(&self, id: CollectionId) -> DomainResult<Option<Collection>>;

    /// All counters, in no particular order
    async fn fetch_all_counters(&self) -> DomainResult<Vec<Counter>>;

    /// All collections, in no particular order
    async fn fetch_all_collections(&self) -> DomainResult<Vec<Collection>>;

    /// Apply a batch of mutations in one transaction
    async fn apply(&self, mutations: &[Mutation]) -> DomainResult<()>;

    /// Apply a single mutation
    async fn mutate(&self, mutation: Mutation) -> DomainResult<()> {
        self.apply(std::slice::from_ref(&mutation)).await
    }

    /// Insert a counter; the store assigns the ID
    async fn insert_counter(&self, counter: &Counter) -> DomainResult<Counter>;

    /// Insert a collection; the store assigns the ID
    async fn insert_collection(&self, collection: &Collection) -> DomainResult<Collection>;

    /// Delete a counter without touching the ordering of its container
    async fn delete_counter(&self, id: CounterId) -> DomainResult<()> {
        self.mutate(Mutation::DeleteCounter(id)).await
    }

    /// Delete a collection; its counters must already be gone
    async fn delete_collection(&self, id: CollectionId) -> DomainResult<()> {
        self.mutate(Mutation::DeleteCollection(id)).await
    }
}
