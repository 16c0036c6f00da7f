//! Collection Entity
//!
//! A named group of counters. Members are whatever counters point at the
//! collection; see [`Container`] for the ordering scope.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::CollectionId;

/// A named group of counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Unique identifier
    pub id: CollectionId,
    /// Display name, never empty
    pub name: String,
    /// Position among all collections
    pub order: i32,
    /// Whether the section is expanded in the UI
    pub is_expanded: bool,
    pub icon_name: Option<String>,
}

impl Collection {
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            order: 0,
            is_expanded: true,
            icon_name: None,
        }
    }
}

impl Entity for Collection {
    type Id = CollectionId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }
}

/// Ordering scope of a counter: the unassigned pool or one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Container {
    Pool,
    Collection(CollectionId),
}

impl Container {
    /// Foreign key value stored on member counters
    pub fn collection_id(&self) -> Option<CollectionId> {
        match self {
            Container::Pool => None,
            Container::Collection(id) => Some(*id),
        }
    }
}

impl From<Option<CollectionId>> for Container {
    fn from(collection: Option<CollectionId>) -> Self {
        match collection {
            Some(id) => Container::Collection(id),
            None => Container::Pool,
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Pool => write!(f, "pool"),
            Container::Collection(id) => write!(f, "collection {}", id),
        }
    }
}
