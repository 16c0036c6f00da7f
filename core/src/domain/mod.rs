//! Domain Layer
//!
//! Counters, collections and the shared entity contract.
//! This layer has NO external dependencies (except serde and chrono).

mod collection;
mod counter;
mod entity;
mod ids;

pub use collection::{Collection, Container};
pub use counter::{Counter, CounterEdit, Goal, GoalDirection, DEFAULT_THEME};
pub use entity::{DomainError, DomainResult, Entity};
pub(crate) use entity::validate_name;
pub use ids::{CollectionId, CounterId};
