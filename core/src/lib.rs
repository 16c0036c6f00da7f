//! Counter Board Core
//!
//! Layered architecture:
//! - domain: counters, collections and the entity contract
//! - repository: entity store trait and implementations
//! - engine: ordering engine, drop resolution and lifecycle operations

pub mod domain;
pub mod repository;
pub mod engine;

pub use domain::{
    Collection, CollectionId, Container, Counter, CounterEdit, CounterId, DomainError,
    DomainResult, Entity, Goal, GoalDirection,
};
pub use engine::{Board, DragPayload, DropResolver, MoveOutcome, OrderingEngine, Section};
pub use repository::{init_db, EntityStore, MemoryStore, SqliteStore};
