//! Repository Layer
//!
//! Entity store abstraction and implementations.

mod traits;
mod db;
mod memory_store;
mod sqlite_store;


pub use traits::{CollectionField, CounterField, EntityStore, Mutation};
pub use db::init_db;
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;
