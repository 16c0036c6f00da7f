//! Ordering Engine
//!
//! - ordering: pure planners over snapshots
//! - locks: per-container serialization
//! - service: moves applied against the store
//! - lifecycle: create/delete/value changes that keep orders contiguous
//! - resolve: drag payload decoding
//! - board: read-side snapshot and search

pub mod ordering;
mod locks;
mod service;
mod lifecycle;
mod resolve;
mod board;


pub use locks::{ContainerLocks, LockKey, LockSet};
pub use service::{MoveOutcome, OrderingEngine};
pub use resolve::{DragPayload, DropResolver};
pub use board::{Board, Section};
