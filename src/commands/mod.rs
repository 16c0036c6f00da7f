//! Commands Layer
//!
//! Async handlers that bridge the shell to the ordering engine. Every
//! handler reports failures as display strings.

mod collection_cmd;
mod counter_cmd;

pub use collection_cmd::*;
pub use counter_cmd::*;

use counter_core::{CollectionId, Container};

/// Container addressed by an optional collection id (None = pool)
pub(crate) fn container_of(collection_id: Option<u32>) -> Container {
    Container::from(collection_id.map(CollectionId))
}
