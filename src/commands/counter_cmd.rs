//! Commands for Counter CRUD + Ordering

use counter_core::{Board, CollectionId, Counter, CounterEdit, CounterId, MoveOutcome};

use crate::AppState;
use super::container_of;

/// Create a new counter at the end of the pool or a collection
pub async fn create_counter(
    state: &AppState,
    name: String,
    collection_id: Option<u32>,
    step: Option<u32>,
) -> Result<Counter, String> {
    let mut draft = Counter::new(CounterId(0), name); // id assigned by the store
    if let Some(step) = step {
        draft.step = step;
    }
    state
        .engine
        .create_counter(draft, container_of(collection_id))
        .await
        .map_err(|e| e.to_string())
}

/// Pool and collection sections, optionally filtered by name
pub async fn list_board(state: &AppState, query: Option<String>) -> Result<Board, String> {
    let board = state.engine.board().await.map_err(|e| e.to_string())?;
    Ok(match query {
        Some(q) if !q.trim().is_empty() => board.filtered(&q),
        _ => board,
    })
}

/// Get counter by ID
pub async fn get_counter(state: &AppState, id: u32) -> Result<Option<Counter>, String> {
    state
        .engine
        .store()
        .fetch_counter(CounterId(id))
        .await
        .map_err(|e| e.to_string())
}

pub async fn increment_counter(state: &AppState, id: u32) -> Result<Counter, String> {
    state.engine.increment(CounterId(id)).await.map_err(|e| e.to_string())
}

pub async fn decrement_counter(state: &AppState, id: u32) -> Result<Counter, String> {
    state.engine.decrement(CounterId(id)).await.map_err(|e| e.to_string())
}

pub async fn set_counter_value(state: &AppState, id: u32, value: i64) -> Result<Counter, String> {
    state
        .engine
        .set_value(CounterId(id), value)
        .await
        .map_err(|e| e.to_string())
}

/// Update counter fields from the edit form
pub async fn edit_counter(state: &AppState, id: u32, edit: CounterEdit) -> Result<Counter, String> {
    state
        .engine
        .edit_counter(CounterId(id), edit)
        .await
        .map_err(|e| e.to_string())
}

/// Delete counter
pub async fn delete_counter(state: &AppState, id: u32) -> Result<(), String> {
    state.engine.delete_counter(CounterId(id)).await.map_err(|e| e.to_string())
}

/// Move counter into a container (None = pool) at a position
pub async fn move_counter(
    state: &AppState,
    id: u32,
    collection_id: Option<u32>,
    position: usize,
) -> Result<MoveOutcome, String> {
    state
        .engine
        .move_across_containers(CounterId(id), collection_id.map(CollectionId), position)
        .await
        .map_err(|e| e.to_string())
}

/// Reorder counters inside one container
pub async fn reorder_counters(
    state: &AppState,
    collection_id: Option<u32>,
    from: usize,
    to: usize,
) -> Result<MoveOutcome, String> {
    state
        .engine
        .move_within_container(container_of(collection_id), from, to)
        .await
        .map_err(|e| e.to_string())
}
