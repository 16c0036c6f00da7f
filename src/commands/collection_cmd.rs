//! Commands for Collections

use counter_core::{Collection, CollectionId, MoveOutcome};

use crate::AppState;

/// Create a new collection at the end of the list
pub async fn create_collection(
    state: &AppState,
    name: String,
    icon_name: Option<String>,
) -> Result<Collection, String> {
    state
        .engine
        .create_collection(&name, icon_name)
        .await
        .map_err(|e| e.to_string())
}

/// List all collections in display order
pub async fn list_collections(state: &AppState) -> Result<Vec<Collection>, String> {
    state.engine.list_collections().await.map_err(|e| e.to_string())
}

/// Delete a collection and every counter in it
pub async fn delete_collection(state: &AppState, id: u32) -> Result<(), String> {
    state
        .engine
        .delete_collection(CollectionId(id))
        .await
        .map_err(|e| e.to_string())
}

pub async fn rename_collection(state: &AppState, id: u32, name: String) -> Result<Collection, String> {
    state
        .engine
        .rename_collection(CollectionId(id), &name)
        .await
        .map_err(|e| e.to_string())
}

/// Expand or collapse a collection section
pub async fn toggle_collection(state: &AppState, id: u32) -> Result<bool, String> {
    state
        .engine
        .toggle_collection_expanded(CollectionId(id))
        .await
        .map_err(|e| e.to_string())
}

/// Reorder the collection list
pub async fn move_collection(state: &AppState, from: usize, to: usize) -> Result<MoveOutcome, String> {
    state.engine.move_collection(from, to).await.map_err(|e| e.to_string())
}

/// Renumber every ordering; returns how many entities were rewritten
pub async fn repair_orders(state: &AppState) -> Result<usize, String> {
    state.engine.repair_all().await.map_err(|e| e.to_string())
}
