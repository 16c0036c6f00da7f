//! SQLite Entity Store
//!
//! rusqlite-backed implementation of [`EntityStore`]. Batches run inside a
//! single transaction; any failing mutation rolls the whole batch back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{
    Collection, CollectionId, Counter, CounterId, DomainError, DomainResult, Goal, GoalDirection,
};
use super::db::db_err;
use super::traits::{EntityStore, Mutation};

const COUNTER_COLUMNS: &str = "id, name, value, step, daily_increment, goal_value, goal_date, \
     goal_direction, position, collection_id, icon_name, notes, theme_name, created_at, last_updated";

const COLLECTION_COLUMNS: &str = "id, name, position, is_expanded, icon_name";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite implementation of the entity store
#[derive(Clone, Default)]
pub struct SqliteStore {
    pub(super) conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    /// Create a store with no connection yet (see [`super::init_db`])
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn attach(&self, conn: Connection) {
        *self.conn.lock().await = Some(conn);
    }
}

fn not_initialized() -> DomainError {
    DomainError::Internal("Database not initialized".to_string())
}

fn row_to_counter(row: &Row) -> rusqlite::Result<Counter> {
    let goal_value: Option<i64> = row.get(5)?;
    let goal_date: Option<String> = row.get(6)?;
    let direction: String = row.get(7)?;
    let goal = goal_value.map(|target_value| Goal {
        target_value,
        target_date: goal_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()),
        direction: GoalDirection::parse_lossy(&direction),
    });

    Ok(Counter {
        id: CounterId(row.get(0)?),
        name: row.get(1)?,
        value: row.get(2)?,
        step: row.get(3)?,
        daily_increment: row.get(4)?,
        goal,
        order: row.get(8)?,
        collection: row.get::<_, Option<u32>>(9)?.map(CollectionId),
        icon_name: row.get(10)?,
        notes: row.get(11)?,
        theme_name: row.get(12)?,
        created_at: millis_to_datetime(row.get(13)?),
        last_updated: millis_to_datetime(row.get(14)?),
    })
}

fn row_to_collection(row: &Row) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: CollectionId(row.get(0)?),
        name: row.get(1)?,
        order: row.get(2)?,
        is_expanded: row.get(3)?,
        icon_name: row.get(4)?,
    })
}

/// Ids are `u32` on the Rust side; a larger rowid is a store error
fn rowid_to_u32(rowid: i64) -> DomainResult<u32> {
    u32::try_from(rowid)
        .map_err(|_| DomainError::Internal(format!("Row id {} does not fit a u32 id", rowid)))
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

fn goal_columns(goal: &Option<Goal>) -> (Option<i64>, Option<String>, &'static str) {
    match goal {
        Some(goal) => (
            Some(goal.target_value),
            goal.target_date.map(|d| d.format(DATE_FORMAT).to_string()),
            goal.direction.as_str(),
        ),
        None => (None, None, GoalDirection::Increasing.as_str()),
    }
}

fn select_counter(conn: &Connection, id: CounterId) -> DomainResult<Option<Counter>> {
    conn.query_row(
        &format!("SELECT {} FROM counters WHERE id = ?", COUNTER_COLUMNS),
        params![id.0],
        row_to_counter,
    )
    .optional()
    .map_err(db_err)
}

fn select_collection(conn: &Connection, id: CollectionId) -> DomainResult<Option<Collection>> {
    conn.query_row(
        &format!("SELECT {} FROM collections WHERE id = ?", COLLECTION_COLUMNS),
        params![id.0],
        row_to_collection,
    )
    .optional()
    .map_err(db_err)
}

fn write_counter(tx: &Transaction, counter: &Counter) -> DomainResult<()> {
    let (goal_value, goal_date, goal_direction) = goal_columns(&counter.goal);
    tx.execute(
        "UPDATE counters SET name = ?, value = ?, step = ?, daily_increment = ?, goal_value = ?,
            goal_date = ?, goal_direction = ?, position = ?, collection_id = ?, icon_name = ?,
            notes = ?, theme_name = ?, last_updated = ?
         WHERE id = ?",
        params![
            counter.name,
            counter.value,
            counter.step,
            counter.daily_increment,
            goal_value,
            goal_date,
            goal_direction,
            counter.order,
            counter.collection.map(|c| c.0),
            counter.icon_name,
            counter.notes,
            counter.theme_name,
            counter.last_updated.timestamp_millis(),
            counter.id.0,
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

fn write_collection(tx: &Transaction, collection: &Collection) -> DomainResult<()> {
    tx.execute(
        "UPDATE collections SET name = ?, position = ?, is_expanded = ?, icon_name = ? WHERE id = ?",
        params![
            collection.name,
            collection.order,
            collection.is_expanded,
            collection.icon_name,
            collection.id.0,
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

fn apply_one(tx: &Transaction, mutation: &Mutation) -> DomainResult<()> {
    match mutation {
        Mutation::UpdateCounter { id, fields } => {
            let mut counter = select_counter(tx, *id)?
                .ok_or_else(|| DomainError::NotFound(format!("Counter {} not found", id)))?;
            for field in fields {
                field.apply_to(&mut counter);
            }
            write_counter(tx, &counter)
        }
        Mutation::UpdateCollection { id, fields } => {
            let mut collection = select_collection(tx, *id)?
                .ok_or_else(|| DomainError::NotFound(format!("Collection {} not found", id)))?;
            for field in fields {
                field.apply_to(&mut collection);
            }
            write_collection(tx, &collection)
        }
        Mutation::DeleteCounter(id) => {
            let affected = tx.execute("DELETE FROM counters WHERE id = ?", params![id.0])
                .map_err(db_err)?;
            if affected == 0 {
                return Err(DomainError::NotFound(format!("Counter {} not found", id)));
            }
            Ok(())
        }
        Mutation::DeleteCollection(id) => {
            let affected = tx.execute("DELETE FROM collections WHERE id = ?", params![id.0])
                .map_err(db_err)?;
            if affected == 0 {
                return Err(DomainError::NotFound(format!("Collection {} not found", id)));
            }
            Ok(())
        }
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn fetch_counter(&self, id: CounterId) -> DomainResult<Option<Counter>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        select_counter(conn, id)
    }

    async fn fetch_collection(&self, id: CollectionId) -> DomainResult<Option<Collection>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        select_collection(conn, id)
    }

    async fn fetch_all_counters(&self) -> DomainResult<Vec<Counter>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM counters", COUNTER_COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_counter).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    async fn fetch_all_collections(&self) -> DomainResult<Vec<Collection>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM collections", COLLECTION_COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_collection).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    async fn apply(&self, mutations: &[Mutation]) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        // Dropping the transaction on error rolls it back
        let tx = conn.transaction().map_err(db_err)?;
        for mutation in mutations {
            apply_one(&tx, mutation)?;
        }
        tx.commit().map_err(db_err)
    }

    async fn insert_counter(&self, counter: &Counter) -> DomainResult<Counter> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let (goal_value, goal_date, goal_direction) = goal_columns(&counter.goal);
        conn.execute(
            "INSERT INTO counters (name, value, step, daily_increment, goal_value, goal_date,
                goal_direction, position, collection_id, icon_name, notes, theme_name,
                created_at, last_updated)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                counter.name,
                counter.value,
                counter.step,
                counter.daily_increment,
                goal_value,
                goal_date,
                goal_direction,
                counter.order,
                counter.collection.map(|c| c.0),
                counter.icon_name,
                counter.notes,
                counter.theme_name,
                counter.created_at.timestamp_millis(),
                counter.last_updated.timestamp_millis(),
            ],
        )
        .map_err(db_err)?;

        let id = CounterId(rowid_to_u32(conn.last_insert_rowid())?);
        select_counter(conn, id)?
            .ok_or_else(|| DomainError::Internal(format!("Counter {} vanished after insert", id)))
    }

    async fn insert_collection(&self, collection: &Collection) -> DomainResult<Collection> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.execute(
            "INSERT INTO collections (name, position, is_expanded, icon_name) VALUES (?, ?, ?, ?)",
            params![
                collection.name,
                collection.order,
                collection.is_expanded,
                collection.icon_name,
            ],
        )
        .map_err(db_err)?;

        let id = CollectionId(rowid_to_u32(conn.last_insert_rowid())?);
        select_collection(conn, id)?
            .ok_or_else(|| DomainError::Internal(format!("Collection {} vanished after insert", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rowid_must_fit_id() {
        assert_eq!(rowid_to_u32(7).unwrap(), 7);
        assert_eq!(rowid_to_u32(u32::MAX as i64).unwrap(), u32::MAX);
        assert!(matches!(rowid_to_u32(u32::MAX as i64 + 1), Err(DomainError::Internal(_))));
        assert!(matches!(rowid_to_u32(-1), Err(DomainError::Internal(_))));
    }
}
