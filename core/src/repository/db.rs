//! Database Connection and Setup
//!
//! Opens the SQLite database and runs migrations.

use rusqlite::Connection;
use std::path::Path;

use crate::domain::{DomainError, DomainResult};
use super::sqlite_store::SqliteStore;

pub(super) fn db_err(e: rusqlite::Error) -> DomainError {
    DomainError::Internal(e.to_string())
}

/// Open (or create) the database at `db_path` and return a ready store.
///
/// `":memory:"` opens a private in-memory database.
pub async fn init_db(db_path: &Path) -> DomainResult<SqliteStore> {
    let conn = Connection::open(db_path).map_err(db_err)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;

    run_migrations(&conn)?;
    log::info!("Database ready at {}", db_path.display());

    let store = SqliteStore::new();
    store.attach(conn).await;
    Ok(store)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(names) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };
    let found = names.flatten().any(|name| name == column);
    found
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS collections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            is_expanded INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )
    .map_err(db_err)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS counters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            value INTEGER NOT NULL DEFAULT 0,
            step INTEGER NOT NULL DEFAULT 1,
            daily_increment INTEGER NOT NULL DEFAULT 1,
            goal_value INTEGER,
            goal_date TEXT,
            goal_direction TEXT NOT NULL DEFAULT 'increasing',
            position INTEGER NOT NULL DEFAULT 0,
            collection_id INTEGER REFERENCES collections(id),
            created_at INTEGER NOT NULL,
            last_updated INTEGER NOT NULL
        )",
        [],
    )
    .map_err(db_err)?;

    // Presentation columns arrived after the first schema
    if !column_exists(conn, "collections", "icon_name") {
        conn.execute("ALTER TABLE collections ADD COLUMN icon_name TEXT", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add icon_name: {}", e)))?;
    }

    if !column_exists(conn, "counters", "icon_name") {
        conn.execute("ALTER TABLE counters ADD COLUMN icon_name TEXT", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add icon_name: {}", e)))?;
    }

    if !column_exists(conn, "counters", "notes") {
        conn.execute("ALTER TABLE counters ADD COLUMN notes TEXT", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add notes: {}", e)))?;
    }

    if !column_exists(conn, "counters", "theme_name") {
        conn.execute("ALTER TABLE counters ADD COLUMN theme_name TEXT NOT NULL DEFAULT 'Sunset'", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add theme_name: {}", e)))?;
    }

    // Create index for faster container queries
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_counters_collection ON counters(collection_id)",
        [],
    )
    .map_err(db_err)?;

    Ok(())
}
