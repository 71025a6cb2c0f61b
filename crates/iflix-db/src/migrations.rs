//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 2;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }
    if version < 2 {
        migrate_v2(conn).context("migration to v2 failed")?;
    }

    if version < CURRENT_VERSION {
        tracing::debug!(from = version, to = CURRENT_VERSION, "schema migrated");
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

/// Migration to v1: create `movies` and `search_history` tables.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS movies (
            id             INTEGER PRIMARY KEY,
            title          TEXT NOT NULL,
            poster_path    TEXT NOT NULL DEFAULT '',
            backdrop_path  TEXT NOT NULL DEFAULT '',
            release_date   TEXT NOT NULL DEFAULT '',
            vote_average   REAL NOT NULL DEFAULT 0,
            is_favorite    INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS search_history (
            query      TEXT PRIMARY KEY COLLATE NOCASE,
            timestamp  INTEGER NOT NULL
        );",
    )
    .context("failed to create tables")?;

    Ok(())
}

/// Migration to v2: index the favorite flag and history timestamp.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_movies_is_favorite ON movies(is_favorite);
         CREATE INDEX IF NOT EXISTS idx_search_history_timestamp ON search_history(timestamp);",
    )
    .context("failed to create indexes")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn names_of(conn: &Connection, kind: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap();
        stmt.query_map([kind], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_migrations_idempotent() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        // Assert
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_tables_exist_after_migration() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        let tables = names_of(&conn, "table");
        assert!(tables.contains(&String::from("movies")));
        assert!(tables.contains(&String::from("search_history")));
    }

    #[test]
    fn test_v1_to_v2_migration_adds_indexes() {
        // Arrange: start from v1
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        conn.pragma_update(None, "user_version", 1u32).unwrap();
        conn.execute(
            "INSERT INTO search_history (query, timestamp) VALUES ('kept', 1)",
            [],
        )
        .unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        let indexes = names_of(&conn, "index");
        assert!(indexes.contains(&String::from("idx_movies_is_favorite")));
        assert!(indexes.contains(&String::from("idx_search_history_timestamp")));
        let kept: u32 = conn
            .query_row("SELECT COUNT(*) FROM search_history", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept, 1);
    }
}
