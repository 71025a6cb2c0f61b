//! Recent search query history.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Maximum number of history rows returned to callers.
pub const HISTORY_LIMIT: u32 = 10;

/// A stored search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSearchQuery {
    /// Query text as last entered.
    pub query: String,
    /// Last use, epoch milliseconds.
    pub timestamp: i64,
}

/// Records a query, replacing any earlier row with the same text.
///
/// Text comparison is case-insensitive, so "Heat" and "heat" share one
/// row holding the latest spelling. The stored timestamp is
/// `max(now_ms, newest + 1)` so two inserts within the same millisecond
/// still keep a strict newest-first order.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn insert_query(conn: &Connection, query: &str, now_ms: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO search_history (query, timestamp)
         VALUES (?1, MAX(?2, COALESCE((SELECT MAX(timestamp) FROM search_history), 0) + 1))
         ON CONFLICT(query) DO UPDATE SET
            query = excluded.query,
            timestamp = excluded.timestamp",
        rusqlite::params![query, now_ms],
    )
    .with_context(|| format!("failed to insert search query {query:?}"))?;

    tracing::debug!(query, "search query recorded");
    Ok(())
}

/// Deletes one query. Returns whether a row was removed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn delete_query(conn: &Connection, query: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM search_history WHERE query = ?1", [query])
        .with_context(|| format!("failed to delete search query {query:?}"))?;
    Ok(removed > 0)
}

/// Removes every history row. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn clear_history(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM search_history", [])
        .context("failed to clear search history")
}

/// Loads the most recent queries, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_search_history(conn: &Connection, limit: u32) -> Result<Vec<CachedSearchQuery>> {
    let mut stmt = conn
        .prepare(
            "SELECT query, timestamp
             FROM search_history
             ORDER BY timestamp DESC
             LIMIT ?1",
        )
        .context("failed to prepare search history query")?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(CachedSearchQuery {
                query: row.get(0)?,
                timestamp: row.get(1)?,
            })
        })
        .context("failed to query search history")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read search history rows")
}
