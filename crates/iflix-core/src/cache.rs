//! Async handle over the local `SQLite` cache.
//!
//! Statements run on the blocking pool behind one shared connection.
//! Every write bumps a per-table version on a `watch` channel so readers
//! can re-run their query after each change.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use futures::StreamExt;
use futures::stream::BoxStream;
use iflix_db::{CachedMovie, CachedSearchQuery};
use rusqlite::Connection;
use tokio::sync::watch;

/// Shared cache handle. Cloning shares the connection and notifications.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct CacheStore {
    conn: Arc<Mutex<Connection>>,
    favorites_version: Arc<watch::Sender<u64>>,
    history_version: Arc<watch::Sender<u64>>,
}

impl CacheStore {
    /// Opens the on-disk cache (see `iflix_db::open_db` for the path).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&PathBuf>) -> Result<Self> {
        let conn = iflix_db::open_db(dir)?;
        Ok(Self::from_connection(conn))
    }

    /// Opens a throwaway in-memory cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn in_memory() -> Result<Self> {
        let conn = iflix_db::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already migrated connection.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            favorites_version: Arc::new(watch::Sender::new(0)),
            history_version: Arc::new(watch::Sender::new(0)),
        }
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| anyhow!("cache connection lock poisoned"))?;
            f(&guard)
        })
        .await
        .context("cache task failed")?
    }

    fn bump(version: &watch::Sender<u64>) {
        version.send_modify(|v| *v = v.wrapping_add(1));
    }

    // --- favorites ---

    /// Upserts a movie row and notifies favorites readers.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_movie(&self, movie: CachedMovie) -> Result<()> {
        self.with_conn(move |conn| iflix_db::upsert_movie(conn, &movie))
            .await?;
        Self::bump(&self.favorites_version);
        Ok(())
    }

    /// Loads every favorite movie row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn favorite_movies(&self) -> Result<Vec<CachedMovie>> {
        self.with_conn(iflix_db::load_favorite_movies).await
    }

    /// Loads one cached movie row, favorite or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn cached_movie(&self, id: u64) -> Result<Option<CachedMovie>> {
        self.with_conn(move |conn| iflix_db::load_movie(conn, id))
            .await
    }

    /// Returns whether the movie is flagged as favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_movie_favorite(&self, id: u64) -> Result<bool> {
        self.with_conn(move |conn| iflix_db::is_movie_favorite(conn, id))
            .await
    }

    /// Subscribes to favorites table changes.
    #[must_use]
    pub fn watch_favorites(&self) -> watch::Receiver<u64> {
        self.favorites_version.subscribe()
    }

    // --- search history ---

    /// Records a query and notifies history readers.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn insert_query(&self, query: String, now_ms: i64) -> Result<()> {
        self.with_conn(move |conn| iflix_db::insert_query(conn, &query, now_ms))
            .await?;
        Self::bump(&self.history_version);
        Ok(())
    }

    /// Deletes one query. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn delete_query(&self, query: String) -> Result<bool> {
        let removed = self
            .with_conn(move |conn| iflix_db::delete_query(conn, &query))
            .await?;
        if removed {
            Self::bump(&self.history_version);
        }
        Ok(removed)
    }

    /// Clears the history. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn clear_history(&self) -> Result<usize> {
        let removed = self.with_conn(iflix_db::clear_history).await?;
        Self::bump(&self.history_version);
        Ok(removed)
    }

    /// Loads up to `limit` queries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search_history(&self, limit: u32) -> Result<Vec<CachedSearchQuery>> {
        self.with_conn(move |conn| iflix_db::load_search_history(conn, limit))
            .await
    }

    /// Subscribes to search history changes.
    #[must_use]
    pub fn watch_history(&self) -> watch::Receiver<u64> {
        self.history_version.subscribe()
    }
}

/// Builds a live query: yields `query()` once, then again after every
/// change signalled on `changes`. Ends when the cache is dropped.
pub fn live_query<T, F, Fut>(changes: watch::Receiver<u64>, query: F) -> BoxStream<'static, Result<T>>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    futures::stream::unfold(
        (changes, query, true),
        |(mut changes, query, first)| async move {
            if !first && changes.changed().await.is_err() {
                return None;
            }
            changes.mark_unchanged();
            let value = query().await;
            Some((value, (changes, query, false)))
        },
    )
    .boxed()
}
