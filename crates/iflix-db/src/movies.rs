//! Favorite movie cache.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

/// A cached movie row with its favorite flag.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMovie {
    /// TMDB movie ID.
    pub id: u64,
    /// Movie title.
    pub title: String,
    /// Poster image path (empty when unknown).
    pub poster_path: String,
    /// Backdrop image path (empty when unknown).
    pub backdrop_path: String,
    /// Release date as `YYYY-MM-DD` (empty when unknown).
    pub release_date: String,
    /// Average vote.
    pub vote_average: f64,
    /// Whether the movie is marked as favorite.
    pub is_favorite: bool,
}

/// Inserts or replaces a movie row, including its favorite flag.
///
/// Un-favoriting flips the flag and keeps the row.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn upsert_movie(conn: &Connection, movie: &CachedMovie) -> Result<()> {
    conn.execute(
        "INSERT INTO movies (
            id, title, poster_path, backdrop_path, release_date, vote_average, is_favorite
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            poster_path = excluded.poster_path,
            backdrop_path = excluded.backdrop_path,
            release_date = excluded.release_date,
            vote_average = excluded.vote_average,
            is_favorite = excluded.is_favorite",
        rusqlite::params![
            movie.id,
            movie.title,
            movie.poster_path,
            movie.backdrop_path,
            movie.release_date,
            movie.vote_average,
            movie.is_favorite,
        ],
    )
    .with_context(|| format!("failed to upsert movie {}", movie.id))?;

    tracing::debug!(id = movie.id, favorite = movie.is_favorite, "movie upserted");
    Ok(())
}

/// Maps a `movies` row in column order to a `CachedMovie`.
fn row_to_movie(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedMovie> {
    Ok(CachedMovie {
        id: row.get(0)?,
        title: row.get(1)?,
        poster_path: row.get(2)?,
        backdrop_path: row.get(3)?,
        release_date: row.get(4)?,
        vote_average: row.get(5)?,
        is_favorite: row.get(6)?,
    })
}

/// Loads every movie flagged as favorite, ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_favorite_movies(conn: &Connection) -> Result<Vec<CachedMovie>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, title, poster_path, backdrop_path, release_date, vote_average, is_favorite
             FROM movies
             WHERE is_favorite = 1
             ORDER BY id",
        )
        .context("failed to prepare favorites query")?;

    let rows = stmt
        .query_map([], row_to_movie)
        .context("failed to query favorites")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read favorite rows")
}

/// Loads one movie row by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_movie(conn: &Connection, id: u64) -> Result<Option<CachedMovie>> {
    conn.query_row(
        "SELECT id, title, poster_path, backdrop_path, release_date, vote_average, is_favorite
         FROM movies
         WHERE id = ?1",
        [id],
        row_to_movie,
    )
    .optional()
    .with_context(|| format!("failed to load movie {id}"))
}

/// Returns whether the movie exists and is flagged as favorite.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn is_movie_favorite(conn: &Connection, id: u64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM movies WHERE id = ?1 AND is_favorite = 1)",
        [id],
        |row| row.get(0),
    )
    .with_context(|| format!("failed to check favorite flag for movie {id}"))
}
