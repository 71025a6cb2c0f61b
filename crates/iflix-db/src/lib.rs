//! Local cache for iflix.
//!
//! Uses `rusqlite` (bundled `SQLite`) to persist favorite movies and
//! the recent search history.

mod connection;
mod migrations;
/// Favorite movie cache operations.
pub mod movies;
/// Search history operations.
pub mod search_history;

#[allow(clippy::module_name_repetitions)]
pub use connection::{open_db, open_in_memory};
#[allow(clippy::module_name_repetitions)]
pub use movies::{CachedMovie, is_movie_favorite, load_favorite_movies, load_movie, upsert_movie};
#[allow(clippy::module_name_repetitions)]
pub use search_history::{
    CachedSearchQuery, HISTORY_LIMIT, clear_history, delete_query, insert_query,
    load_search_history,
};
