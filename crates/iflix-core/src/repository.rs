//! Repositories composing the TMDB API with the local cache.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use futures::stream::BoxStream;
use iflix_api::tmdb::TmdbApi;
use iflix_db::HISTORY_LIMIT;
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::cache::{CacheStore, live_query};
use crate::mapper::{
    details_to_movie, from_cached_movie, from_cached_query, to_cached_movie, to_genre,
    to_movie_details,
};
use crate::model::{Genre, Movie, MovieDetails, SearchQuery};
use crate::pager::{Pager, PagingConfig};
use crate::paging::{MovieCategory, MoviePagingSource};

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

/// Movie catalog, details, genres and favorites.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct MovieRepository<A> {
    api: Arc<A>,
    cache: CacheStore,
    language: String,
    list_config: PagingConfig,
    now_playing_config: PagingConfig,
    genres: OnceCell<Vec<Genre>>,
}

impl<A: TmdbApi + Sync> MovieRepository<A> {
    /// Creates a repository with default language and page sizes.
    #[must_use]
    pub fn new(api: Arc<A>, cache: CacheStore) -> Self {
        Self {
            api,
            cache,
            language: String::from(DEFAULT_LANGUAGE),
            list_config: PagingConfig::default(),
            now_playing_config: PagingConfig::now_playing(),
            genres: OnceCell::new(),
        }
    }

    /// Sets the response language (e.g. `ja-JP`).
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Overrides the page sizes for list sections and the now-playing banner.
    #[must_use]
    pub fn with_paging(mut self, list: PagingConfig, now_playing: PagingConfig) -> Self {
        self.list_config = list;
        self.now_playing_config = now_playing;
        self
    }

    /// Response language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Creates a pager for `category`.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank search query or an empty genre list.
    pub fn movies(&self, category: MovieCategory) -> Result<Pager<A>> {
        match &category {
            MovieCategory::Search(query) if query.trim().is_empty() => {
                bail!("search query must not be blank")
            }
            MovieCategory::Discover(genres) if genres.trim().is_empty() => {
                bail!("at least one genre is required")
            }
            _ => {}
        }

        let config = if category == MovieCategory::NowPlaying {
            self.now_playing_config
        } else {
            self.list_config
        };
        let source = MoviePagingSource::new(Arc::clone(&self.api), category, &self.language);
        Ok(Pager::new(source, config))
    }

    /// Pager over today's trending movies.
    ///
    /// # Errors
    ///
    /// Does not fail for list categories.
    pub fn trending_movies(&self) -> Result<Pager<A>> {
        self.movies(MovieCategory::Trending)
    }

    /// Pager over movies now in theaters (5 per page).
    ///
    /// # Errors
    ///
    /// Does not fail for list categories.
    pub fn now_playing_movies(&self) -> Result<Pager<A>> {
        self.movies(MovieCategory::NowPlaying)
    }

    /// Pager over popular movies.
    ///
    /// # Errors
    ///
    /// Does not fail for list categories.
    pub fn popular_movies(&self) -> Result<Pager<A>> {
        self.movies(MovieCategory::Popular)
    }

    /// Pager over top rated movies.
    ///
    /// # Errors
    ///
    /// Does not fail for list categories.
    pub fn top_rated_movies(&self) -> Result<Pager<A>> {
        self.movies(MovieCategory::TopRated)
    }

    /// Pager over free-text search results.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` is blank.
    pub fn search_movies(&self, query: &str) -> Result<Pager<A>> {
        self.movies(MovieCategory::Search(String::from(query.trim())))
    }

    /// Pager over movies matching all of `genre_ids` (server-side filter).
    ///
    /// # Errors
    ///
    /// Returns an error if `genre_ids` is empty.
    pub fn discover_movies(&self, genre_ids: &[u32]) -> Result<Pager<A>> {
        let joined = genre_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.movies(MovieCategory::Discover(joined))
    }

    /// Search pager that keeps only movies carrying every one of
    /// `genre_ids` (client-side filter).
    ///
    /// # Errors
    ///
    /// Returns an error if `query` is blank.
    pub fn search_movies_with_genres(&self, query: &str, genre_ids: &[u32]) -> Result<Pager<A>> {
        Ok(self
            .search_movies(query)?
            .with_genre_filter(genre_ids.iter().copied()))
    }

    /// Fetches full details for one movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all, fields(movie_id = movie_id))]
    pub async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails> {
        let response = self
            .api
            .movie_details(movie_id, &self.language)
            .await
            .with_context(|| format!("failed to fetch details for movie {movie_id}"))?;
        Ok(to_movie_details(&response))
    }

    /// Returns the genre list, fetched once per repository.
    ///
    /// A failed fetch is not memoized.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn movie_genres(&self) -> Result<Vec<Genre>> {
        let genres = self
            .genres
            .get_or_try_init(|| async {
                let response = self
                    .api
                    .movie_genres(&self.language)
                    .await
                    .context("failed to fetch movie genres")?;
                let genres: Vec<Genre> = response.genres.iter().map(to_genre).collect();
                tracing::debug!(count = genres.len(), "genres loaded");
                Ok::<_, anyhow::Error>(genres)
            })
            .await?;
        Ok(genres.clone())
    }

    /// Live list of favorite movies.
    #[must_use]
    pub fn favorite_movies(&self) -> BoxStream<'static, Result<Vec<Movie>>> {
        let cache = self.cache.clone();
        live_query(self.cache.watch_favorites(), move || {
            let cache = cache.clone();
            async move {
                let rows = cache.favorite_movies().await?;
                Ok(rows.iter().map(from_cached_movie).collect())
            }
        })
    }

    /// Writes `movie` with the given favorite flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn set_favorite_movie(&self, movie: &Movie, state: bool) -> Result<()> {
        self.cache
            .upsert_movie(to_cached_movie(movie, state))
            .await
            .with_context(|| format!("failed to update favorite flag for movie {}", movie.id))
    }

    /// The stored movie behind `movie_id` if it is a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache read fails.
    pub async fn favorite_movie(&self, movie_id: u64) -> Result<Option<Movie>> {
        let row = self.cache.cached_movie(movie_id).await?;
        Ok(row
            .filter(|row| row.is_favorite)
            .map(|row| from_cached_movie(&row)))
    }

    /// Live favorite flag for one movie.
    #[must_use]
    pub fn is_movie_favorite(&self, movie_id: u64) -> BoxStream<'static, Result<bool>> {
        let cache = self.cache.clone();
        live_query(self.cache.watch_favorites(), move || {
            let cache = cache.clone();
            async move { cache.is_movie_favorite(movie_id).await }
        })
    }

    /// Flips the favorite flag of the movie behind `details`.
    /// Returns the new flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache read or write fails.
    pub async fn toggle_favorite(&self, details: &MovieDetails) -> Result<bool> {
        let current = self.cache.is_movie_favorite(details.id).await?;
        let next = !current;
        self.set_favorite_movie(&details_to_movie(details), next)
            .await?;
        tracing::debug!(movie_id = details.id, favorite = next, "favorite toggled");
        Ok(next)
    }
}

/// Recent search queries.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchRepository {
    cache: CacheStore,
}

impl SearchRepository {
    /// Creates a repository over `cache`.
    #[must_use]
    pub const fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    /// Live history, newest first, capped at 10 entries.
    #[must_use]
    pub fn search_history(&self) -> BoxStream<'static, Result<Vec<SearchQuery>>> {
        let cache = self.cache.clone();
        live_query(self.cache.watch_history(), move || {
            let cache = cache.clone();
            async move {
                let rows = cache.search_history(HISTORY_LIMIT).await?;
                Ok(rows.iter().map(from_cached_query).collect())
            }
        })
    }

    /// Records `query` (trimmed). Blank input is ignored and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn insert_query(&self, query: &str) -> Result<bool> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.cache
            .insert_query(String::from(trimmed), now_ms)
            .await
            .context("failed to record search query")?;
        Ok(true)
    }

    /// Deletes one query. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn delete_query(&self, query: &str) -> Result<bool> {
        self.cache
            .delete_query(String::from(query.trim()))
            .await
            .context("failed to delete search query")
    }

    /// Removes every query. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn clear_history(&self) -> Result<usize> {
        self.cache
            .clear_history()
            .await
            .context("failed to clear search history")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use futures::StreamExt;

    use super::*;
    use crate::test_support::{MockTmdbApi, make_movie, memory_cache, sample_details};

    fn repository() -> (Arc<MockTmdbApi>, MovieRepository<MockTmdbApi>) {
        let api = Arc::new(MockTmdbApi::new());
        let repo = MovieRepository::new(Arc::clone(&api), memory_cache());
        (api, repo)
    }

    #[tokio::test]
    async fn test_popular_pages() {
        // Arrange
        let (_api, repo) = repository();
        let mut pager = repo.popular_movies().unwrap();

        // Act
        pager.load_next().await.unwrap();
        let first = pager.pages()[0].clone();
        pager.load_next().await.unwrap();
        let second = pager.pages()[1].clone();

        // Assert
        assert_eq!(first.data.len(), 20);
        assert_eq!(first.next_key, Some(2));
        assert_eq!(second.prev_key, Some(1));
    }

    #[test]
    fn test_now_playing_uses_banner_page_size() {
        // Arrange
        let (_api, repo) = repository();

        // Act
        let now_playing = repo.now_playing_movies().unwrap();
        let trending = repo.trending_movies().unwrap();

        // Assert
        assert_eq!(now_playing.config().page_size, 5);
        assert_eq!(trending.config().page_size, 20);
    }

    #[test]
    fn test_blank_search_and_empty_discover_fail_at_construction() {
        // Arrange
        let (api, repo) = repository();

        // Act
        let blank = repo.search_movies("   ");
        let no_genres = repo.discover_movies(&[]);

        // Assert
        assert!(blank.unwrap_err().to_string().contains("blank"));
        assert!(no_genres.unwrap_err().to_string().contains("genre"));
        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_search_trims_query_and_discover_joins_genres() {
        // Arrange
        let (api, repo) = repository();

        // Act
        repo.search_movies("  Inception ")
            .unwrap()
            .load_next()
            .await
            .unwrap();
        repo.discover_movies(&[28, 12])
            .unwrap()
            .load_next()
            .await
            .unwrap();

        // Assert
        assert_eq!(api.search_queries(), vec![String::from("Inception")]);
        assert_eq!(api.discover_genres(), vec![String::from("28,12")]);
    }

    #[tokio::test]
    async fn test_movie_details() {
        // Arrange
        let (_api, repo) = repository();

        // Act
        let details = repo.movie_details(27_205).await.unwrap();
        let missing = repo.movie_details(1).await;

        // Assert
        assert_eq!(details.title, "Inception");
        let err = format!("{:#}", missing.unwrap_err());
        assert!(err.contains("failed to fetch details for movie 1"));
        assert!(err.contains("404"));
    }

    #[tokio::test]
    async fn test_movie_genres_memoized_after_success() {
        // Arrange
        let (api, repo) = repository();
        api.fail_next_genres(1);

        // Act
        let failed = repo.movie_genres().await;
        let first = repo.movie_genres().await.unwrap();
        let second = repo.movie_genres().await.unwrap();

        // Assert
        assert!(failed.is_err());
        assert_eq!(first.len(), 19);
        assert_eq!(first, second);
        assert_eq!(api.genre_calls(), 2);
    }

    #[tokio::test]
    async fn test_favorite_stream_follows_writes() {
        // Arrange
        let (_api, repo) = repository();
        let mut favorites = repo.favorite_movies();
        let movie = make_movie(42, &[28]);

        // Act & Assert
        assert!(favorites.next().await.unwrap().unwrap().is_empty());

        repo.set_favorite_movie(&movie, true).await.unwrap();
        let listed = favorites.next().await.unwrap().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 42);

        repo.set_favorite_movie(&movie, false).await.unwrap();
        assert!(favorites.next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_favorite_movie_only_returns_flagged_rows() {
        // Arrange
        let (_api, repo) = repository();
        let movie = make_movie(42, &[28]);
        repo.set_favorite_movie(&movie, true).await.unwrap();

        // Act
        let flagged = repo.favorite_movie(42).await.unwrap();
        repo.set_favorite_movie(&movie, false).await.unwrap();
        let unflagged = repo.favorite_movie(42).await.unwrap();
        let unknown = repo.favorite_movie(7).await.unwrap();

        // Assert
        assert_eq!(flagged.map(|m| m.title), Some(movie.title));
        assert!(unflagged.is_none());
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_is_movie_favorite_stream() {
        // Arrange
        let (_api, repo) = repository();
        let mut flag = repo.is_movie_favorite(42);

        // Act & Assert
        assert!(!flag.next().await.unwrap().unwrap());
        repo.set_favorite_movie(&make_movie(42, &[]), true)
            .await
            .unwrap();
        assert!(flag.next().await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_restores_flag() {
        // Arrange
        let (_api, repo) = repository();
        let details = sample_details();

        // Act
        let on = repo.toggle_favorite(&details).await.unwrap();
        let off = repo.toggle_favorite(&details).await.unwrap();

        // Assert
        assert!(on);
        assert!(!off);
        let mut favorites = repo.favorite_movies();
        assert!(favorites.next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_insert_trims_and_ignores_blank() {
        // Arrange
        let repo = SearchRepository::new(memory_cache());
        let mut history = repo.search_history();

        assert!(history.next().await.unwrap().unwrap().is_empty());

        // Act
        let blank = repo.insert_query("   ").await.unwrap();
        let stored = repo.insert_query("  Inception  ").await.unwrap();

        // Assert
        assert!(!blank);
        assert!(stored);
        let rows = history.next().await.unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].query, "Inception");
    }

    #[tokio::test]
    async fn test_history_same_text_keeps_one_row() {
        // Arrange
        let repo = SearchRepository::new(memory_cache());
        repo.insert_query("Inception").await.unwrap();
        repo.insert_query("Heat").await.unwrap();

        // Act
        repo.insert_query("inception ").await.unwrap();
        let rows = repo.search_history().next().await.unwrap().unwrap();

        // Assert
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].query, "inception");
        assert_eq!(rows[1].query, "Heat");
        assert!(rows[0].timestamp > rows[1].timestamp);
    }

    #[tokio::test]
    async fn test_history_is_capped_newest_first() {
        // Arrange
        let repo = SearchRepository::new(memory_cache());
        for i in 0..12 {
            repo.insert_query(&format!("query {i}")).await.unwrap();
        }

        // Act
        let rows = repo.search_history().next().await.unwrap().unwrap();

        // Assert
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].query, "query 11");
        assert_eq!(rows[9].query, "query 2");
    }

    #[tokio::test]
    async fn test_history_delete_and_clear() {
        // Arrange
        let repo = SearchRepository::new(memory_cache());
        repo.insert_query("alien").await.unwrap();
        repo.insert_query("heat").await.unwrap();

        // Act
        let deleted = repo.delete_query(" alien ").await.unwrap();
        let cleared = repo.clear_history().await.unwrap();

        // Assert
        assert!(deleted);
        assert_eq!(cleared, 1);
        let rows = repo.search_history().next().await.unwrap().unwrap();
        assert!(rows.is_empty());
    }
}
