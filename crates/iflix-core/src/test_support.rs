//! Shared fixtures and a scripted TMDB API for unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use iflix_api::tmdb::{
    DiscoverMovieParams, MovieListParams, SearchMovieParams, TmdbApi, TmdbGenreListResponse,
    TmdbMovieDetails, TmdbMovieListResponse,
};

use crate::cache::CacheStore;
use crate::mapper::to_movie_details;
use crate::model::{Movie, MovieDetails};

const POPULAR_PAGE1: &str = include_str!("../../../fixtures/tmdb/movie_popular_page1.json");
const POPULAR_PAGE2: &str = include_str!("../../../fixtures/tmdb/movie_popular_page2.json");
const LIST_EMPTY: &str = include_str!("../../../fixtures/tmdb/movie_list_empty.json");
const SEARCH_INCEPTION: &str = include_str!("../../../fixtures/tmdb/search_movie_inception.json");
const DISCOVER_ACTION_ADVENTURE: &str =
    include_str!("../../../fixtures/tmdb/discover_movie_action_adventure.json");
const DETAILS_27205: &str = include_str!("../../../fixtures/tmdb/movie_details_27205.json");
const GENRES: &str = include_str!("../../../fixtures/tmdb/genre_movie_list.json");

/// Scripted API: list endpoints serve two fixture pages then an empty one,
/// search and discover serve one fixture page each.
#[derive(Debug, Default)]
pub struct MockTmdbApi {
    list_calls: AtomicU32,
    genre_calls: AtomicU32,
    fail_lists: AtomicU32,
    fail_genres: AtomicU32,
    search_queries: Mutex<Vec<String>>,
    discover_genres: Mutex<Vec<String>>,
    search_delays: Mutex<HashMap<String, Duration>>,
}

impl MockTmdbApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` list/search/discover calls fail.
    pub fn fail_next_lists(&self, n: u32) {
        self.fail_lists.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` genre calls fail.
    pub fn fail_next_genres(&self, n: u32) {
        self.fail_genres.store(n, Ordering::SeqCst);
    }

    /// Delays the search response for `query`.
    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(String::from(query), delay);
    }

    /// Number of list, search and discover calls issued.
    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn genre_calls(&self) -> u32 {
        self.genre_calls.load(Ordering::SeqCst)
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_queries.lock().unwrap().clone()
    }

    pub fn discover_genres(&self) -> Vec<String> {
        self.discover_genres.lock().unwrap().clone()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn list_page(
        &self,
        page: u32,
        first: &str,
        second: Option<&str>,
    ) -> Result<TmdbMovieListResponse> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_lists) {
            bail!("TMDB API error (HTTP 503 Service Unavailable): page {page}");
        }
        let body = match (page, second) {
            (1, _) => first,
            (2, Some(body)) => body,
            _ => LIST_EMPTY,
        };
        Ok(serde_json::from_str(body)?)
    }
}

impl TmdbApi for MockTmdbApi {
    async fn trending_movies(&self, params: &MovieListParams) -> Result<TmdbMovieListResponse> {
        self.list_page(params.page, POPULAR_PAGE1, Some(POPULAR_PAGE2))
    }

    async fn popular_movies(&self, params: &MovieListParams) -> Result<TmdbMovieListResponse> {
        self.list_page(params.page, POPULAR_PAGE1, Some(POPULAR_PAGE2))
    }

    async fn top_rated_movies(&self, params: &MovieListParams) -> Result<TmdbMovieListResponse> {
        self.list_page(params.page, POPULAR_PAGE1, Some(POPULAR_PAGE2))
    }

    async fn now_playing_movies(
        &self,
        params: &MovieListParams,
    ) -> Result<TmdbMovieListResponse> {
        self.list_page(params.page, POPULAR_PAGE1, Some(POPULAR_PAGE2))
    }

    async fn search_movies(&self, params: &SearchMovieParams) -> Result<TmdbMovieListResponse> {
        let delay = self
            .search_delays
            .lock()
            .unwrap()
            .get(&params.query)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.search_queries
            .lock()
            .unwrap()
            .push(params.query.clone());
        self.list_page(params.page, SEARCH_INCEPTION, None)
    }

    async fn discover_movies(
        &self,
        params: &DiscoverMovieParams,
    ) -> Result<TmdbMovieListResponse> {
        self.discover_genres
            .lock()
            .unwrap()
            .push(params.with_genres.clone());
        self.list_page(params.page, DISCOVER_ACTION_ADVENTURE, None)
    }

    async fn movie_details(&self, movie_id: u64, _language: &str) -> Result<TmdbMovieDetails> {
        if movie_id != 27_205 {
            bail!(
                "TMDB API error (HTTP 404 Not Found): code=34, message=The resource you requested could not be found."
            );
        }
        Ok(serde_json::from_str(DETAILS_27205)?)
    }

    async fn movie_genres(&self, _language: &str) -> Result<TmdbGenreListResponse> {
        self.genre_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_genres) {
            bail!("TMDB API error (HTTP 500 Internal Server Error)");
        }
        Ok(serde_json::from_str(GENRES)?)
    }
}

/// A minimal movie with the given genres.
pub fn make_movie(id: u64, genre_ids: &[u32]) -> Movie {
    Movie {
        id,
        title: format!("Movie {id}"),
        poster_path: format!("/{id}.jpg"),
        backdrop_path: String::new(),
        release_date: String::from("2024-01-01"),
        vote_average: 7.0,
        genre_ids: genre_ids.to_vec(),
    }
}

/// Inception details from the fixture.
pub fn sample_details() -> MovieDetails {
    let response: TmdbMovieDetails = serde_json::from_str(DETAILS_27205).unwrap();
    to_movie_details(&response)
}

/// A cache over a migrated in-memory database.
pub fn memory_cache() -> CacheStore {
    CacheStore::in_memory().unwrap()
}
