//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{
    DiscoverMovieParams, MovieListParams, SearchMovieParams, TmdbGenreListResponse,
    TmdbMovieDetails, TmdbMovieListResponse,
};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches today's trending movies (`trending/movie/day`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn trending_movies(&self, params: &MovieListParams) -> Result<TmdbMovieListResponse>;

    /// Fetches popular movies (`movie/popular`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn popular_movies(&self, params: &MovieListParams) -> Result<TmdbMovieListResponse>;

    /// Fetches top rated movies (`movie/top_rated`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn top_rated_movies(&self, params: &MovieListParams) -> Result<TmdbMovieListResponse>;

    /// Fetches movies now playing in theaters (`movie/now_playing`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn now_playing_movies(&self, params: &MovieListParams)
    -> Result<TmdbMovieListResponse>;

    /// Searches for movies by free text (`search/movie`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_movies(&self, params: &SearchMovieParams) -> Result<TmdbMovieListResponse>;

    /// Discovers movies matching all of the given genres (`discover/movie`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn discover_movies(&self, params: &DiscoverMovieParams)
    -> Result<TmdbMovieListResponse>;

    /// Fetches full details for a single movie (`movie/{movie_id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_details(&self, movie_id: u64, language: &str) -> Result<TmdbMovieDetails>;

    /// Fetches the movie genre list (`genre/movie/list`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_genres(&self, language: &str) -> Result<TmdbGenreListResponse>;
}
