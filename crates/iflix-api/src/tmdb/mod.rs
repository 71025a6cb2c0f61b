//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 movie endpoints
//! and retrieves movie lists, movie details, and genres.

mod api;
mod client;
mod rate_limiter;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    DiscoverMovieParams, MovieListParams, SearchMovieParams, TmdbGenre, TmdbGenreListResponse,
    TmdbMovieDetails, TmdbMovieListResponse, TmdbMovieResult, TmdbProductionCompany,
    TmdbProductionCountry, TmdbSpokenLanguage,
};
