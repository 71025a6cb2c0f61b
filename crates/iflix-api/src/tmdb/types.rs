//! TMDB API response types and request parameters.

use serde::Deserialize;

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

// --- Movie lists (trending / popular / top_rated / now_playing / search / discover) ---

/// Paged movie list response shared by all list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieListResponse {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Movies on this page.
    pub results: Vec<TmdbMovieResult>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

/// A single movie entry inside a list response.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieResult {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Release date (YYYY-MM-DD, empty string, or null).
    pub release_date: Option<String>,
    /// Vote average.
    pub vote_average: Option<f64>,
    /// Genre IDs (absent on some endpoints).
    #[serde(default)]
    pub genre_ids: Option<Vec<u32>>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
}

// --- Movie details ---

/// Response from `movie/{movie_id}` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Overview text.
    pub overview: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Release date.
    pub release_date: Option<String>,
    /// Vote average.
    pub vote_average: Option<f64>,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    /// Budget in USD.
    #[serde(default)]
    pub budget: u64,
    /// Revenue in USD.
    #[serde(default)]
    pub revenue: u64,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Release status (e.g., "Released").
    #[serde(default)]
    pub status: Option<String>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Production companies.
    #[serde(default)]
    pub production_companies: Vec<TmdbProductionCompany>,
    /// Production countries.
    #[serde(default)]
    pub production_countries: Vec<TmdbProductionCountry>,
    /// Spoken languages.
    #[serde(default)]
    pub spoken_languages: Vec<TmdbSpokenLanguage>,
    /// Homepage URL.
    #[serde(default)]
    pub homepage: Option<String>,
    /// IMDb ID.
    #[serde(default)]
    pub imdb_id: Option<String>,
}

/// Production company entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbProductionCompany {
    /// Company ID.
    #[serde(default)]
    pub id: u64,
    /// Company name.
    #[serde(default)]
    pub name: String,
    /// Logo image path.
    #[serde(default)]
    pub logo_path: Option<String>,
    /// Origin country (ISO 3166-1).
    #[serde(default)]
    pub origin_country: String,
}

/// Production country entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbProductionCountry {
    /// ISO 3166-1 code.
    #[serde(default)]
    pub iso_3166_1: String,
    /// Country name.
    #[serde(default)]
    pub name: String,
}

/// Spoken language entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSpokenLanguage {
    /// ISO 639-1 code.
    #[serde(default)]
    pub iso_639_1: String,
    /// Localized name.
    #[serde(default)]
    pub name: String,
    /// English name.
    #[serde(default)]
    pub english_name: String,
}

// --- Genres ---

/// Genre entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Response from `genre/movie/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreListResponse {
    /// All movie genres.
    pub genres: Vec<TmdbGenre>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[allow(dead_code)]
    #[serde(default)]
    pub success: bool,
}

// --- Request Parameters ---

/// Parameters for the plain list endpoints (trending, popular, top rated, now playing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieListParams {
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
}

impl MovieListParams {
    /// Creates list params for the given page.
    #[must_use]
    pub fn new(page: u32) -> Self {
        Self {
            language: String::from(DEFAULT_LANGUAGE),
            page,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for MovieListParams {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Parameters for `search/movie` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: String::from(DEFAULT_LANGUAGE),
            page: 1,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Parameters for `discover/movie` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverMovieParams {
    /// Comma-separated genre IDs (AND semantics on the server).
    pub with_genres: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Include adult content.
    pub include_adult: bool,
}

impl DiscoverMovieParams {
    /// Creates discover params filtering by the given genre list.
    pub fn new(with_genres: impl Into<String>) -> Self {
        Self {
            with_genres: with_genres.into(),
            language: String::from(DEFAULT_LANGUAGE),
            page: 1,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}
