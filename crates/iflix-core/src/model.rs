//! Domain models exposed to callers.

/// A movie as listed by any category endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    /// TMDB movie ID.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Poster image path (empty when unknown).
    pub poster_path: String,
    /// Backdrop image path (empty when unknown).
    pub backdrop_path: String,
    /// Release date as `YYYY-MM-DD` (empty when unknown).
    pub release_date: String,
    /// Average vote (0.0 when unknown).
    pub vote_average: f64,
    /// Genre IDs (empty when unknown).
    pub genre_ids: Vec<u32>,
}

impl Movie {
    /// Returns the release year, if the release date carries one.
    #[must_use]
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .get(..4)
            .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Returns whether the movie carries every one of the given genres.
    #[must_use]
    pub fn has_all_genres<'a>(&self, genre_ids: impl IntoIterator<Item = &'a u32>) -> bool {
        genre_ids
            .into_iter()
            .all(|id| self.genre_ids.contains(id))
    }
}

/// A movie genre.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genre {
    /// TMDB genre ID.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Production company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionCompany {
    /// Company ID.
    pub id: u64,
    /// Company name.
    pub name: String,
    /// Logo image path.
    pub logo_path: Option<String>,
    /// ISO 3166-1 country code (may be empty).
    pub origin_country: String,
}

/// Production country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionCountry {
    /// ISO 3166-1 country code.
    pub iso_3166_1: String,
    /// Country name.
    pub name: String,
}

/// Spoken language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenLanguage {
    /// ISO 639-1 language code.
    pub iso_639_1: String,
    /// Native name.
    pub name: String,
    /// English name.
    pub english_name: String,
}

/// Full movie details, fetched on demand and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Plot summary (empty when unknown).
    pub overview: String,
    /// Poster image path (empty when unknown).
    pub poster_path: String,
    /// Backdrop image path (empty when unknown).
    pub backdrop_path: String,
    /// Release date as `YYYY-MM-DD` (empty when unknown).
    pub release_date: String,
    /// Average vote (0.0 when unknown).
    pub vote_average: f64,
    /// Number of votes.
    pub vote_count: u32,
    /// Genres.
    pub genres: Vec<Genre>,
    /// Runtime in minutes (0 when unknown).
    pub runtime: u32,
    /// Budget in USD (0 when unknown).
    pub budget: u64,
    /// Revenue in USD (0 when unknown).
    pub revenue: u64,
    /// Tagline (empty when unknown).
    pub tagline: String,
    /// Release status, e.g. `Released`.
    pub status: String,
    /// ISO 639-1 original language code.
    pub original_language: String,
    /// TMDB popularity score.
    pub popularity: f64,
    /// Production companies.
    pub production_companies: Vec<ProductionCompany>,
    /// Production countries.
    pub production_countries: Vec<ProductionCountry>,
    /// Spoken languages.
    pub spoken_languages: Vec<SpokenLanguage>,
    /// Official homepage (empty when unknown).
    pub homepage: String,
    /// IMDb ID (empty when unknown).
    pub imdb_id: String,
}

impl MovieDetails {
    /// Formats the runtime as `2h 28m`, or `None` when unknown.
    #[must_use]
    pub fn runtime_label(&self) -> Option<String> {
        if self.runtime == 0 {
            return None;
        }
        let hours = self.runtime / 60;
        let minutes = self.runtime % 60;
        Some(match (hours, minutes) {
            (0, m) => format!("{m}m"),
            (h, 0) => format!("{h}h"),
            (h, m) => format!("{h}h {m}m"),
        })
    }
}

/// A recent search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Query text.
    pub query: String,
    /// Last use, epoch milliseconds.
    pub timestamp: i64,
}
