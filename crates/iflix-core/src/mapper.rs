//! Conversions between TMDB responses, domain models and cache rows.
//!
//! Missing optional upstream fields map to `""`, `0.0` or an empty list.

use iflix_api::tmdb::{
    TmdbGenre, TmdbMovieDetails, TmdbMovieResult, TmdbProductionCompany, TmdbProductionCountry,
    TmdbSpokenLanguage,
};
use iflix_db::{CachedMovie, CachedSearchQuery};

use crate::model::{
    Genre, Movie, MovieDetails, ProductionCompany, ProductionCountry, SearchQuery,
    SpokenLanguage,
};

/// Maps a list entry to a `Movie`.
#[must_use]
pub fn to_movie(r: &TmdbMovieResult) -> Movie {
    Movie {
        id: r.id,
        title: r.title.clone(),
        poster_path: r.poster_path.clone().unwrap_or_default(),
        backdrop_path: r.backdrop_path.clone().unwrap_or_default(),
        release_date: r.release_date.clone().unwrap_or_default(),
        vote_average: r.vote_average.unwrap_or_default(),
        genre_ids: r.genre_ids.clone().unwrap_or_default(),
    }
}

/// Maps a TMDB genre to a `Genre`.
#[must_use]
pub fn to_genre(g: &TmdbGenre) -> Genre {
    Genre {
        id: g.id,
        name: g.name.clone(),
    }
}

fn to_company(c: &TmdbProductionCompany) -> ProductionCompany {
    ProductionCompany {
        id: c.id,
        name: c.name.clone(),
        logo_path: c.logo_path.clone(),
        origin_country: c.origin_country.clone(),
    }
}

fn to_country(c: &TmdbProductionCountry) -> ProductionCountry {
    ProductionCountry {
        iso_3166_1: c.iso_3166_1.clone(),
        name: c.name.clone(),
    }
}

fn to_language(l: &TmdbSpokenLanguage) -> SpokenLanguage {
    SpokenLanguage {
        iso_639_1: l.iso_639_1.clone(),
        name: l.name.clone(),
        english_name: l.english_name.clone(),
    }
}

/// Maps a details response to `MovieDetails`.
#[must_use]
pub fn to_movie_details(d: &TmdbMovieDetails) -> MovieDetails {
    MovieDetails {
        id: d.id,
        title: d.title.clone(),
        overview: d.overview.clone().unwrap_or_default(),
        poster_path: d.poster_path.clone().unwrap_or_default(),
        backdrop_path: d.backdrop_path.clone().unwrap_or_default(),
        release_date: d.release_date.clone().unwrap_or_default(),
        vote_average: d.vote_average.unwrap_or_default(),
        vote_count: d.vote_count,
        genres: d.genres.iter().map(to_genre).collect(),
        runtime: d.runtime.unwrap_or_default(),
        budget: d.budget,
        revenue: d.revenue,
        tagline: d.tagline.clone().unwrap_or_default(),
        status: d.status.clone().unwrap_or_default(),
        original_language: d.original_language.clone().unwrap_or_default(),
        popularity: d.popularity,
        production_companies: d.production_companies.iter().map(to_company).collect(),
        production_countries: d.production_countries.iter().map(to_country).collect(),
        spoken_languages: d.spoken_languages.iter().map(to_language).collect(),
        homepage: d.homepage.clone().unwrap_or_default(),
        imdb_id: d.imdb_id.clone().unwrap_or_default(),
    }
}

/// Reduces details to the list-level `Movie` (genre IDs taken from `genres`).
#[must_use]
pub fn details_to_movie(d: &MovieDetails) -> Movie {
    Movie {
        id: d.id,
        title: d.title.clone(),
        poster_path: d.poster_path.clone(),
        backdrop_path: d.backdrop_path.clone(),
        release_date: d.release_date.clone(),
        vote_average: d.vote_average,
        genre_ids: d.genres.iter().map(|g| g.id).collect(),
    }
}

/// Builds a cache row for `movie` with the given favorite flag.
#[must_use]
pub fn to_cached_movie(movie: &Movie, is_favorite: bool) -> CachedMovie {
    CachedMovie {
        id: movie.id,
        title: movie.title.clone(),
        poster_path: movie.poster_path.clone(),
        backdrop_path: movie.backdrop_path.clone(),
        release_date: movie.release_date.clone(),
        vote_average: movie.vote_average,
        is_favorite,
    }
}

/// Restores a `Movie` from a cache row. Genres are not cached.
#[must_use]
pub fn from_cached_movie(row: &CachedMovie) -> Movie {
    Movie {
        id: row.id,
        title: row.title.clone(),
        poster_path: row.poster_path.clone(),
        backdrop_path: row.backdrop_path.clone(),
        release_date: row.release_date.clone(),
        vote_average: row.vote_average,
        genre_ids: Vec::new(),
    }
}

/// Maps a history row to a `SearchQuery`.
#[must_use]
pub fn from_cached_query(row: &CachedSearchQuery) -> SearchQuery {
    SearchQuery {
        query: row.query.clone(),
        timestamp: row.timestamp,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::float_cmp)]

    use iflix_api::tmdb::{TmdbGenreListResponse, TmdbMovieListResponse};

    use super::*;

    fn search_fixture() -> TmdbMovieListResponse {
        serde_json_fixture(include_str!(
            "../../../fixtures/tmdb/search_movie_inception.json"
        ))
    }

    fn serde_json_fixture<T: serde::de::DeserializeOwned>(json: &str) -> T {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_to_movie_copies_fields() {
        // Arrange
        let response = search_fixture();

        // Act
        let movie = to_movie(&response.results[0]);

        // Assert
        assert_eq!(movie.id, 27_205);
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.genre_ids, vec![28, 878, 12]);
        assert!(!movie.poster_path.is_empty());
        assert!(movie.vote_average > 0.0);
    }

    #[test]
    fn test_to_movie_fills_defaults() {
        // Arrange
        let response = search_fixture();

        // Act
        let jump = to_movie(&response.results[2]);
        let bare = to_movie(&response.results[3]);

        // Assert
        assert_eq!(jump.poster_path, "");
        assert_eq!(jump.release_date, "");
        assert_eq!(bare.vote_average, 0.0);
        assert!(bare.genre_ids.is_empty());
        assert_eq!(bare.release_date, "");
    }

    #[test]
    fn test_to_movie_details() {
        // Arrange
        let response: TmdbMovieDetails =
            serde_json_fixture(include_str!("../../../fixtures/tmdb/movie_details_27205.json"));

        // Act
        let details = to_movie_details(&response);

        // Assert
        assert_eq!(details.id, 27_205);
        assert_eq!(details.runtime, 148);
        assert_eq!(details.genres.len(), 3);
        assert_eq!(details.tagline, "Your mind is the scene of the crime.");
        assert_eq!(details.imdb_id, "tt1375666");
        assert_eq!(details.production_countries.len(), 2);
        assert_eq!(details.spoken_languages.len(), 4);
    }

    #[test]
    fn test_to_movie_details_minimal_response() {
        // Arrange
        let response: TmdbMovieDetails = serde_json_fixture(r#"{"id": 9, "title": "Sparse"}"#);

        // Act
        let details = to_movie_details(&response);

        // Assert
        assert_eq!(details.overview, "");
        assert_eq!(details.runtime, 0);
        assert_eq!(details.vote_average, 0.0);
        assert!(details.genres.is_empty());
    }

    #[test]
    fn test_details_to_movie_uses_genre_ids() {
        // Arrange
        let response: TmdbMovieDetails =
            serde_json_fixture(include_str!("../../../fixtures/tmdb/movie_details_27205.json"));
        let details = to_movie_details(&response);

        // Act
        let movie = details_to_movie(&details);

        // Assert
        assert_eq!(movie.id, details.id);
        assert_eq!(movie.genre_ids.len(), 3);
        assert_eq!(movie.vote_average, details.vote_average);
    }

    #[test]
    fn test_cache_row_conversion_keeps_list_fields() {
        // Arrange
        let movie = to_movie(&search_fixture().results[0]);

        // Act
        let row = to_cached_movie(&movie, true);
        let restored = from_cached_movie(&row);

        // Assert
        assert!(row.is_favorite);
        assert_eq!(restored.id, movie.id);
        assert_eq!(restored.title, movie.title);
        assert_eq!(restored.release_date, movie.release_date);
        assert!(restored.genre_ids.is_empty());
    }

    #[test]
    fn test_to_genre() {
        // Arrange
        let response: TmdbGenreListResponse =
            serde_json_fixture(include_str!("../../../fixtures/tmdb/genre_movie_list.json"));

        // Act
        let genres: Vec<Genre> = response.genres.iter().map(to_genre).collect();

        // Assert
        assert_eq!(genres[0], Genre { id: 28, name: String::from("Action") });
    }

    #[test]
    fn test_from_cached_query() {
        // Arrange
        let row = CachedSearchQuery {
            query: String::from("heat"),
            timestamp: 42,
        };

        // Act
        let query = from_cached_query(&row);

        // Assert
        assert_eq!(query.query, "heat");
        assert_eq!(query.timestamp, 42);
    }
}
