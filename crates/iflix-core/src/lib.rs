//! Core logic for iflix.
//!
//! Maps TMDB responses to domain models, pages through movie
//! categories, mirrors favorites and search history into the local
//! cache, and coordinates debounced search.

/// Local cache handle with change notifications.
pub mod cache;
/// Home feed sections.
pub mod home;
/// DTO and cache row conversions.
pub mod mapper;
/// Domain models.
pub mod model;
/// Incremental page loader.
pub mod pager;
/// Single-page loading per movie category.
pub mod paging;
/// Repositories over the API and the cache.
pub mod repository;
/// Debounced search coordination.
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

#[allow(clippy::module_name_repetitions)]
pub use cache::CacheStore;
pub use home::{HomeFeed, HomeSection, SectionState};
pub use model::{
    Genre, Movie, MovieDetails, ProductionCompany, ProductionCountry, SearchQuery,
    SpokenLanguage,
};
pub use pager::{LoadDirection, LoadState, Pager, PagingConfig};
pub use paging::{LoadParams, LoadResult, MovieCategory, MoviePagingSource, Page, PagingState};
pub use repository::{MovieRepository, SearchRepository};
pub use search::{
    DEFAULT_DEBOUNCE, SearchCoordinator, SearchState, SearchTrigger, results_title,
};
