//! Single-page loading keyed by page number.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, bail};
use iflix_api::tmdb::{
    DiscoverMovieParams, MovieListParams, SearchMovieParams, TmdbApi, TmdbMovieListResponse,
};
use tracing::instrument;

use crate::mapper::to_movie;
use crate::model::Movie;

/// First page number accepted by TMDB.
const FIRST_PAGE: u32 = 1;

/// Movie list endpoint a paging source reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieCategory {
    /// `trending/movie/day`.
    Trending,
    /// `movie/popular`.
    Popular,
    /// `movie/top_rated`.
    TopRated,
    /// `movie/now_playing`.
    NowPlaying,
    /// `search/movie` with the given query.
    Search(String),
    /// `discover/movie` with comma-joined genre IDs.
    Discover(String),
}

impl MovieCategory {
    /// Returns the category name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::Popular => "popular",
            Self::TopRated => "top_rated",
            Self::NowPlaying => "now_playing",
            Self::Search(_) => "search",
            Self::Discover(_) => "discover",
        }
    }
}

impl fmt::Display for MovieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieCategory {
    type Err = anyhow::Error;

    /// Parses a list category. `search` and `discover` need a payload and
    /// are built directly instead.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "trending" => Ok(Self::Trending),
            "popular" => Ok(Self::Popular),
            "top_rated" => Ok(Self::TopRated),
            "now_playing" => Ok(Self::NowPlaying),
            "search" | "discover" => bail!("category {s:?} requires a query"),
            _ => bail!("invalid category: {s}"),
        }
    }
}

/// Parameters for a single page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParams {
    /// Page to load. `None` means initial load / refresh (page 1).
    pub key: Option<u32>,
    /// Requested number of items.
    pub load_size: u32,
}

/// A loaded page with its neighbour keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Movies on this page.
    pub data: Vec<Movie>,
    /// Key of the previous page (`None` on page 1).
    pub prev_key: Option<u32>,
    /// Key of the next page (`None` once a page comes back empty).
    pub next_key: Option<u32>,
}

/// Outcome of `MoviePagingSource::load`.
#[derive(Debug)]
pub enum LoadResult {
    /// The page was fetched and mapped.
    Page(Page),
    /// Transport, HTTP status or decode failure.
    Error(anyhow::Error),
}

/// Snapshot of loaded pages used to pick a refresh key.
#[derive(Debug, Clone, Copy)]
pub struct PagingState<'a> {
    /// Loaded pages in display order.
    pub pages: &'a [Page],
    /// Index of the most recently accessed item.
    pub anchor_position: Option<usize>,
}

impl PagingState<'_> {
    /// Returns the page containing `position`, clamped to the first or
    /// last loaded page.
    #[must_use]
    pub fn closest_page_to_position(&self, position: usize) -> Option<&Page> {
        let mut start = 0usize;
        for page in self.pages {
            let end = start.saturating_add(page.data.len());
            if position < end {
                return Some(page);
            }
            start = end;
        }
        self.pages.last()
    }
}

/// Loads one page of a movie category at a time.
#[derive(Debug)]
pub struct MoviePagingSource<A> {
    api: Arc<A>,
    category: MovieCategory,
    language: String,
}

impl<A: TmdbApi + Sync> MoviePagingSource<A> {
    /// Creates a source for `category` in the given response language.
    pub fn new(api: Arc<A>, category: MovieCategory, language: impl Into<String>) -> Self {
        Self {
            api,
            category,
            language: language.into(),
        }
    }

    /// Returns the category this source reads.
    #[must_use]
    pub const fn category(&self) -> &MovieCategory {
        &self.category
    }

    /// Loads the page named by `params.key` (page 1 when `None`).
    ///
    /// Exactly one upstream request is issued. Failures come back as
    /// `LoadResult::Error`.
    #[instrument(skip_all, fields(category = %self.category, key = ?params.key))]
    pub async fn load(&self, params: LoadParams) -> LoadResult {
        let page = params.key.unwrap_or(FIRST_PAGE).max(FIRST_PAGE);

        match self.fetch(page).await {
            Ok(response) => {
                let data: Vec<Movie> = response.results.iter().map(to_movie).collect();
                let prev_key = if page == FIRST_PAGE {
                    None
                } else {
                    page.checked_sub(1)
                };
                let next_key = if data.is_empty() {
                    None
                } else {
                    page.checked_add(1)
                };
                tracing::debug!(
                    page,
                    items = data.len(),
                    load_size = params.load_size,
                    "page loaded"
                );
                LoadResult::Page(Page {
                    data,
                    prev_key,
                    next_key,
                })
            }
            Err(e) => {
                tracing::warn!(page, error = %format!("{e:#}"), "page load failed");
                LoadResult::Error(e)
            }
        }
    }

    /// Issues the request for `page` against this source's endpoint.
    async fn fetch(&self, page: u32) -> Result<TmdbMovieListResponse> {
        let language = self.language.as_str();
        match &self.category {
            MovieCategory::Trending => {
                let params = MovieListParams::new(page).language(language);
                self.api.trending_movies(&params).await
            }
            MovieCategory::Popular => {
                let params = MovieListParams::new(page).language(language);
                self.api.popular_movies(&params).await
            }
            MovieCategory::TopRated => {
                let params = MovieListParams::new(page).language(language);
                self.api.top_rated_movies(&params).await
            }
            MovieCategory::NowPlaying => {
                let params = MovieListParams::new(page).language(language);
                self.api.now_playing_movies(&params).await
            }
            MovieCategory::Search(query) => {
                let params = SearchMovieParams::new(query.as_str())
                    .language(language)
                    .page(page);
                self.api.search_movies(&params).await
            }
            MovieCategory::Discover(genres) => {
                let params = DiscoverMovieParams::new(genres.as_str())
                    .language(language)
                    .page(page);
                self.api.discover_movies(&params).await
            }
        }
    }

    /// Picks the key to reload from when refreshing around the anchor.
    ///
    /// Uses the closest page's `prev_key + 1`, else its `next_key - 1`.
    #[must_use]
    pub fn refresh_key(state: &PagingState<'_>) -> Option<u32> {
        let anchor = state.anchor_position?;
        let page = state.closest_page_to_position(anchor)?;
        page.prev_key
            .and_then(|k| k.checked_add(1))
            .or_else(|| page.next_key.and_then(|k| k.checked_sub(1)))
    }
}
