//! Incremental page loader on top of `MoviePagingSource`.

use std::collections::BTreeSet;

use anyhow::Result;
use iflix_api::tmdb::TmdbApi;

use crate::model::Movie;
use crate::paging::{LoadParams, LoadResult, MovieCategory, MoviePagingSource, Page, PagingState};

/// Items requested per page for list sections.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Items requested per page for the now-playing banner.
const NOW_PLAYING_PAGE_SIZE: u32 = 5;

/// Paging configuration for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Requested items per page, passed to the source as `load_size`.
    pub page_size: u32,
}

impl PagingConfig {
    /// Creates a configuration with the given page size.
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self { page_size }
    }

    /// Configuration for the now-playing banner (5 per page).
    #[must_use]
    pub const fn now_playing() -> Self {
        Self::new(NOW_PLAYING_PAGE_SIZE)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Direction of a page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDirection {
    /// Replace everything with the page around the anchor.
    Refresh,
    /// Load the page after the last loaded one.
    Append,
    /// Load the page before the first loaded one.
    Prepend,
}

/// Load status for one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Idle. `end_reached` is set once no further page exists.
    NotLoading {
        /// No more pages in this direction.
        end_reached: bool,
    },
    /// A request is in flight.
    Loading,
    /// The last load failed with this message.
    Error(String),
}

impl LoadState {
    const IDLE: Self = Self::NotLoading { end_reached: false };
}

/// A failed load kept for `retry`.
#[derive(Debug, Clone, Copy)]
struct FailedLoad {
    direction: LoadDirection,
    key: Option<u32>,
}

/// Drives a paging source: initial load, append, prepend, retry and
/// refresh, with an optional client-side genre filter.
///
/// Each load returns its own `Result`; a failure leaves already loaded
/// pages untouched.
#[derive(Debug)]
pub struct Pager<A> {
    source: MoviePagingSource<A>,
    config: PagingConfig,
    pages: Vec<Page>,
    genre_filter: BTreeSet<u32>,
    anchor_position: Option<usize>,
    refresh_state: LoadState,
    append_state: LoadState,
    prepend_state: LoadState,
    failed: Option<FailedLoad>,
}

impl<A: TmdbApi + Sync> Pager<A> {
    /// Creates an empty pager. Nothing is loaded until `refresh` or
    /// `load_next` is called.
    #[must_use]
    pub const fn new(source: MoviePagingSource<A>, config: PagingConfig) -> Self {
        Self {
            source,
            config,
            pages: Vec::new(),
            genre_filter: BTreeSet::new(),
            anchor_position: None,
            refresh_state: LoadState::IDLE,
            append_state: LoadState::IDLE,
            prepend_state: LoadState::IDLE,
            failed: None,
        }
    }

    /// Keeps only movies carrying every one of `genre_ids`.
    #[must_use]
    pub fn with_genre_filter(mut self, genre_ids: impl IntoIterator<Item = u32>) -> Self {
        self.genre_filter = genre_ids.into_iter().collect();
        self
    }

    /// Category being paged.
    #[must_use]
    pub const fn category(&self) -> &MovieCategory {
        self.source.category()
    }

    /// Paging configuration.
    #[must_use]
    pub const fn config(&self) -> PagingConfig {
        self.config
    }

    /// Active client-side genre filter.
    #[must_use]
    pub const fn genre_filter(&self) -> &BTreeSet<u32> {
        &self.genre_filter
    }

    /// Loaded pages in display order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Loaded movies in display order, after the genre filter.
    #[must_use]
    pub fn items(&self) -> Vec<Movie> {
        self.pages
            .iter()
            .flat_map(|page| page.data.iter())
            .filter(|movie| movie.has_all_genres(&self.genre_filter))
            .cloned()
            .collect()
    }

    /// Records the most recently accessed item index.
    pub const fn set_anchor_position(&mut self, position: usize) {
        self.anchor_position = Some(position);
    }

    /// Current refresh key inputs.
    #[must_use]
    pub fn paging_state(&self) -> PagingState<'_> {
        PagingState {
            pages: &self.pages,
            anchor_position: self.anchor_position,
        }
    }

    /// Load state for `direction`.
    #[must_use]
    pub const fn load_state(&self, direction: LoadDirection) -> &LoadState {
        match direction {
            LoadDirection::Refresh => &self.refresh_state,
            LoadDirection::Append => &self.append_state,
            LoadDirection::Prepend => &self.prepend_state,
        }
    }

    /// Whether any direction has a request in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        [
            &self.refresh_state,
            &self.append_state,
            &self.prepend_state,
        ]
        .into_iter()
        .any(|s| *s == LoadState::Loading)
    }

    /// Error message of the load awaiting `retry`, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        let failed = self.failed?;
        match self.load_state(failed.direction) {
            LoadState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether the last loaded page has no successor.
    #[must_use]
    pub fn is_end_reached(&self) -> bool {
        !self.pages.is_empty()
            && self.pages.last().is_some_and(|page| page.next_key.is_none())
    }

    /// Replaces all pages with the page around the anchor (page 1 when
    /// nothing is anchored). Returns the number of movies loaded.
    ///
    /// # Errors
    ///
    /// Returns the page load error; loaded pages are kept.
    pub async fn refresh(&mut self) -> Result<usize> {
        let key = MoviePagingSource::<A>::refresh_key(&self.paging_state());
        self.load_page(LoadDirection::Refresh, key).await
    }

    /// Appends the next page. Loads page 1 first when nothing is loaded.
    /// Returns the number of movies loaded (0 at the end).
    ///
    /// # Errors
    ///
    /// Returns the page load error; loaded pages are kept.
    pub async fn load_next(&mut self) -> Result<usize> {
        let Some(last) = self.pages.last() else {
            return self.load_page(LoadDirection::Refresh, None).await;
        };
        match last.next_key {
            Some(key) => self.load_page(LoadDirection::Append, Some(key)).await,
            None => Ok(0),
        }
    }

    /// Prepends the previous page. Returns the number of movies loaded
    /// (0 when the first loaded page is page 1).
    ///
    /// # Errors
    ///
    /// Returns the page load error; loaded pages are kept.
    pub async fn load_previous(&mut self) -> Result<usize> {
        match self.pages.first().and_then(|page| page.prev_key) {
            Some(key) => self.load_page(LoadDirection::Prepend, Some(key)).await,
            None => Ok(0),
        }
    }

    /// Re-issues the failed load with the same key and direction.
    /// Returns 0 when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns the page load error if it fails again.
    pub async fn retry(&mut self) -> Result<usize> {
        let Some(failed) = self.failed else {
            return Ok(0);
        };
        tracing::debug!(
            category = %self.source.category(),
            direction = ?failed.direction,
            key = ?failed.key,
            "retrying page load"
        );
        self.load_page(failed.direction, failed.key).await
    }

    fn set_state(&mut self, direction: LoadDirection, state: LoadState) {
        match direction {
            LoadDirection::Refresh => self.refresh_state = state,
            LoadDirection::Append => self.append_state = state,
            LoadDirection::Prepend => self.prepend_state = state,
        }
    }

    async fn load_page(&mut self, direction: LoadDirection, key: Option<u32>) -> Result<usize> {
        self.set_state(direction, LoadState::Loading);
        let params = LoadParams {
            key,
            load_size: self.config.page_size,
        };

        match self.source.load(params).await {
            LoadResult::Page(page) => {
                self.failed = None;
                let added = page.data.len();
                match direction {
                    LoadDirection::Refresh => {
                        self.append_state = LoadState::NotLoading {
                            end_reached: page.next_key.is_none(),
                        };
                        self.prepend_state = LoadState::NotLoading {
                            end_reached: page.prev_key.is_none(),
                        };
                        self.refresh_state = LoadState::IDLE;
                        self.pages.clear();
                        self.pages.push(page);
                    }
                    LoadDirection::Append => {
                        self.append_state = LoadState::NotLoading {
                            end_reached: page.next_key.is_none(),
                        };
                        self.pages.push(page);
                    }
                    LoadDirection::Prepend => {
                        self.prepend_state = LoadState::NotLoading {
                            end_reached: page.prev_key.is_none(),
                        };
                        self.anchor_position =
                            self.anchor_position.map(|a| a.saturating_add(added));
                        self.pages.insert(0, page);
                    }
                }
                Ok(added)
            }
            LoadResult::Error(err) => {
                self.set_state(direction, LoadState::Error(format!("{err:#}")));
                self.failed = Some(FailedLoad { direction, key });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::sync::Arc;

    use super::*;
    use crate::test_support::MockTmdbApi;

    fn pager(api: &Arc<MockTmdbApi>, category: MovieCategory) -> Pager<MockTmdbApi> {
        let source = MoviePagingSource::new(Arc::clone(api), category, "en-US");
        Pager::new(source, PagingConfig::default())
    }

    #[test]
    fn test_paging_config_sizes() {
        // Arrange & Act & Assert
        assert_eq!(PagingConfig::default().page_size, 20);
        assert_eq!(PagingConfig::now_playing().page_size, 5);
    }

    #[tokio::test]
    async fn test_load_next_walks_pages_until_empty() {
        // Arrange
        let api = Arc::new(MockTmdbApi::new());
        let mut pager = pager(&api, MovieCategory::Popular);

        // Act
        let first = pager.load_next().await.unwrap();
        let second = pager.load_next().await.unwrap();
        let third = pager.load_next().await.unwrap();
        let past_end = pager.load_next().await.unwrap();

        // Assert
        assert_eq!((first, second, third, past_end), (20, 20, 0, 0));
        assert_eq!(pager.items().len(), 40);
        assert!(pager.is_end_reached());
        assert_eq!(
            *pager.load_state(LoadDirection::Append),
            LoadState::NotLoading { end_reached: true }
        );
        assert_eq!(api.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_append_keeps_pages_and_retry_resumes() {
        // Arrange
        let api = Arc::new(MockTmdbApi::new());
        let mut pager = pager(&api, MovieCategory::Popular);
        pager.load_next().await.unwrap();
        api.fail_next_lists(1);

        // Act
        let failed = pager.load_next().await;
        let items_after_failure = pager.items().len();
        let error = pager.error().map(String::from);
        let retried = pager.retry().await.unwrap();

        // Assert
        assert!(failed.is_err());
        assert_eq!(items_after_failure, 20);
        assert!(error.unwrap().contains("503"));
        assert_eq!(retried, 20);
        assert_eq!(pager.items().len(), 40);
        assert_eq!(pager.items()[20].id, 1021);
        assert!(pager.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_initial_load_is_retried_as_refresh() {
        // Arrange
        let api = Arc::new(MockTmdbApi::new());
        let mut pager = pager(&api, MovieCategory::Trending);
        api.fail_next_lists(1);

        // Act
        let failed = pager.refresh().await;
        let retried = pager.retry().await.unwrap();

        // Assert
        assert!(failed.is_err());
        assert_eq!(retried, 20);
        assert_eq!(
            *pager.load_state(LoadDirection::Refresh),
            LoadState::NotLoading { end_reached: false }
        );
    }

    #[tokio::test]
    async fn test_retry_without_failure_is_noop() {
        // Arrange
        let api = Arc::new(MockTmdbApi::new());
        let mut pager = pager(&api, MovieCategory::Popular);

        // Act
        let retried = pager.retry().await.unwrap();

        // Assert
        assert_eq!(retried, 0);
        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_reloads_around_anchor_then_prepends() {
        // Arrange
        let api = Arc::new(MockTmdbApi::new());
        let mut pager = pager(&api, MovieCategory::TopRated);
        pager.load_next().await.unwrap();
        pager.load_next().await.unwrap();
        pager.set_anchor_position(25);

        // Act
        pager.refresh().await.unwrap();
        let reloaded_first = pager.items()[0].id;
        let prepended = pager.load_previous().await.unwrap();
        let at_start = pager.load_previous().await.unwrap();

        // Assert
        assert_eq!(reloaded_first, 1021);
        assert_eq!(prepended, 20);
        assert_eq!(at_start, 0);
        assert_eq!(pager.items()[0].id, 1001);
        assert_eq!(pager.paging_state().anchor_position, Some(45));
    }

    #[tokio::test]
    async fn test_genre_filter_keeps_supersets_only() {
        // Arrange
        let api = Arc::new(MockTmdbApi::new());
        let mut pager = pager(&api, MovieCategory::Search(String::from("Inception")))
            .with_genre_filter([28, 12]);

        // Act
        pager.load_next().await.unwrap();
        let items = pager.items();

        // Assert
        assert!(!items.is_empty());
        for movie in &items {
            assert!(movie.genre_ids.contains(&28));
            assert!(movie.genre_ids.contains(&12));
        }
        assert_eq!(pager.pages()[0].data.len(), 4);
    }
}
