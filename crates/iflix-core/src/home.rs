//! Home feed: one pager per list category with per-section state.

use std::fmt;

use anyhow::Result;
use iflix_api::tmdb::TmdbApi;

use crate::model::Movie;
use crate::pager::Pager;
use crate::paging::MovieCategory;
use crate::repository::MovieRepository;

/// Home feed section, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeSection {
    /// Trending today.
    Trending,
    /// Now playing banner.
    NowPlaying,
    /// Popular.
    Popular,
    /// Top rated.
    TopRated,
}

impl HomeSection {
    /// Every section in display order.
    pub const ALL: [Self; 4] = [
        Self::Trending,
        Self::NowPlaying,
        Self::Popular,
        Self::TopRated,
    ];

    /// Section heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Trending => "Trending",
            Self::NowPlaying => "Now Playing",
            Self::Popular => "Popular",
            Self::TopRated => "Top Rated",
        }
    }

    /// Category paged by the section.
    #[must_use]
    pub const fn category(self) -> MovieCategory {
        match self {
            Self::Trending => MovieCategory::Trending,
            Self::NowPlaying => MovieCategory::NowPlaying,
            Self::Popular => MovieCategory::Popular,
            Self::TopRated => MovieCategory::TopRated,
        }
    }
}

impl fmt::Display for HomeSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Loading and error state of one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionState {
    /// A request is in flight.
    pub loading: bool,
    /// Message of the failed request awaiting retry.
    pub error: Option<String>,
}

/// The four home sections. Sections load and fail independently.
#[derive(Debug)]
pub struct HomeFeed<A> {
    trending: Pager<A>,
    now_playing: Pager<A>,
    popular: Pager<A>,
    top_rated: Pager<A>,
}

impl<A: TmdbApi + Sync> HomeFeed<A> {
    /// Creates one pager per section from `repository`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pager cannot be created.
    pub fn new(repository: &MovieRepository<A>) -> Result<Self> {
        Ok(Self {
            trending: repository.trending_movies()?,
            now_playing: repository.now_playing_movies()?,
            popular: repository.popular_movies()?,
            top_rated: repository.top_rated_movies()?,
        })
    }

    /// Pager behind `section`.
    #[must_use]
    pub const fn pager(&self, section: HomeSection) -> &Pager<A> {
        match section {
            HomeSection::Trending => &self.trending,
            HomeSection::NowPlaying => &self.now_playing,
            HomeSection::Popular => &self.popular,
            HomeSection::TopRated => &self.top_rated,
        }
    }

    /// Mutable pager behind `section`, for paging further.
    pub const fn pager_mut(&mut self, section: HomeSection) -> &mut Pager<A> {
        match section {
            HomeSection::Trending => &mut self.trending,
            HomeSection::NowPlaying => &mut self.now_playing,
            HomeSection::Popular => &mut self.popular,
            HomeSection::TopRated => &mut self.top_rated,
        }
    }

    /// Current state of `section`.
    #[must_use]
    pub fn state(&self, section: HomeSection) -> SectionState {
        let pager = self.pager(section);
        SectionState {
            loading: pager.is_loading(),
            error: pager.error().map(String::from),
        }
    }

    /// First page worth of movies for `section`.
    #[must_use]
    pub fn preview(&self, section: HomeSection) -> Vec<Movie> {
        let pager = self.pager(section);
        let size = usize::try_from(pager.config().page_size).unwrap_or(usize::MAX);
        pager.items().into_iter().take(size).collect()
    }

    /// Loads the first page of every section not loaded yet, concurrently.
    /// Returns the sections that failed.
    pub async fn load_all(&mut self) -> Vec<HomeSection> {
        let (trending, now_playing, popular, top_rated) = tokio::join!(
            load_first(&mut self.trending),
            load_first(&mut self.now_playing),
            load_first(&mut self.popular),
            load_first(&mut self.top_rated),
        );
        collect_failures([trending, now_playing, popular, top_rated])
    }

    /// Reloads every section around its current position, concurrently.
    /// Returns the sections that failed.
    pub async fn refresh(&mut self) -> Vec<HomeSection> {
        let (trending, now_playing, popular, top_rated) = tokio::join!(
            self.trending.refresh(),
            self.now_playing.refresh(),
            self.popular.refresh(),
            self.top_rated.refresh(),
        );
        collect_failures([trending, now_playing, popular, top_rated])
    }

    /// Re-issues the failed request of `section` only.
    ///
    /// # Errors
    ///
    /// Returns the load error if it fails again.
    pub async fn retry(&mut self, section: HomeSection) -> Result<usize> {
        self.pager_mut(section).retry().await
    }
}

async fn load_first<A: TmdbApi + Sync>(pager: &mut Pager<A>) -> Result<usize> {
    if pager.pages().is_empty() {
        pager.refresh().await
    } else {
        Ok(0)
    }
}

/// Pairs results given in `HomeSection::ALL` order with their section.
fn collect_failures(results: [Result<usize>; 4]) -> Vec<HomeSection> {
    HomeSection::ALL
        .into_iter()
        .zip(results)
        .filter_map(|(section, result)| match result {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(section = %section, "home section failed: {e:#}");
                Some(section)
            }
        })
        .collect()
}
