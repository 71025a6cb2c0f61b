//! Debounced, latest-wins search coordination.
//!
//! Callers push edits (query text, genre toggles) into a `watch` channel.
//! A worker task waits for 500 ms of quiet after text edits, fires
//! immediately for genre changes and clears, aborts the previous search
//! when a new one fires, and publishes `SearchState` snapshots.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use iflix_api::tmdb::TmdbApi;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::model::{Genre, Movie};
use crate::pager::Pager;
use crate::repository::MovieRepository;

/// Quiet period after a text edit before the search fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// How soon an edit should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTrigger {
    /// Text edit: wait for the debounce window.
    Typing,
    /// Genre toggle, history selection or clear: fire now.
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchRequest {
    generation: u64,
    query: String,
    genre_ids: BTreeSet<u32>,
    trigger: SearchTrigger,
}

/// Published search snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchState {
    /// Edit counter this snapshot answers.
    pub generation: u64,
    /// Trimmed query text.
    pub query: String,
    /// Selected genre IDs.
    pub genre_ids: BTreeSet<u32>,
    /// Loaded results.
    pub movies: Vec<Movie>,
    /// A request is in flight.
    pub is_loading: bool,
    /// Failure message of the last load.
    pub error: Option<String>,
    /// No further result pages.
    pub end_reached: bool,
}

impl SearchState {
    fn for_request(request: &SearchRequest) -> Self {
        Self {
            generation: request.generation,
            query: String::from(request.query.trim()),
            genre_ids: request.genre_ids.clone(),
            ..Self::default()
        }
    }

    /// Whether there is neither query text nor a genre selection.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.query.is_empty() && self.genre_ids.is_empty()
    }
}

/// Heading for a result list: the query if any, else the selected genre
/// names, else `Movies`.
#[must_use]
pub fn results_title(query: &str, genre_ids: &BTreeSet<u32>, genres: &[Genre]) -> String {
    let query = query.trim();
    if !query.is_empty() {
        return format!("Results for \"{query}\"");
    }
    let names: Vec<&str> = genre_ids
        .iter()
        .filter_map(|id| genres.iter().find(|g| g.id == *id))
        .map(|g| g.name.as_str())
        .collect();
    if names.is_empty() {
        String::from("Movies")
    } else {
        names.join(", ")
    }
}

#[derive(Debug)]
struct Shared<A> {
    repository: Arc<MovieRepository<A>>,
    state: watch::Sender<SearchState>,
    /// Generation of the most recently fired request.
    fired: AtomicU64,
    current: Mutex<Option<(u64, Pager<A>)>>,
}

impl<A> Shared<A> {
    fn is_latest(&self, generation: u64) -> bool {
        self.fired.load(Ordering::SeqCst) == generation
    }

    /// Publishes `state` unless a newer request has fired since.
    fn publish(&self, state: SearchState) -> bool {
        self.state.send_if_modified(|current| {
            if !self.is_latest(state.generation) {
                return false;
            }
            *current = state;
            true
        })
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Which pager operation `SearchCoordinator::drive` runs.
#[derive(Debug, Clone, Copy)]
enum PagerOp {
    LoadNext,
    Retry,
}

/// Owns the search worker. Dropping it stops the worker and any search
/// in flight.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchCoordinator<A> {
    requests: watch::Sender<SearchRequest>,
    shared: Arc<Shared<A>>,
    worker: JoinHandle<()>,
}

impl<A> SearchCoordinator<A>
where
    A: TmdbApi + Sync + 'static,
{
    /// Spawns the worker on the current tokio runtime.
    #[must_use]
    pub fn spawn(repository: Arc<MovieRepository<A>>, debounce: Duration) -> Self {
        let (requests, request_rx) = watch::channel(SearchRequest {
            generation: 0,
            query: String::new(),
            genre_ids: BTreeSet::new(),
            trigger: SearchTrigger::Immediate,
        });
        let shared = Arc::new(Shared {
            repository,
            state: watch::Sender::new(SearchState::default()),
            fired: AtomicU64::new(0),
            current: Mutex::new(None),
        });
        let worker = tokio::spawn(run_worker(Arc::clone(&shared), request_rx, debounce));
        Self {
            requests,
            shared,
            worker,
        }
    }

    fn update(&self, trigger: SearchTrigger, edit: impl FnOnce(&mut SearchRequest)) -> u64 {
        let mut generation = 0;
        self.requests.send_modify(|request| {
            edit(request);
            request.trigger = trigger;
            request.generation = request.generation.wrapping_add(1);
            generation = request.generation;
        });
        generation
    }

    /// Text edit. Debounced unless the text is blank (a clear).
    /// Returns the edit's generation.
    pub fn set_query(&self, text: &str) -> u64 {
        let trigger = if text.trim().is_empty() {
            SearchTrigger::Immediate
        } else {
            SearchTrigger::Typing
        };
        let text = String::from(text);
        self.update(trigger, |request| request.query = text)
    }

    /// Sets the query and searches now (history pick, submit).
    pub fn select_query(&self, text: &str) -> u64 {
        let text = String::from(text);
        self.update(SearchTrigger::Immediate, |request| request.query = text)
    }

    /// Clears the query text and searches now.
    pub fn clear_query(&self) -> u64 {
        self.update(SearchTrigger::Immediate, |request| request.query.clear())
    }

    /// Adds or removes one genre and searches now.
    pub fn toggle_genre(&self, genre_id: u32) -> u64 {
        self.update(SearchTrigger::Immediate, |request| {
            if !request.genre_ids.remove(&genre_id) {
                request.genre_ids.insert(genre_id);
            }
        })
    }

    /// Replaces the genre selection and searches now.
    pub fn set_genres(&self, genre_ids: impl IntoIterator<Item = u32>) -> u64 {
        let genre_ids: BTreeSet<u32> = genre_ids.into_iter().collect();
        self.update(SearchTrigger::Immediate, |request| {
            request.genre_ids = genre_ids;
        })
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// Receiver of published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    /// Waits until the latest edit has been answered and is not loading.
    pub async fn settled(&self) -> SearchState {
        let target = self.requests.borrow().generation;
        let mut rx = self.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.generation == target && !state.is_loading {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    /// Appends the next result page. Returns the number of movies loaded.
    ///
    /// # Errors
    ///
    /// Returns the page load error.
    pub async fn load_more(&self) -> Result<usize> {
        self.drive(PagerOp::LoadNext).await
    }

    /// Re-issues the failed result page load.
    ///
    /// # Errors
    ///
    /// Returns the page load error if it fails again.
    pub async fn retry(&self) -> Result<usize> {
        self.drive(PagerOp::Retry).await
    }

    /// Runs `op` on the current pager with the slot unlocked, so a newer
    /// intent can store its own pager meanwhile. The pager goes back only
    /// if its generation is still the latest.
    async fn drive(&self, op: PagerOp) -> Result<usize> {
        let taken = self.shared.current.lock().await.take();
        let Some((generation, mut pager)) = taken else {
            return Ok(0);
        };

        let result = match op {
            PagerOp::LoadNext => pager.load_next().await,
            PagerOp::Retry => pager.retry().await,
        };

        let mut current = self.shared.current.lock().await;
        if !self.shared.is_latest(generation) || current.is_some() {
            tracing::debug!(generation, "dropping page load of superseded search");
            return result;
        }
        let mut state = self.state();
        if state.generation == generation {
            state.movies = pager.items();
            state.end_reached = pager.is_end_reached();
            state.error = pager.error().map(String::from);
            self.shared.publish(state);
        }
        *current = Some((generation, pager));
        result
    }
}

impl<A> Drop for SearchCoordinator<A> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker<A>(
    shared: Arc<Shared<A>>,
    mut requests: watch::Receiver<SearchRequest>,
    debounce: Duration,
) where
    A: TmdbApi + Sync + 'static,
{
    let mut in_flight: Option<AbortOnDrop> = None;

    while requests.changed().await.is_ok() {
        let mut request = requests.borrow_and_update().clone();

        while request.trigger == SearchTrigger::Typing {
            tokio::select! {
                () = tokio::time::sleep(debounce) => break,
                changed = requests.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    request = requests.borrow_and_update().clone();
                }
            }
        }

        shared.fired.store(request.generation, Ordering::SeqCst);
        drop(in_flight.take());
        in_flight = Some(AbortOnDrop(tokio::spawn(execute(
            Arc::clone(&shared),
            request,
        ))));
    }
}

async fn execute<A>(shared: Arc<Shared<A>>, request: SearchRequest)
where
    A: TmdbApi + Sync + 'static,
{
    let mut state = SearchState::for_request(&request);
    let genre_ids: Vec<u32> = request.genre_ids.iter().copied().collect();

    if state.is_idle() {
        store_pager(&shared, request.generation, None).await;
        shared.publish(state);
        return;
    }

    tracing::debug!(
        generation = request.generation,
        query = %state.query,
        genres = ?genre_ids,
        "search fired"
    );
    state.is_loading = true;
    shared.publish(state.clone());
    state.is_loading = false;

    let pager = if state.query.is_empty() {
        shared.repository.discover_movies(&genre_ids)
    } else {
        shared
            .repository
            .search_movies_with_genres(&state.query, &genre_ids)
    };
    let mut pager = match pager {
        Ok(pager) => pager,
        Err(e) => {
            state.error = Some(format!("{e:#}"));
            shared.publish(state);
            return;
        }
    };

    if let Err(e) = pager.refresh().await {
        state.error = Some(format!("{e:#}"));
    }
    state.movies = pager.items();
    state.end_reached = pager.is_end_reached();

    store_pager(&shared, request.generation, Some(pager)).await;
    shared.publish(state);
}

async fn store_pager<A>(shared: &Shared<A>, generation: u64, pager: Option<Pager<A>>) {
    let mut current = shared.current.lock().await;
    if shared.is_latest(generation) {
        *current = pager.map(|pager| (generation, pager));
    }
}
