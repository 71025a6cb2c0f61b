//! iflix - TMDB movie catalog CLI.

/// Application configuration (TOML).
mod config;
/// Table output.
mod output;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use iflix_api::tmdb::TmdbClient;
use iflix_core::mapper::details_to_movie;
use iflix_core::{
    CacheStore, Genre, HomeFeed, HomeSection, MovieRepository, Pager, SearchCoordinator,
    SearchRepository, SearchState, results_title,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::AppConfig;

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Page through a movie list.
    Movies(MoviesArgs),
    /// Show the first page of every home section.
    Home,
    /// Search movies by title, optionally narrowed to genres.
    Search(SearchArgs),
    /// Browse movies carrying every given genre.
    Discover(DiscoverArgs),
    /// Read query edits from stdin, one per line, and search as you type.
    SearchLive(SearchLiveArgs),
    /// Show one movie's details.
    Details(IdArgs),
    /// List movie genres.
    Genres,
    /// Manage favorite movies.
    Favorites(FavoritesCommand),
    /// Manage recent searches.
    History(HistoryCommand),
    /// Manage the config file.
    Config(ConfigCommand),
}

/// Movie lists available to `movies`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListCategory {
    Trending,
    Popular,
    TopRated,
    NowPlaying,
}

impl From<ListCategory> for HomeSection {
    fn from(category: ListCategory) -> Self {
        match category {
            ListCategory::Trending => Self::Trending,
            ListCategory::Popular => Self::Popular,
            ListCategory::TopRated => Self::TopRated,
            ListCategory::NowPlaying => Self::NowPlaying,
        }
    }
}

/// Arguments for the `movies` subcommand.
#[derive(clap::Args)]
struct MoviesArgs {
    /// List to page through.
    #[arg(value_enum)]
    category: ListCategory,
    /// Number of pages to load.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "Inception").
    #[arg(long, required = true)]
    query: String,
    /// Comma-separated genre IDs every result must carry (e.g. "28,12").
    #[arg(long, value_delimiter = ',')]
    genres: Vec<u32>,
    /// Number of pages to load.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,
}

/// Arguments for the `discover` subcommand.
#[derive(clap::Args)]
struct DiscoverArgs {
    /// Comma-separated genre IDs (e.g. "28,12").
    #[arg(long, required = true, value_delimiter = ',')]
    genres: Vec<u32>,
    /// Number of pages to load.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,
}

/// Arguments for the `search-live` subcommand.
#[derive(clap::Args)]
struct SearchLiveArgs {
    /// Comma-separated genre IDs applied to every query.
    #[arg(long, value_delimiter = ',')]
    genres: Vec<u32>,
}

/// Movie ID argument.
#[derive(clap::Args)]
struct IdArgs {
    /// TMDB movie ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Query text argument.
#[derive(clap::Args)]
struct QueryArgs {
    /// Query text.
    #[arg(long, required = true)]
    query: String,
}

/// Arguments for the `favorites` subcommand.
#[derive(clap::Args)]
struct FavoritesCommand {
    /// Favorites subcommand to run.
    #[command(subcommand)]
    command: FavoritesSubcommands,
}

/// Available favorites subcommands.
#[derive(Subcommand)]
enum FavoritesSubcommands {
    /// List favorite movies.
    List,
    /// Mark a movie as favorite.
    Add(IdArgs),
    /// Unmark a favorite movie.
    Remove(IdArgs),
}

/// Arguments for the `history` subcommand.
#[derive(clap::Args)]
struct HistoryCommand {
    /// History subcommand to run.
    #[command(subcommand)]
    command: HistorySubcommands,
}

/// Available history subcommands.
#[derive(Subcommand)]
enum HistorySubcommands {
    /// List the 10 most recent searches.
    List,
    /// Record a search query.
    Add(QueryArgs),
    /// Delete one search query.
    Delete(QueryArgs),
    /// Delete every search query.
    Clear,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration.
    Show,
    /// Write a config file with default values.
    Init,
}

/// Loads the config file for `dir`.
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let config_path = AppConfig::path(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Builds a TMDB client from `TMDB_API_TOKEN` and the config.
///
/// # Errors
///
/// Returns an error if `TMDB_API_TOKEN` is not set, the base URL is
/// invalid, or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &AppConfig) -> Result<TmdbClient> {
    let api_token = std::env::var("TMDB_API_TOKEN")
        .context("TMDB_API_TOKEN environment variable is required")?;

    let mut builder = TmdbClient::builder().api_token(api_token).user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(base_url) = &config.tmdb.base_url {
        let url = Url::parse(base_url)
            .with_context(|| format!("invalid tmdb.base_url: {base_url}"))?;
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build TMDB client")
}

/// Opens the local cache under `dir`.
fn open_cache(dir: Option<&PathBuf>) -> Result<CacheStore> {
    CacheStore::open(dir).context("failed to open database")
}

/// Builds the movie and search repositories over one cache.
fn build_repositories(
    dir: Option<&PathBuf>,
    config: &AppConfig,
) -> Result<(MovieRepository<TmdbClient>, SearchRepository)> {
    let client = build_tmdb_client(config)?;
    let cache = open_cache(dir)?;
    let movies = MovieRepository::new(Arc::new(client), cache.clone())
        .with_language(config.tmdb.language.as_str())
        .with_paging(config.list_paging(), config.now_playing_paging());
    Ok((movies, SearchRepository::new(cache)))
}

/// Loads the first page, then up to `pages - 1` more.
async fn load_pages(pager: &mut Pager<TmdbClient>, pages: u32) -> Result<()> {
    pager.refresh().await?;
    for _ in 1..pages {
        if pager.is_end_reached() {
            break;
        }
        pager.load_next().await?;
    }
    Ok(())
}

/// Genre list for result headings. Failures only lose the names.
async fn genre_names(repository: &MovieRepository<TmdbClient>, genre_ids: &[u32]) -> Vec<Genre> {
    if genre_ids.is_empty() {
        return Vec::new();
    }
    match repository.movie_genres().await {
        Ok(genres) => genres,
        Err(e) => {
            tracing::warn!("failed to fetch genre names: {e:#}");
            Vec::new()
        }
    }
}

/// Runs the `movies` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or a page load fails.
#[instrument(skip_all, fields(category = ?args.category))]
async fn run_movies(args: &MoviesArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, _) = build_repositories(dir, &config)?;
    let section = HomeSection::from(args.category);

    let mut pager = repository.movies(section.category())?;
    load_pages(&mut pager, args.pages)
        .await
        .with_context(|| format!("failed to load {} movies", section.category()))?;

    output::print_movies(section.title(), &pager.items());
    Ok(())
}

/// Runs the `home` subcommand.
///
/// Sections that fail are retried once and reported; the command fails
/// only when every section failed.
///
/// # Errors
///
/// Returns an error if the client fails to build or no section loads.
#[instrument(skip_all)]
async fn run_home(dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, _) = build_repositories(dir, &config)?;

    let mut feed = HomeFeed::new(&repository)?;
    let failed = feed.load_all().await;
    for section in failed {
        if let Err(e) = feed.retry(section).await {
            tracing::debug!(section = %section, "retry failed: {e:#}");
        }
    }

    let mut loaded = 0_usize;
    for section in HomeSection::ALL {
        if let Some(error) = feed.state(section).error {
            tracing::warn!("{section}: {error}");
            continue;
        }
        output::print_movies(section.title(), &feed.preview(section));
        loaded = loaded.saturating_add(1);
    }
    if loaded == 0 {
        bail!("every home section failed to load");
    }
    Ok(())
}

/// Runs the `search` subcommand and records the query in history.
///
/// # Errors
///
/// Returns an error if the query is blank or the request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, history) = build_repositories(dir, &config)?;
    let query = args.query.trim();

    let mut pager = repository.search_movies_with_genres(query, &args.genres)?;
    history.insert_query(query).await?;
    load_pages(&mut pager, args.pages)
        .await
        .context("TMDB search request failed")?;

    let genres = genre_names(&repository, &args.genres).await;
    let selected: BTreeSet<u32> = args.genres.iter().copied().collect();
    output::print_movies(&results_title(query, &selected, &genres), &pager.items());
    Ok(())
}

/// Runs the `discover` subcommand.
///
/// # Errors
///
/// Returns an error if no genre is given or the request fails.
#[instrument(skip_all)]
async fn run_discover(args: &DiscoverArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, _) = build_repositories(dir, &config)?;

    let mut pager = repository.discover_movies(&args.genres)?;
    load_pages(&mut pager, args.pages)
        .await
        .context("TMDB discover request failed")?;

    let genres = genre_names(&repository, &args.genres).await;
    let selected: BTreeSet<u32> = args.genres.iter().copied().collect();
    output::print_movies(&results_title("", &selected, &genres), &pager.items());
    Ok(())
}

/// Prints a settled search snapshot.
fn print_search_state(state: &SearchState, genres: &[Genre]) {
    if state.is_idle() {
        tracing::info!("Type a query to search.");
        return;
    }
    if let Some(error) = &state.error {
        tracing::warn!("search failed: {error}");
        return;
    }
    output::print_movies(
        &results_title(&state.query, &state.genre_ids, genres),
        &state.movies,
    );
}

/// Runs the `search-live` subcommand.
///
/// Each stdin line replaces the query text. Results are printed whenever
/// the debounced search settles; the final query is recorded in history.
///
/// # Errors
///
/// Returns an error if the client fails to build or stdin cannot be read.
#[instrument(skip_all)]
async fn run_search_live(args: &SearchLiveArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, history) = build_repositories(dir, &config)?;
    let genres = genre_names(&repository, &args.genres).await;

    let coordinator = SearchCoordinator::spawn(Arc::new(repository), config.search.debounce());
    if !args.genres.is_empty() {
        coordinator.set_genres(args.genres.iter().copied());
    }

    let mut states = coordinator.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0_u64;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        coordinator.set_query(&line);
                    }
                    None => break,
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if !state.is_loading && state.generation != printed {
                    print_search_state(&state, &genres);
                    printed = state.generation;
                }
            }
        }
    }

    let state = coordinator.settled().await;
    if state.generation != printed {
        print_search_state(&state, &genres);
    }
    history.insert_query(&state.query).await?;
    Ok(())
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if the request or the favorite lookup fails.
#[instrument(skip_all, fields(movie_id = args.id))]
async fn run_details(args: &IdArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, _) = build_repositories(dir, &config)?;

    let details = repository.movie_details(args.id).await?;
    let is_favorite = repository
        .is_movie_favorite(args.id)
        .next()
        .await
        .transpose()?
        .unwrap_or(false);

    output::print_details(&details, is_favorite);
    Ok(())
}

/// Runs the `genres` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_genres(dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, _) = build_repositories(dir, &config)?;

    let genres = repository.movie_genres().await?;
    output::print_genres(&genres);
    Ok(())
}

/// Runs the `favorites` subcommands.
///
/// # Errors
///
/// Returns an error if the client fails to build, the details request
/// fails, or the cache cannot be read or written.
#[instrument(skip_all)]
async fn run_favorites(command: &FavoritesSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let (repository, _) = build_repositories(dir, &config)?;

    match command {
        FavoritesSubcommands::List => {
            let favorites = repository
                .favorite_movies()
                .next()
                .await
                .transpose()?
                .unwrap_or_default();
            output::print_movies("Favorites", &favorites);
        }
        FavoritesSubcommands::Add(args) => {
            let details = repository.movie_details(args.id).await?;
            repository
                .set_favorite_movie(&details_to_movie(&details), true)
                .await?;
            tracing::info!("Added {} ({}) to favorites.", details.title, details.id);
        }
        FavoritesSubcommands::Remove(args) => {
            let Some(movie) = repository.favorite_movie(args.id).await? else {
                tracing::info!("Movie {} is not a favorite.", args.id);
                return Ok(());
            };
            repository.set_favorite_movie(&movie, false).await?;
            tracing::info!("Removed {} ({}) from favorites.", movie.title, movie.id);
        }
    }
    Ok(())
}

/// Runs the `history` subcommands. Needs no API token.
///
/// # Errors
///
/// Returns an error if the cache cannot be read or written.
#[instrument(skip_all)]
async fn run_history(command: &HistorySubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let history = SearchRepository::new(open_cache(dir)?);

    match command {
        HistorySubcommands::List => {
            let entries = history
                .search_history()
                .next()
                .await
                .transpose()?
                .unwrap_or_default();
            output::print_history(&entries);
        }
        HistorySubcommands::Add(args) => {
            if history.insert_query(&args.query).await? {
                tracing::info!("Recorded \"{}\".", args.query.trim());
            } else {
                tracing::info!("Ignored blank query.");
            }
        }
        HistorySubcommands::Delete(args) => {
            if history.delete_query(&args.query).await? {
                tracing::info!("Deleted \"{}\".", args.query.trim());
            } else {
                tracing::info!("\"{}\" is not in history.", args.query.trim());
            }
        }
        HistorySubcommands::Clear => {
            let removed = history.clear_history().await?;
            tracing::info!("Cleared {removed} queries.");
        }
    }
    Ok(())
}

/// Runs the `config` subcommands.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or written.
#[instrument(skip_all)]
fn run_config(command: &ConfigSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = AppConfig::path(dir).context("failed to resolve config path")?;

    match command {
        ConfigSubcommands::Show => {
            let config = AppConfig::load(&config_path).context("failed to load config")?;
            let content =
                toml::to_string_pretty(&config).context("failed to serialize config to TOML")?;
            tracing::info!("# {}", config_path.display());
            for line in content.lines() {
                tracing::info!("{line}");
            }
        }
        ConfigSubcommands::Init => {
            if config_path.exists() {
                tracing::info!("Config already exists: {}", config_path.display());
                return Ok(());
            }
            AppConfig::default().save(&config_path)?;
            tracing::info!("Wrote {}", config_path.display());
        }
    }
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Movies(args) => run_movies(&args, dir).await,
        Commands::Home => run_home(dir).await,
        Commands::Search(args) => run_search(&args, dir).await,
        Commands::Discover(args) => run_discover(&args, dir).await,
        Commands::SearchLive(args) => run_search_live(&args, dir).await,
        Commands::Details(args) => run_details(&args, dir).await,
        Commands::Genres => run_genres(dir).await,
        Commands::Favorites(cmd) => run_favorites(&cmd.command, dir).await,
        Commands::History(cmd) => run_history(&cmd.command, dir).await,
        Commands::Config(cmd) => run_config(&cmd.command, dir),
    }
}
