//! Tabular output through `tracing::info!`.

use iflix_core::{Genre, Movie, MovieDetails, SearchQuery};

/// Prints a titled movie table.
pub fn print_movies(title: &str, movies: &[Movie]) {
    tracing::info!("{} ({} movies)", title, movies.len());
    if movies.is_empty() {
        return;
    }
    tracing::info!("ID\tYear\tRating\tTitle");
    for movie in movies {
        tracing::info!(
            "{}\t{}\t{:.1}\t{}",
            movie.id,
            movie.release_year().unwrap_or("-"),
            movie.vote_average,
            movie.title,
        );
    }
}

/// Prints the detail view of one movie.
pub fn print_details(details: &MovieDetails, is_favorite: bool) {
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!("{} ({})", details.title, details.id);
    if !details.tagline.is_empty() {
        tracing::info!("  {}", details.tagline);
    }
    tracing::info!(
        "Released: {}\tRuntime: {}\tRating: {:.1} ({} votes)",
        if details.release_date.is_empty() {
            "-"
        } else {
            details.release_date.as_str()
        },
        details.runtime_label().unwrap_or_else(|| String::from("-")),
        details.vote_average,
        details.vote_count,
    );
    tracing::info!("Genres: {}", genres.join(", "));
    tracing::info!("Favorite: {}", if is_favorite { "yes" } else { "no" });
    if !details.overview.is_empty() {
        tracing::info!("{}", details.overview);
    }
}

/// Prints the genre list.
pub fn print_genres(genres: &[Genre]) {
    tracing::info!("ID\tName");
    for genre in genres {
        tracing::info!("{}\t{}", genre.id, genre.name);
    }
    tracing::info!("Total: {} genres", genres.len());
}

/// Prints recent searches, newest first.
pub fn print_history(history: &[SearchQuery]) {
    if history.is_empty() {
        tracing::info!("No search history.");
        return;
    }
    for (index, entry) in history.iter().enumerate() {
        tracing::info!("{:>2}  {}", index.saturating_add(1), entry.query);
    }
}
