use crate::OutputFormat;
use anyhow::{Context, Result};
use colored::Colorize;
use movie_recommender::{read_user_ratings, RecommenderSession, TrainingWorker};
use movie_recommender::{EngineConfig, Movie};
use std::path::Path;

pub fn genres(config: EngineConfig, format: OutputFormat) -> Result<()> {
    let session = open_session(config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(session.genres())?),
        OutputFormat::Text => {
            println!("{}\n", "Genres".cyan().bold());
            for genre in session.genres() {
                let count = session.movies_by_genre(genre).len();
                println!("  {} {}", genre.white(), format!("({})", count).dimmed());
            }
            println!();
        }
    }
    Ok(())
}

pub fn movies(config: EngineConfig, genre: Option<&str>, format: OutputFormat) -> Result<()> {
    let session = open_session(config)?;
    let movies: Vec<&Movie> = match genre {
        Some(genre) => session.movies_by_genre(genre),
        None => session.catalog().movies().iter().collect(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&movies)?),
        OutputFormat::Text => {
            if movies.is_empty() {
                println!("{}", "No movies found.".yellow());
                return Ok(());
            }
            println!(
                "{:>8}  {:<50} {}",
                "ID".bold(),
                "Title".bold(),
                "Genres".bold()
            );
            println!("{}", "─".repeat(80).dimmed());
            for movie in movies {
                println!(
                    "{:>8}  {:<50} {}",
                    movie.id,
                    truncate(&movie.title, 50),
                    movie.genres.join("|").dimmed()
                );
            }
            println!();
        }
    }
    Ok(())
}

pub async fn suggest(config: EngineConfig, ratings_path: &Path, format: OutputFormat) -> Result<()> {
    let feature_count = config.feature_count;
    let mut session = open_session(config)?;

    let ratings = read_user_ratings(ratings_path)
        .with_context(|| format!("Failed to read ratings from {}", ratings_path.display()))?;
    session
        .rate_all(&ratings)
        .context("Ratings file references an invalid movie or rating")?;

    if session.is_single_user() {
        eprintln!(
            "{} no community ratings loaded (--community), predictions for unrated movies will be near 0",
            "Warning:".yellow().bold()
        );
    }

    if format == OutputFormat::Text {
        println!(
            "{} {} rated movies, {} features",
            "Training...".cyan().bold(),
            session.catalog().rated_count(),
            feature_count
        );
    }

    let worker = TrainingWorker::new();
    let handle = worker.submit(session.training_request(feature_count)?)?;
    let suggestions = handle.wait().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suggestions)?),
        OutputFormat::Text => {
            println!(
                "\n{} {}\n",
                "Suggested Movies, Error Prediction".cyan().bold(),
                format!("{:.4}", suggestions.prediction_error).white()
            );
            println!(
                "{:>4}  {:>8}  {:<50} {}",
                "#".bold(),
                "ID".bold(),
                "Title".bold(),
                "Predicted".bold()
            );
            println!("{}", "─".repeat(80).dimmed());
            for (rank, movie) in suggestions.recommendations.iter().enumerate() {
                println!(
                    "{:>4}  {:>8}  {:<50} {}",
                    rank + 1,
                    movie.movie_id,
                    truncate(&movie.title, 50),
                    format!("{:.2}", movie.predicted_rating).green()
                );
            }
            println!();
        }
    }
    Ok(())
}

fn open_session(config: EngineConfig) -> Result<RecommenderSession> {
    let path = config.catalog_path.clone();
    RecommenderSession::open(config)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
