//! movie-recommender - rate a few movies, get suggestions
//!
//! Thin command-line host over the engine: it owns the session, dispatches
//! training to the background worker and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use movie_recommender::EngineConfig;
use movie_recommender_core::config::{load_dotenv, ConfigLoader};
use movie_recommender_core::observability::{init_logging, LogConfig};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "movie-recommender")]
#[command(about = "Collaborative-filtering movie suggestions from your star ratings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        global = true,
        env = "RECOMMENDER_CATALOG_PATH",
        help = "Movies CSV (movieId,title,genres)"
    )]
    catalog: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "RECOMMENDER_COMMUNITY_RATINGS_PATH",
        help = "Ratings of other users (userId,movieId,rating[,timestamp])"
    )]
    community: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "text", help = "Output format")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List genres in catalog order")]
    Genres,

    #[command(about = "List movies, optionally restricted to one genre")]
    Movies {
        #[arg(short, long, help = "Genre to filter by")]
        genre: Option<String>,
    },

    #[command(about = "Train on your ratings and print suggestions")]
    Suggest {
        #[arg(short, long, help = "Your ratings CSV (movieId,rating)")]
        ratings: PathBuf,

        #[arg(short, long, help = "Latent feature count (10-150)")]
        features: Option<usize>,

        #[arg(short, long, help = "Number of suggestions")]
        top: Option<usize>,

        #[arg(long, help = "Seed for reproducible training")]
        seed: Option<u64>,

        #[arg(long, help = "Gradient-descent iterations")]
        iterations: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    load_dotenv();

    let log_config = LogConfig::from_env()?;
    init_logging(&log_config)?;

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env().context("Invalid engine configuration")?;
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }
    if cli.community.is_some() {
        config.community_ratings_path = cli.community;
    }

    match cli.command {
        Commands::Genres => commands::genres(config, cli.format)?,
        Commands::Movies { genre } => commands::movies(config, genre.as_deref(), cli.format)?,
        Commands::Suggest {
            ratings,
            features,
            top,
            seed,
            iterations,
        } => {
            if let Some(top) = top {
                config.top_n = top;
            }
            if let Some(iterations) = iterations {
                config.iterations = iterations;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if let Some(features) = features {
                config.feature_count = features;
            }
            config.validate().context("Invalid suggestion options")?;
            commands::suggest(config, &ratings, cli.format).await?;
        }
    }

    Ok(())
}
