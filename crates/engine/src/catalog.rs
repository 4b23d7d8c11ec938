//! Catalog Store
//!
//! Holds the movie list parsed from a MovieLens-style `movies.csv`
//! (`movieId,title,genres`, genres separated by `|`) together with the genre
//! index used by genre selection.

use movie_recommender_core::validation::validate_rating;
use movie_recommender_core::{Movie, MovieId, RecommenderError, Result, UNKNOWN_GENRE};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Marker MovieLens uses for movies without genres
const NO_GENRES_LISTED: &str = "(no genres listed)";
const GENRE_SEPARATOR: char = '|';

/// Where the catalog is read from
///
/// Kept by the store so that `reset` can reload the exact same data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Inline(String),
}

impl CatalogSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        CatalogSource::File(path.as_ref().to_path_buf())
    }

    pub fn inline(csv: impl Into<String>) -> Self {
        CatalogSource::Inline(csv.into())
    }
}

/// Movie catalog plus the current user's in-memory ratings
#[derive(Debug, Clone)]
pub struct CatalogStore {
    source: CatalogSource,
    /// Sorted by ascending id
    movies: Vec<Movie>,
    positions: HashMap<MovieId, usize>,
    /// Distinct genres in first-seen source order
    genres: Vec<String>,
}

impl CatalogStore {
    /// Load and parse the catalog
    ///
    /// # Errors
    ///
    /// - `DataFormatError` when a record is malformed or an id repeats
    /// - `IoError` when the file cannot be opened
    pub fn load(source: CatalogSource) -> Result<Self> {
        let movies = match &source {
            CatalogSource::File(path) => {
                let file = std::fs::File::open(path)?;
                parse_movies(file)?
            }
            CatalogSource::Inline(csv) => parse_movies(csv.as_bytes())?,
        };

        let store = Self::from_movies(source, movies)?;
        info!(
            movies = store.movies.len(),
            genres = store.genres.len(),
            "Catalog loaded"
        );
        Ok(store)
    }

    /// Load from a file path
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(CatalogSource::file(path))
    }

    /// Load from CSV text
    pub fn from_csv(csv: impl Into<String>) -> Result<Self> {
        Self::load(CatalogSource::inline(csv))
    }

    fn from_movies(source: CatalogSource, parsed: Vec<(usize, Movie)>) -> Result<Self> {
        let mut genres = Vec::new();
        let mut seen_genres = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut movies = Vec::with_capacity(parsed.len());

        for (line, movie) in parsed {
            if !seen_ids.insert(movie.id) {
                return Err(RecommenderError::data_format(
                    format!("duplicate movieId {}", movie.id),
                    Some(line),
                ));
            }
            for genre in &movie.genres {
                if seen_genres.insert(genre.clone()) {
                    genres.push(genre.clone());
                }
            }
            movies.push(movie);
        }

        movies.sort_by_key(|m| m.id);
        let positions = movies
            .iter()
            .enumerate()
            .map(|(pos, m)| (m.id, pos))
            .collect();

        Ok(Self {
            source,
            movies,
            positions,
            genres,
        })
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// All movies in ascending id order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn movie(&self, id: MovieId) -> Option<&Movie> {
        self.positions.get(&id).map(|&pos| &self.movies[pos])
    }

    /// Distinct genres in first-seen order
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Movies tagged with `genre`; an unknown genre yields an empty list
    pub fn movies_by_genre(&self, genre: &str) -> Vec<&Movie> {
        self.movies.iter().filter(|m| m.has_genre(genre)).collect()
    }

    pub fn rated_movies(&self) -> Vec<&Movie> {
        self.movies.iter().filter(|m| m.is_rated()).collect()
    }

    pub fn rated_count(&self) -> usize {
        self.movies.iter().filter(|m| m.is_rated()).count()
    }

    /// Record the user's star rating for a movie
    ///
    /// # Errors
    ///
    /// `ValidationError` for an unknown id or a rating outside 0-5.
    pub fn rate(&mut self, id: MovieId, rating: f64) -> Result<()> {
        validate_rating(rating)?;
        let movie = self.movie_mut(id)?;
        movie.rating = Some(rating);
        debug!(movie_id = id, rating, "Movie rated");
        Ok(())
    }

    /// Remove the user's rating for a movie
    pub fn clear_rating(&mut self, id: MovieId) -> Result<()> {
        self.movie_mut(id)?.rating = None;
        Ok(())
    }

    /// Reload the catalog from its source, discarding every rating
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::load(self.source.clone())?;
        info!("Catalog reset, all ratings discarded");
        Ok(())
    }

    fn movie_mut(&mut self, id: MovieId) -> Result<&mut Movie> {
        match self.positions.get(&id) {
            Some(&pos) => Ok(&mut self.movies[pos]),
            None => Err(RecommenderError::validation_field(
                format!("movie {} is not in the catalog", id),
                "movie_id",
            )),
        }
    }
}

/// Parse `movieId,title,genres` records, returning each movie with its line
fn parse_movies<R: Read>(reader: R) -> Result<Vec<(usize, Movie)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    check_header(reader.headers()?, &["movieId", "title"], &["genres"])?;

    let mut movies = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(movies.len() + 2);

        if record.len() < 2 || record.len() > 3 {
            return Err(RecommenderError::data_format(
                format!("expected 2 or 3 fields, found {}", record.len()),
                Some(line),
            ));
        }

        let id: MovieId = record[0].parse().map_err(|_| {
            RecommenderError::data_format(
                format!("movieId '{}' is not a non-negative integer", &record[0]),
                Some(line),
            )
        })?;

        let title = &record[1];
        if title.is_empty() {
            return Err(RecommenderError::data_format("empty title", Some(line)));
        }

        let genres = parse_genres(record.get(2).unwrap_or(""));
        movies.push((line, Movie::new(id, title, genres)));
    }

    Ok(movies)
}

/// Require a header row naming `required` then optionally `optional`, in order
///
/// Names compare case-insensitively. Anything else, including a first row
/// of data, is a `DataFormatError` at line 1.
pub(crate) fn check_header(
    headers: &csv::StringRecord,
    required: &[&str],
    optional: &[&str],
) -> Result<()> {
    let expected: Vec<&str> = required.iter().chain(optional).copied().collect();
    let matches = headers.len() >= required.len()
        && headers.len() <= expected.len()
        && headers
            .iter()
            .zip(&expected)
            .all(|(found, name)| found.eq_ignore_ascii_case(name));

    if matches {
        return Ok(());
    }

    let wanted = if optional.is_empty() {
        required.join(",")
    } else {
        format!("{}[,{}]", required.join(","), optional.join(","))
    };
    let found: Vec<&str> = headers.iter().collect();
    Err(RecommenderError::data_format(
        format!("expected header {}, found '{}'", wanted, found.join(",")),
        Some(1),
    ))
}

fn parse_genres(field: &str) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for genre in field.split(GENRE_SEPARATOR).map(str::trim) {
        if genre.is_empty() || genre == NO_GENRES_LISTED {
            continue;
        }
        if !genres.iter().any(|g| g == genre) {
            genres.push(genre.to_string());
        }
    }

    if genres.is_empty() {
        genres.push(UNKNOWN_GENRE.to_string());
    }
    genres
}
