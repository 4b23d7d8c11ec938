//! Rating files
//!
//! Two CSV layouts are understood:
//!
//! - user ratings, `movieId,rating[,timestamp]`, the stars a single user has given
//! - community ratings, MovieLens `ratings.csv` (`userId,movieId,rating[,timestamp]`),
//!   other users whose columns are appended to the rating matrix so that the
//!   latent factors are learned from more than one taste profile

use crate::catalog::check_header;
use movie_recommender_core::validation::validate_rating;
use movie_recommender_core::{MovieId, RecommenderError, Result};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::info;

const USER_HEADER: &[&str] = &["movieId", "rating"];
const COMMUNITY_HEADER: &[&str] = &["userId", "movieId", "rating"];

/// Ratings of one user, keyed by movie
pub type UserRatings = HashMap<MovieId, f64>;

/// Read a `movieId,rating` file
pub fn read_user_ratings(path: impl AsRef<Path>) -> Result<UserRatings> {
    let file = std::fs::File::open(path)?;
    parse_user_ratings(file)
}

/// Parse `movieId,rating` records; a later record for the same movie wins
pub fn parse_user_ratings<R: Read>(reader: R) -> Result<UserRatings> {
    let mut ratings = UserRatings::new();
    for_each_record(reader, USER_HEADER, |line, fields| {
        let movie_id = parse_id(fields[0], "movieId", line)?;
        let rating = parse_rating(fields[1], line)?;
        ratings.insert(movie_id, rating);
        Ok(())
    })?;
    Ok(ratings)
}

/// Ratings from other users of the same catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommunityRatings {
    /// Ordered by user id so matrix columns are stable
    users: BTreeMap<u32, UserRatings>,
}

impl CommunityRatings {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let community = Self::parse(file)?;
        info!(
            users = community.user_count(),
            ratings = community.rating_count(),
            path = %path.as_ref().display(),
            "Community ratings loaded"
        );
        Ok(community)
    }

    pub fn from_csv(csv: &str) -> Result<Self> {
        Self::parse(csv.as_bytes())
    }

    /// Parse `userId,movieId,rating[,timestamp]` records
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut users: BTreeMap<u32, UserRatings> = BTreeMap::new();
        for_each_record(reader, COMMUNITY_HEADER, |line, fields| {
            let user_id = parse_id(fields[0], "userId", line)?;
            let movie_id = parse_id(fields[1], "movieId", line)?;
            let rating = parse_rating(fields[2], line)?;
            users.entry(user_id).or_default().insert(movie_id, rating);
            Ok(())
        })?;
        Ok(Self { users })
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn rating_count(&self) -> usize {
        self.users.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Per-user ratings in ascending user id order
    pub fn users(&self) -> impl Iterator<Item = &UserRatings> {
        self.users.values()
    }
}

/// Check the header, then visit every data record with at least `header.len()` columns
fn for_each_record<R, F>(reader: R, header: &[&str], mut visit: F) -> Result<()>
where
    R: Read,
    F: FnMut(usize, &[&str]) -> Result<()>,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    check_header(reader.headers()?, header, &["timestamp"])?;

    let min_fields = header.len();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let fields: Vec<&str> = record.iter().collect();
        if fields.len() < min_fields {
            return Err(RecommenderError::data_format(
                format!(
                    "expected at least {} fields, found {}",
                    min_fields,
                    fields.len()
                ),
                Some(line),
            ));
        }
        visit(line, &fields)?;
    }
    Ok(())
}

fn parse_id(field: &str, name: &str, line: usize) -> Result<u32> {
    field.parse().map_err(|_| {
        RecommenderError::data_format(
            format!("{} '{}' is not a non-negative integer", name, field),
            Some(line),
        )
    })
}

fn parse_rating(field: &str, line: usize) -> Result<f64> {
    let rating: f64 = field.parse().map_err(|_| {
        RecommenderError::data_format(format!("rating '{}' is not a number", field), Some(line))
    })?;
    validate_rating(rating)
        .map_err(|e| RecommenderError::data_format(e.to_string(), Some(line)))?;
    Ok(rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_ratings() {
        let ratings = parse_user_ratings("movieId,rating\n1,5\n3,1.5\n1,4\n".as_bytes()).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[&1], 4.0);
        assert_eq!(ratings[&3], 1.5);
    }

    #[test]
    fn test_parse_user_ratings_rejects_out_of_scale() {
        let err = parse_user_ratings("movieId,rating\n1,9\n".as_bytes()).unwrap_err();
        match err {
            RecommenderError::DataFormatError { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("Expected DataFormatError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_community_ratings() {
        let community = CommunityRatings::from_csv(
            "userId,movieId,rating,timestamp\n\
             7,1,4.0,964982703\n\
             2,1,3.0,964982224\n\
             2,3,5.0,964983815\n",
        )
        .unwrap();

        assert_eq!(community.user_count(), 2);
        assert_eq!(community.rating_count(), 3);

        // ascending user id: 2 then 7
        let users: Vec<&UserRatings> = community.users().collect();
        assert_eq!(users[0].len(), 2);
        assert_eq!(users[1][&1], 4.0);
    }

    #[test]
    fn test_user_ratings_without_header_are_rejected() {
        let err = parse_user_ratings("1,5\n3,4\n".as_bytes()).unwrap_err();
        match err {
            RecommenderError::DataFormatError { line, .. } => assert_eq!(line, Some(1)),
            other => panic!("Expected DataFormatError, got {:?}", other),
        }
    }

    #[test]
    fn test_user_ratings_accept_timestamp_column() {
        let ratings =
            parse_user_ratings("MovieId,Rating,Timestamp\n1,5,964982703\n".as_bytes()).unwrap();
        assert_eq!(ratings[&1], 5.0);
    }

    #[test]
    fn test_community_ratings_with_wrong_header_are_rejected() {
        let err = CommunityRatings::from_csv("movieId,rating\n1,5\n").unwrap_err();
        assert!(matches!(
            err,
            RecommenderError::DataFormatError { line: Some(1), .. }
        ));

        let err = CommunityRatings::from_csv("1,1,4.0,964982703\n2,1,3.0,964982224\n").unwrap_err();
        assert!(matches!(
            err,
            RecommenderError::DataFormatError { line: Some(1), .. }
        ));
    }

    #[test]
    fn test_parse_community_ratings_short_record() {
        let err = CommunityRatings::from_csv("userId,movieId,rating\n1,2\n").unwrap_err();
        assert!(matches!(err, RecommenderError::DataFormatError { .. }));
    }
}
