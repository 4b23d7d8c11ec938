pub mod movie;

pub use movie::{Movie, MovieId, MAX_RATING, MIN_RATING, UNKNOWN_GENRE};
