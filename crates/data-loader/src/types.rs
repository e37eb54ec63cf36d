//! Core domain types for the MovieLens ratings data.
//!
//! - Type aliases for domain clarity (UserId, MovieId)
//! - `Rating`, one row of ratings.dat
//! - `MovieTitles`, the in-memory movie id to title lookup
//! - `RatingsDataset`, the loaded ratings table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user (1-6040 in MovieLens 1M)
pub type UserId = i32;

/// Unique identifier for a movie (varies in MovieLens 1M)
pub type MovieId = i32;

// =============================================================================
// Rating Type
// =============================================================================

/// A single rating from a user for a movie.
///
/// Schema: `userId::movieId::rating::timestamp`, all integer typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value, 1 to 5 in MovieLens 1M
    pub rating: i32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: i32, timestamp: i64) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
            timestamp,
        }
    }
}

// =============================================================================
// Movie title lookup
// =============================================================================

/// Movie id to title mapping built from movies.dat.
///
/// Built once at startup and only read afterwards. Titles are stored exactly
/// as they appeared in the file after Latin-1 decoding.
#[derive(Debug, Clone, Default)]
pub struct MovieTitles {
    titles: HashMap<MovieId, String>,
}

impl MovieTitles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the title for a movie
    pub fn get(&self, movie_id: MovieId) -> Option<&str> {
        self.titles.get(&movie_id).map(String::as_str)
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.titles.contains_key(&movie_id)
    }

    /// Insert a title, replacing any previous title for the same id
    pub fn insert(&mut self, movie_id: MovieId, title: impl Into<String>) {
        self.titles.insert(movie_id, title.into());
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MovieId, &str)> {
        self.titles.iter().map(|(&id, title)| (id, title.as_str()))
    }
}

impl FromIterator<(MovieId, String)> for MovieTitles {
    fn from_iter<I: IntoIterator<Item = (MovieId, String)>>(iter: I) -> Self {
        Self {
            titles: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// RatingsDataset
// =============================================================================

/// The ratings table, rows kept in file order.
///
/// Order matters: the seeded split walks rows in this order, so the same file
/// and seed always produce the same partitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingsDataset {
    pub(crate) rows: Vec<Rating>,
}

impl RatingsDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Rating] {
        &self.rows
    }

    pub fn push(&mut self, rating: Rating) {
        self.rows.push(rating);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Rating> {
        self.rows
    }
}

impl From<Vec<Rating>> for RatingsDataset {
    fn from(rows: Vec<Rating>) -> Self {
        Self { rows }
    }
}

impl FromIterator<Rating> for RatingsDataset {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
