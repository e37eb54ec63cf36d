//! # Data Loader Crate
//!
//! Loads the MovieLens 1M files the recommender needs.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, MovieTitles, RatingsDataset)
//! - **parser**: Parse `::`-separated .dat files into Rust structs
//! - **loader**: Load both files from a dataset directory
//! - **split**: Seeded, reproducible train/test split
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::MovieLens;
//! use std::path::Path;
//!
//! let data = MovieLens::load_from_dir(Path::new("ml-1m"))?;
//! let (training, test) = data.ratings.train_test_split(0.7, 42)?;
//!
//! println!("{} training rows, {} test rows", training.len(), test.len());
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod loader;
pub mod split;

pub use error::{DataLoadError, Result};
pub use loader::{DataPaths, MovieLens, MOVIES_FILE, RATINGS_FILE};
pub use split::DEFAULT_SPLIT_SEED;
pub use types::{MovieId, MovieTitles, Rating, RatingsDataset, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collections() {
        let titles = MovieTitles::new();
        let ratings = RatingsDataset::new();

        assert!(titles.is_empty());
        assert!(ratings.is_empty());
        assert!(titles.get(999).is_none());
    }

    #[test]
    fn test_insert_title() {
        let mut titles = MovieTitles::new();
        titles.insert(1, "Toy Story (1995)");

        assert!(titles.contains(1));
        assert_eq!(titles.get(1), Some("Toy Story (1995)"));
        assert_eq!(titles.len(), 1);
    }

    #[test]
    fn test_collect_ratings() {
        let ratings: RatingsDataset = vec![
            Rating::new(1, 1193, 5, 978300760),
            Rating::new(2, 1193, 4, 978300761),
        ]
        .into_iter()
        .collect();

        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings.rows()[1].user_id, 2);
    }
}
