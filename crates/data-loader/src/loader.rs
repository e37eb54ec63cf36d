//! Loading the MovieLens files from disk.
//!
//! Both files are parsed in parallel with `rayon::join`; the title lookup
//! is small, the ratings file is the long pole.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the movie lookup inside a MovieLens directory
pub const MOVIES_FILE: &str = "movies.dat";

/// File name of the ratings table inside a MovieLens directory
pub const RATINGS_FILE: &str = "ratings.dat";

/// Locations of the two input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub movies: PathBuf,
    pub ratings: PathBuf,
}

impl DataPaths {
    /// Standard layout: `<dir>/movies.dat` and `<dir>/ratings.dat`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            movies: data_dir.join(MOVIES_FILE),
            ratings: data_dir.join(RATINGS_FILE),
        }
    }
}

/// Everything the recommender reads from disk
#[derive(Debug, Clone)]
pub struct MovieLens {
    pub titles: MovieTitles,
    pub ratings: RatingsDataset,
}

impl MovieLens {
    /// Load the dataset from a MovieLens directory such as `ml-1m`
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        Self::load(&DataPaths::in_dir(data_dir))
    }

    /// Load the title lookup and the ratings table in parallel
    pub fn load(paths: &DataPaths) -> Result<Self> {
        info!(
            "Loading MovieLens data from {} and {}",
            paths.movies.display(),
            paths.ratings.display()
        );

        let (titles, ratings) = rayon::join(
            || parser::parse_movie_titles(&paths.movies),
            || parser::parse_ratings(&paths.ratings),
        );

        // Lookup errors are reported first, matching the order the files are named
        let titles = titles?;
        let ratings = ratings?;

        info!("Loaded {} titles, {} ratings", titles.len(), ratings.len());

        Ok(Self { titles, ratings })
    }

    /// Get counts for debugging/validation
    pub fn counts(&self) -> (usize, usize) {
        (self.titles.len(), self.ratings.len())
    }
}
