//! Error types for the pipeline crate.
//!
//! Each variant maps to one process exit code so the binary can report
//! failures without inspecting messages.

use data_loader::{DataLoadError, MovieId, UserId};
use engine::EngineError;
use thiserror::Error;

/// A recommendation could not be turned into an output line
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("No title for recommended movie {movie_id}")]
    MissingTitle { movie_id: MovieId },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Bad user input or option values
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An input file does not exist
    #[error("Data not found: {0}")]
    DataNotFound(#[source] DataLoadError),

    /// An input file exists but could not be read or parsed
    #[error("Failed to load data: {0}")]
    Data(#[source] DataLoadError),

    #[error("Model error: {0}")]
    Engine(#[from] EngineError),

    /// The model has no factors for this user
    #[error("No recommendations available for user {user_id}")]
    NoRecommendations { user_id: UserId },

    #[error("Lookup miss: {0}")]
    LookupMiss(#[from] FormatError),
}

impl From<DataLoadError> for PipelineError {
    fn from(err: DataLoadError) -> Self {
        if err.is_not_found() {
            PipelineError::DataNotFound(err)
        } else {
            PipelineError::Data(err)
        }
    }
}

impl PipelineError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Config(_) => 2,
            PipelineError::Engine(EngineError::InvalidParam { .. }) => 2,
            PipelineError::DataNotFound(_) => 3,
            PipelineError::Data(_) => 4,
            PipelineError::NoRecommendations { .. } => 5,
            PipelineError::LookupMiss(_) => 6,
            PipelineError::Engine(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
