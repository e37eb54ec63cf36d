//! Error types for the engine crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A hyperparameter or argument is out of range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    /// The operation needs at least one row
    #[error("Cannot {operation} on an empty dataset")]
    EmptyDataset { operation: &'static str },

    /// The session's worker pool could not be started
    #[error("Failed to start session thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A regularised least-squares system had no unique solution
    #[error("Normal equations are not positive definite (rank {rank}, lambda {lambda})")]
    Singular { rank: usize, lambda: f64 },
}

pub type Result<T> = std::result::Result<T, EngineError>;
