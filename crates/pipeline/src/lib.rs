//! Recommendation pipeline for a single user.
//!
//! This crate provides:
//! - `PipelineConfig` with the tuned defaults and per-value overrides
//! - `RecommendationPipeline`, the straight-line run from files to lines
//! - the formatter that resolves movie ids to titles
//! - `PipelineError`, with one exit code per failure kind
//!
//! ## Example Usage
//! ```ignore
//! use engine::Session;
//! use pipeline::{PipelineConfig, RecommendationPipeline, APP_NAME};
//!
//! let session = Session::builder().app_name(APP_NAME).build()?;
//! let pipeline = RecommendationPipeline::new(&session, PipelineConfig::new(1))?;
//! let report = pipeline.run()?;
//! report.write_to(&mut std::io::stdout())?;
//! ```

pub mod config;
pub mod error;
pub mod formatter;
pub mod runner;

// Re-export main types
pub use config::{
    FitTarget, LookupMissPolicy, PipelineConfig, APP_NAME, DEFAULT_DATA_DIR, DEFAULT_TOP_N,
    DEFAULT_TRAIN_RATIO,
};
pub use error::{FormatError, PipelineError, Result};
pub use formatter::{format_recommendations, header};
pub use runner::{RecommendationPipeline, RecommendationReport};
