//! Run configuration for the recommendation pipeline.
//!
//! `PipelineConfig::new(user_id)` gives the tuned defaults; the `with_*`
//! setters override single values.

use crate::error::{PipelineError, Result};
use data_loader::{DataPaths, UserId, DEFAULT_SPLIT_SEED};
use engine::{AlsParams, Metric};
use std::path::{Path, PathBuf};

/// Dataset directory used when none is given
pub const DEFAULT_DATA_DIR: &str = "ml-1m";

/// Number of recommendations printed per user
pub const DEFAULT_TOP_N: usize = 10;

/// Share of rows that go to the training split
pub const DEFAULT_TRAIN_RATIO: f64 = 0.7;

/// Name the engine session runs under
pub const APP_NAME: &str = "ALSMovieRec";

/// Which rows the model is fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitTarget {
    /// Every loaded rating; the split only feeds evaluation
    #[default]
    Full,
    /// Only the training split
    Training,
}

/// What to do when a recommended movie has no title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMissPolicy {
    /// Stop with a lookup-miss error
    #[default]
    Fail,
    /// Leave the recommendation out of the output
    Skip,
    /// Print `<unknown movie N>` in place of the title
    Placeholder,
}

/// Everything one run needs
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub user_id: UserId,
    pub paths: DataPaths,
    pub als: AlsParams,
    pub top_n: usize,
    pub train_ratio: f64,
    pub split_seed: u64,
    pub fit_target: FitTarget,
    /// Metric to report on the test split; `None` skips evaluation
    pub evaluate: Option<Metric>,
    pub on_missing_title: LookupMissPolicy,
    /// Worker threads for the engine session; 0 means one per CPU
    pub threads: usize,
}

impl PipelineConfig {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            paths: DataPaths::in_dir(Path::new(DEFAULT_DATA_DIR)),
            als: AlsParams::default(),
            top_n: DEFAULT_TOP_N,
            train_ratio: DEFAULT_TRAIN_RATIO,
            split_seed: DEFAULT_SPLIT_SEED,
            fit_target: FitTarget::default(),
            evaluate: None,
            on_missing_title: LookupMissPolicy::default(),
            threads: 0,
        }
    }

    /// Read both files from `data_dir`
    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.paths = DataPaths::in_dir(data_dir.as_ref());
        self
    }

    pub fn with_movies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.movies = path.into();
        self
    }

    pub fn with_ratings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.ratings = path.into();
        self
    }

    pub fn with_als(mut self, als: AlsParams) -> Self {
        self.als = als;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_train_ratio(mut self, train_ratio: f64) -> Self {
        self.train_ratio = train_ratio;
        self
    }

    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    pub fn with_fit_target(mut self, fit_target: FitTarget) -> Self {
        self.fit_target = fit_target;
        self
    }

    pub fn with_evaluation(mut self, metric: Option<Metric>) -> Self {
        self.evaluate = metric;
        self
    }

    pub fn with_lookup_miss_policy(mut self, policy: LookupMissPolicy) -> Self {
        self.on_missing_title = policy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(PipelineError::Config(
                "number of recommendations must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.train_ratio) {
            return Err(PipelineError::Config(format!(
                "train ratio must be within [0, 1], got {}",
                self.train_ratio
            )));
        }
        self.als
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))
    }
}
