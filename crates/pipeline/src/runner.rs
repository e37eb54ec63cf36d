//! # Recommendation Pipeline
//!
//! Runs the whole job for one user, one stage after another:
//! 1. Load the title lookup and the ratings table
//! 2. Split ratings into training/test with a fixed seed
//! 3. Fit ALS on the configured rows (all ratings, or training only)
//! 4. Optionally score the test split
//! 5. Ask the model for the user's top N
//! 6. Resolve titles and build the output lines
//!
//! Every stage blocks until it is done. Parallel work happens inside the
//! engine session handed in by the caller.

use std::io::{self, Write};
use std::time::Instant;

use tracing::{info, warn};

use data_loader::{MovieLens, RatingsDataset, UserId};
use engine::{Als, AlsModel, Metric, Recommendation, RegressionEvaluator, Session};

use crate::config::{FitTarget, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::formatter::{format_recommendations, header};

/// Result of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationReport {
    pub user_id: UserId,
    /// Ranked recommendations as returned by the model
    pub recommendations: Vec<Recommendation>,
    /// Formatted `"<title> <score>"` lines
    pub lines: Vec<String>,
    /// Metric and value on the test split, when evaluation was requested
    pub evaluation: Option<(Metric, f64)>,
}

impl RecommendationReport {
    /// Write the header, one line per recommendation, then the metric if any
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", header(self.user_id))?;
        for line in &self.lines {
            writeln!(out, "{}", line)?;
        }
        if let Some((metric, value)) = self.evaluation {
            writeln!(out, "{}: {}", metric, value)?;
        }
        Ok(())
    }
}

/// Straight-line pipeline bound to one session
pub struct RecommendationPipeline<'a> {
    session: &'a Session,
    config: PipelineConfig,
}

impl<'a> RecommendationPipeline<'a> {
    /// Check the configuration and bind it to `session`
    pub fn new(session: &'a Session, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { session, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the files named in the configuration, then run every stage
    pub fn run(&self) -> Result<RecommendationReport> {
        let data = self.load_data()?;
        self.run_with_data(&data)
    }

    /// Run every stage after loading, on data already in memory
    pub fn run_with_data(&self, data: &MovieLens) -> Result<RecommendationReport> {
        let start_time = Instant::now();
        let user_id = self.config.user_id;

        let (training, test) = self.split(&data.ratings)?;

        let model = self.train(data, &training)?;

        let evaluation = match self.config.evaluate {
            Some(metric) => Some((metric, self.evaluate(&model, &test, metric)?)),
            None => None,
        };

        let recommendations = self.recommend(&model)?;
        info!(
            "Selected top {} recommendations for user {}",
            recommendations.len(),
            user_id
        );

        let lines = format_recommendations(
            &recommendations,
            &data.titles,
            self.config.on_missing_title,
        )?;

        info!(
            "Total time to get recommendations for user {}: {:.2?}",
            user_id,
            start_time.elapsed()
        );

        Ok(RecommendationReport {
            user_id,
            recommendations,
            lines,
            evaluation,
        })
    }

    fn load_data(&self) -> Result<MovieLens> {
        let start = Instant::now();
        let data = MovieLens::load(&self.config.paths)?;
        info!("Loaded data in {:.2?}", start.elapsed());
        Ok(data)
    }

    fn split(&self, ratings: &RatingsDataset) -> Result<(RatingsDataset, RatingsDataset)> {
        let (training, test) =
            ratings.train_test_split(self.config.train_ratio, self.config.split_seed)?;
        info!(
            "Split {} ratings into {} training / {} test (seed {})",
            ratings.len(),
            training.len(),
            test.len(),
            self.config.split_seed
        );
        Ok((training, test))
    }

    fn train(&self, data: &MovieLens, training: &RatingsDataset) -> Result<AlsModel> {
        let rows = match self.config.fit_target {
            FitTarget::Full => data.ratings.rows(),
            FitTarget::Training => training.rows(),
        };
        info!(
            "Fitting on {:?} data ({} ratings)",
            self.config.fit_target,
            rows.len()
        );
        let model = Als::new(self.config.als.clone()).fit(self.session, rows)?;
        Ok(model)
    }

    fn evaluate(&self, model: &AlsModel, test: &RatingsDataset, metric: Metric) -> Result<f64> {
        let predictions = model.transform(self.session, test.rows());
        let dropped = predictions.missing_count();
        let predictions = predictions.drop_missing();
        if dropped > 0 {
            warn!("Dropped {} test rows with no prediction", dropped);
        }
        if self.config.fit_target == FitTarget::Full {
            warn!("Model was fitted on all ratings; the test score is not a held-out estimate");
        }

        let value = RegressionEvaluator::new(metric).evaluate(&predictions)?;
        info!("{} on {} test rows: {}", metric, predictions.len(), value);
        Ok(value)
    }

    fn recommend(&self, model: &AlsModel) -> Result<Vec<Recommendation>> {
        let user_id = self.config.user_id;
        let recommendations = model
            .recommend_for_user_subset(self.session, &[user_id], self.config.top_n)
            .into_iter()
            .find(|u| u.user_id == user_id)
            .map(|u| u.recommendations)
            .unwrap_or_default();

        if recommendations.is_empty() {
            return Err(PipelineError::NoRecommendations { user_id });
        }
        Ok(recommendations)
    }
}
