//! Regression metrics over predicted vs. actual ratings.

use crate::error::{EngineError, Result};
use crate::model::Predictions;
use std::fmt;

/// Supported regression metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Root mean squared error
    #[default]
    Rmse,
    /// Mean squared error
    Mse,
    /// Mean absolute error
    Mae,
    /// Coefficient of determination
    R2,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Rmse => "rmse",
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::R2 => "r2",
        }
    }

    /// True when a smaller value means a better model
    pub fn is_smaller_better(&self) -> bool {
        !matches!(self, Metric::R2)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_uppercase())
    }
}

/// Scores a set of predictions against their actual ratings.
///
/// Rows without a prediction are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionEvaluator {
    metric: Metric,
}

impl RegressionEvaluator {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Compute the metric.
    ///
    /// R² over a constant label column is undefined and comes back NaN or
    /// negative infinity.
    pub fn evaluate(&self, predictions: &Predictions) -> Result<f64> {
        let pairs: Vec<(f64, f64)> = predictions
            .rows()
            .iter()
            .filter_map(|p| p.prediction.map(|pred| (p.rating as f64, pred as f64)))
            .collect();

        if pairs.is_empty() {
            return Err(EngineError::EmptyDataset {
                operation: "evaluate predictions",
            });
        }

        let n = pairs.len() as f64;
        let sse: f64 = pairs.iter().map(|(y, p)| (y - p).powi(2)).sum();

        let value = match self.metric {
            Metric::Mse => sse / n,
            Metric::Rmse => (sse / n).sqrt(),
            Metric::Mae => pairs.iter().map(|(y, p)| (y - p).abs()).sum::<f64>() / n,
            Metric::R2 => {
                let mean = pairs.iter().map(|(y, _)| y).sum::<f64>() / n;
                let sst: f64 = pairs.iter().map(|(y, _)| (y - mean).powi(2)).sum();
                1.0 - sse / sst
            }
        };
        Ok(value)
    }
}
