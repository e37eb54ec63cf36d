//! Seeded random split of a ratings dataset.
//!
//! One uniform sample is drawn per row, in row order, from a `StdRng`
//! seeded with the caller's seed. Weights are normalised into cumulative
//! bounds and each row goes to the split whose `[lower, upper)` range holds
//! its sample. With the same rows and seed the partitions are identical.

use crate::error::{DataLoadError, Result};
use crate::types::RatingsDataset;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Seed used by the recommender when none is given
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Cumulative upper bounds for normalised weights, e.g. [0.7, 0.3] -> [0.7, 1.0]
fn cumulative_bounds(weights: &[f64]) -> Result<Vec<f64>> {
    if weights.is_empty() {
        return Err(DataLoadError::ValidationError(
            "split weights must not be empty".to_string(),
        ));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(DataLoadError::ValidationError(format!(
            "split weights must be non-negative, got {}",
            bad
        )));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(DataLoadError::ValidationError(
            "split weights must sum to a positive value".to_string(),
        ));
    }

    let mut acc = 0.0;
    let mut bounds: Vec<f64> = weights
        .iter()
        .map(|w| {
            acc += w / total;
            acc
        })
        .collect();
    // Rounding can leave the last bound just under 1.0
    if let Some(last) = bounds.last_mut() {
        *last = 1.0;
    }
    Ok(bounds)
}

impl RatingsDataset {
    /// Split the dataset into `weights.len()` parts.
    ///
    /// Row order inside each part follows the original row order.
    pub fn random_split(&self, weights: &[f64], seed: u64) -> Result<Vec<RatingsDataset>> {
        let bounds = cumulative_bounds(weights)?;
        let mut parts = vec![RatingsDataset::new(); bounds.len()];
        let mut rng = StdRng::seed_from_u64(seed);

        for rating in &self.rows {
            let sample: f64 = rng.random();
            let slot = bounds
                .iter()
                .position(|&upper| sample < upper)
                .unwrap_or(bounds.len() - 1);
            parts[slot].push(*rating);
        }

        debug!(
            "Split {} rows with seed {} into {:?}",
            self.len(),
            seed,
            parts.iter().map(RatingsDataset::len).collect::<Vec<_>>()
        );
        Ok(parts)
    }

    /// Two-way split into (training, test) by `train_ratio`
    pub fn train_test_split(
        &self,
        train_ratio: f64,
        seed: u64,
    ) -> Result<(RatingsDataset, RatingsDataset)> {
        if !(0.0..=1.0).contains(&train_ratio) {
            return Err(DataLoadError::ValidationError(format!(
                "train ratio must be within [0, 1], got {}",
                train_ratio
            )));
        }
        let mut parts = self
            .random_split(&[train_ratio, 1.0 - train_ratio], seed)?
            .into_iter();
        match (parts.next(), parts.next()) {
            (Some(training), Some(test)) => Ok((training, test)),
            _ => Err(DataLoadError::ValidationError(
                "two-way split did not produce two parts".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rating;

    fn dataset(n: i32) -> RatingsDataset {
        (0..n)
            .map(|i| Rating::new(i % 50 + 1, i % 97 + 1, (i % 5) as i32 + 1, 978300000 + i as i64))
            .collect()
    }

    #[test]
    fn test_same_seed_same_partitions() {
        let data = dataset(1_000);
        let first = data.random_split(&[0.7, 0.3], DEFAULT_SPLIT_SEED).unwrap();
        let second = data.random_split(&[0.7, 0.3], DEFAULT_SPLIT_SEED).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seed_changes_partitions() {
        let data = dataset(1_000);
        let first = data.random_split(&[0.7, 0.3], 42).unwrap();
        let second = data.random_split(&[0.7, 0.3], 7).unwrap();
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn test_every_row_lands_in_exactly_one_part() {
        let data = dataset(2_000);
        let (training, test) = data.train_test_split(0.7, 42).unwrap();
        assert_eq!(training.len() + test.len(), data.len());

        // Roughly 70/30; with 2000 rows the spread is a few percent
        let share = training.len() as f64 / data.len() as f64;
        assert!((0.64..0.76).contains(&share), "training share {share}");
    }

    #[test]
    fn test_weights_are_normalised() {
        let data = dataset(500);
        let scaled = data.random_split(&[7.0, 3.0], 42).unwrap();
        let plain = data.random_split(&[0.7, 0.3], 42).unwrap();
        assert_eq!(scaled, plain);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let data = dataset(10);
        assert!(data.random_split(&[], 42).is_err());
        assert!(data.random_split(&[0.5, -0.5], 42).is_err());
        assert!(data.random_split(&[0.0, 0.0], 42).is_err());
        assert!(data.train_test_split(1.5, 42).is_err());
    }
}
