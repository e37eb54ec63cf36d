//! Fitted ALS model: point predictions, batch transform and top-N queries.

use crate::session::Session;
use data_loader::{MovieId, Rating, UserId};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// One recommended item with its predicted score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub score: f32,
}

impl Recommendation {
    pub fn new(movie_id: MovieId, score: f32) -> Self {
        Self { movie_id, score }
    }
}

/// Top-N list for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecommendations {
    pub user_id: UserId,
    pub recommendations: Vec<Recommendation>,
}

/// One input rating with the model's prediction attached.
///
/// `prediction` is `None` when the user or the movie has no factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: i32,
    pub prediction: Option<f32>,
}

/// Output of [`AlsModel::transform`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    rows: Vec<Prediction>,
}

impl Predictions {
    pub fn rows(&self) -> &[Prediction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.rows.iter().filter(|p| p.prediction.is_none()).count()
    }

    /// Drop rows without a prediction
    pub fn drop_missing(self) -> Self {
        Self {
            rows: self
                .rows
                .into_iter()
                .filter(|p| p.prediction.is_some())
                .collect(),
        }
    }
}

impl From<Vec<Prediction>> for Predictions {
    fn from(rows: Vec<Prediction>) -> Self {
        Self { rows }
    }
}

/// Latent factors for every user and item seen during fitting.
///
/// Row `n` of `user_factors` belongs to `user_ids[n]`; same for items.
#[derive(Debug, Clone)]
pub struct AlsModel {
    rank: usize,
    user_ids: Vec<UserId>,
    item_ids: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<MovieId, usize>,
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
}

impl AlsModel {
    pub(crate) fn new(
        rank: usize,
        user_ids: Vec<UserId>,
        item_ids: Vec<MovieId>,
        user_factors: Array2<f32>,
        item_factors: Array2<f32>,
    ) -> Self {
        let user_index = user_ids.iter().enumerate().map(|(n, &id)| (id, n)).collect();
        let item_index = item_ids.iter().enumerate().map(|(n, &id)| (id, n)).collect();
        Self {
            rank,
            user_ids,
            item_ids,
            user_index,
            item_index,
            user_factors,
            item_factors,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn num_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_ids.len()
    }

    pub fn has_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    pub fn user_factors(&self, user_id: UserId) -> Option<ArrayView1<'_, f32>> {
        self.user_index.get(&user_id).map(|&n| self.user_factors.row(n))
    }

    pub fn item_factors(&self, movie_id: MovieId) -> Option<ArrayView1<'_, f32>> {
        self.item_index.get(&movie_id).map(|&n| self.item_factors.row(n))
    }

    pub fn user_factor_matrix(&self) -> &Array2<f32> {
        &self.user_factors
    }

    pub fn item_factor_matrix(&self) -> &Array2<f32> {
        &self.item_factors
    }

    /// Predicted rating, `None` for an unknown user or item
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> Option<f32> {
        let user = self.user_factors(user_id)?;
        let item = self.item_factors(movie_id)?;
        Some(user.dot(&item))
    }

    /// Attach a prediction to every rating
    #[instrument(skip(self, session, ratings), fields(rows = ratings.len()))]
    pub fn transform(&self, session: &Session, ratings: &[Rating]) -> Predictions {
        let rows: Vec<Prediction> = session.run(|| {
            ratings
                .par_iter()
                .map(|r| Prediction {
                    user_id: r.user_id,
                    movie_id: r.movie_id,
                    rating: r.rating,
                    prediction: self.predict(r.user_id, r.movie_id),
                })
                .collect()
        });
        let predictions = Predictions::from(rows);
        debug!(
            "Transformed {} rows, {} without prediction",
            predictions.len(),
            predictions.missing_count()
        );
        predictions
    }

    /// Top `n` items for one user, best first.
    ///
    /// Ties are broken by ascending movie id. An unknown user gets an empty
    /// list. Items the user already rated are not excluded.
    pub fn recommend_for_user(&self, user_id: UserId, n: usize) -> Vec<Recommendation> {
        let Some(user) = self.user_factors(user_id) else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }

        let scores = self.item_factors.dot(&user);
        let mut ranked: Vec<Recommendation> = self
            .item_ids
            .iter()
            .zip(scores.iter())
            .map(|(&movie_id, &score)| Recommendation::new(movie_id, score))
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.movie_id.cmp(&b.movie_id))
        });
        ranked.truncate(n);
        ranked
    }

    /// Top `n` items for each distinct known user in `users`.
    ///
    /// Output follows the first occurrence order of `users`; unknown users
    /// are left out.
    #[instrument(skip(self, session, users), fields(users = users.len()))]
    pub fn recommend_for_user_subset(
        &self,
        session: &Session,
        users: &[UserId],
        n: usize,
    ) -> Vec<UserRecommendations> {
        let mut seen = HashSet::new();
        let known: Vec<UserId> = users
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| self.has_user(*id))
            .collect();

        session.run(|| {
            known
                .par_iter()
                .map(|&user_id| UserRecommendations {
                    user_id,
                    recommendations: self.recommend_for_user(user_id, n),
                })
                .collect()
        })
    }
}
