//! Alternating least squares for explicit or implicit ratings.
//!
//! ## Algorithm
//! 1. Index distinct users and items (sorted ids, so runs are reproducible)
//! 2. Initialise both factor matrices with seeded unit-length vectors
//! 3. For each iteration:
//!    a. Solve every item row against the current user factors
//!    b. Solve every user row against the new item factors
//! 4. Wrap the factors in an [`AlsModel`]
//!
//! Rows of a half-sweep are independent and are solved in parallel on the
//! session's pool. The ridge term for a row is `reg_param * n`, where `n`
//! counts that row's ratings (explicit) or positive ratings (implicit).

use crate::error::{EngineError, Result};
use crate::model::AlsModel;
use crate::session::Session;
use crate::solver::{CholeskySolver, LeastSquaresSolver, NnlsSolver, NormalEquation};
use data_loader::{MovieId, Rating, UserId};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// ALS hyperparameters.
///
/// Defaults are the tuned values the recommender ships with.
#[derive(Debug, Clone, PartialEq)]
pub struct AlsParams {
    pub max_iter: usize,
    pub reg_param: f64,
    pub rank: usize,
    pub nonnegative: bool,
    pub implicit_prefs: bool,
    /// Confidence scale for implicit feedback; unused for explicit ratings
    pub alpha: f64,
    pub seed: u64,
}

impl Default for AlsParams {
    fn default() -> Self {
        Self {
            max_iter: 5,
            reg_param: 0.01,
            rank: 10,
            nonnegative: true,
            implicit_prefs: false,
            alpha: 1.0,
            seed: 42,
        }
    }
}

impl AlsParams {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_reg_param(mut self, reg_param: f64) -> Self {
        self.reg_param = reg_param;
        self
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_nonnegative(mut self, nonnegative: bool) -> Self {
        self.nonnegative = nonnegative;
        self
    }

    pub fn with_implicit_prefs(mut self, implicit_prefs: bool) -> Self {
        self.implicit_prefs = implicit_prefs;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rank == 0 {
            return Err(EngineError::InvalidParam {
                name: "rank",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_iter == 0 {
            return Err(EngineError::InvalidParam {
                name: "max_iter",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.reg_param.is_finite() || self.reg_param < 0.0 {
            return Err(EngineError::InvalidParam {
                name: "reg_param",
                reason: format!("must be a non-negative number, got {}", self.reg_param),
            });
        }
        if self.implicit_prefs && (!self.alpha.is_finite() || self.alpha <= 0.0) {
            return Err(EngineError::InvalidParam {
                name: "alpha",
                reason: format!("must be positive, got {}", self.alpha),
            });
        }
        Ok(())
    }
}

/// The ALS estimator
#[derive(Debug, Clone, Default)]
pub struct Als {
    params: AlsParams,
}

/// Ratings of one row against column indices of the other side
type Block = Vec<(usize, f32)>;

impl Als {
    pub fn new(params: AlsParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AlsParams {
        &self.params
    }

    /// Fit a model on `ratings`.
    #[instrument(
        skip(self, session, ratings),
        fields(rows = ratings.len(), rank = self.params.rank)
    )]
    pub fn fit(&self, session: &Session, ratings: &[Rating]) -> Result<AlsModel> {
        self.params.validate()?;
        if ratings.is_empty() {
            return Err(EngineError::EmptyDataset { operation: "fit ALS" });
        }

        let start = Instant::now();
        let user_ids: Vec<UserId> = ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_ids: Vec<MovieId> = ratings
            .iter()
            .map(|r| r.movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let user_index = position_index(&user_ids);
        let item_index = position_index(&item_ids);

        let mut user_blocks: Vec<Block> = vec![Vec::new(); user_ids.len()];
        let mut item_blocks: Vec<Block> = vec![Vec::new(); item_ids.len()];
        for r in ratings {
            let u = user_index[&r.user_id];
            let i = item_index[&r.movie_id];
            user_blocks[u].push((i, r.rating as f32));
            item_blocks[i].push((u, r.rating as f32));
        }

        info!(
            "Fitting ALS on {} ratings ({} users, {} items), rank {}, {} iterations",
            ratings.len(),
            user_ids.len(),
            item_ids.len(),
            self.params.rank,
            self.params.max_iter
        );

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut user_factors = init_factors(user_ids.len(), self.params.rank, &mut rng);
        let mut item_factors = init_factors(item_ids.len(), self.params.rank, &mut rng);

        let solver: Box<dyn LeastSquaresSolver> = if self.params.nonnegative {
            Box::new(NnlsSolver::default())
        } else {
            Box::new(CholeskySolver)
        };
        debug!("Using {} solver", solver.name());

        session.run(|| -> Result<()> {
            for iteration in 1..=self.params.max_iter {
                item_factors = self.solve_side(&item_blocks, &user_factors, solver.as_ref())?;
                user_factors = self.solve_side(&user_blocks, &item_factors, solver.as_ref())?;
                debug!("ALS iteration {}/{} complete", iteration, self.params.max_iter);
            }
            Ok(())
        })?;

        info!("Fitted ALS model in {:.2?}", start.elapsed());

        Ok(AlsModel::new(
            self.params.rank,
            user_ids,
            item_ids,
            user_factors,
            item_factors,
        ))
    }

    /// Solve every row in `blocks` against the fixed `other` factors
    fn solve_side(
        &self,
        blocks: &[Block],
        other: &Array2<f32>,
        solver: &dyn LeastSquaresSolver,
    ) -> Result<Array2<f32>> {
        let rank = self.params.rank;
        let gram = if self.params.implicit_prefs {
            Some(gramian(other))
        } else {
            None
        };

        let rows: Vec<Array1<f32>> = blocks
            .par_iter()
            .map(|block| {
                let mut ne = NormalEquation::new(rank);
                let mut observed = 0usize;
                for &(col, rating) in block {
                    let factor = other.row(col);
                    let rating = rating as f64;
                    if self.params.implicit_prefs {
                        let c1 = self.params.alpha * rating.abs();
                        if rating > 0.0 {
                            observed += 1;
                        }
                        let preference = if rating > 0.0 { 1.0 + c1 } else { 0.0 };
                        ne.add(factor, preference, c1);
                    } else {
                        observed += 1;
                        ne.add(factor, rating, 1.0);
                    }
                }
                if let Some(gram) = &gram {
                    ne.merge_gram(gram);
                }
                solver.solve(&ne, self.params.reg_param * observed as f64)
            })
            .collect::<Result<_>>()?;

        let mut factors = Array2::<f32>::zeros((blocks.len(), rank));
        for (mut target, row) in factors.axis_iter_mut(Axis(0)).zip(rows) {
            target.assign(&row);
        }
        Ok(factors)
    }
}

fn position_index<K: Copy + std::hash::Hash + Eq>(ids: &[K]) -> HashMap<K, usize> {
    ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect()
}

/// Uniform non-negative vectors scaled to unit length
fn init_factors(rows: usize, rank: usize, rng: &mut StdRng) -> Array2<f32> {
    let mut factors = Array2::<f32>::zeros((rows, rank));
    for mut row in factors.axis_iter_mut(Axis(0)) {
        row.mapv_inplace(|_| rng.random::<f32>());
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        } else {
            row.fill(1.0 / (rank as f32).sqrt());
        }
    }
    factors
}

/// `YᵀY` in f64
fn gramian(factors: &Array2<f32>) -> Array2<f64> {
    let y = factors.mapv(|v| v as f64);
    y.t().dot(&y)
}
