//! Least-squares solvers for a single factor row.
//!
//! Each ALS half-sweep reduces to one small `rank x rank` system per user
//! (or item):
//!
//! ```text
//! (AᵀA + λI) x = Aᵀb
//! ```
//!
//! `NormalEquation` accumulates `AᵀA` and `Aᵀb` one observation at a time;
//! a [`LeastSquaresSolver`] adds the ridge term and solves. Accumulation is
//! in f64 even though factors are stored as f32.

use crate::error::{EngineError, Result};
use faer::linalg::solvers::Solve;
use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView1};

/// Accumulated normal equations for one factor row
#[derive(Debug, Clone)]
pub struct NormalEquation {
    pub ata: Array2<f64>,
    pub atb: Array1<f64>,
}

impl NormalEquation {
    pub fn new(rank: usize) -> Self {
        Self {
            ata: Array2::zeros((rank, rank)),
            atb: Array1::zeros(rank),
        }
    }

    pub fn rank(&self) -> usize {
        self.atb.len()
    }

    /// Add one observation: `ata += c * a aᵀ`, `atb += b * a`
    pub fn add(&mut self, a: ArrayView1<f32>, b: f64, c: f64) {
        let k = self.rank();
        for i in 0..k {
            let ai = a[i] as f64;
            self.atb[i] += b * ai;
            if ai == 0.0 || c == 0.0 {
                continue;
            }
            let cai = c * ai;
            for j in 0..k {
                self.ata[[i, j]] += cai * a[j] as f64;
            }
        }
    }

    /// Add another system's `AᵀA` (used for the implicit-feedback YᵀY term)
    pub fn merge_gram(&mut self, gram: &Array2<f64>) {
        self.ata += gram;
    }

    /// `AᵀA + λI`
    fn regularized(&self, lambda: f64) -> Array2<f64> {
        let mut a = self.ata.clone();
        for i in 0..self.rank() {
            a[[i, i]] += lambda;
        }
        a
    }
}

/// Solves a regularised normal-equation system for one factor row
pub trait LeastSquaresSolver: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, ne: &NormalEquation, lambda: f64) -> Result<Array1<f32>>;
}

/// Unconstrained solve by Cholesky (LLᵀ) decomposition
#[derive(Debug, Clone, Copy, Default)]
pub struct CholeskySolver;

impl LeastSquaresSolver for CholeskySolver {
    fn name(&self) -> &str {
        "cholesky"
    }

    fn solve(&self, ne: &NormalEquation, lambda: f64) -> Result<Array1<f32>> {
        let k = ne.rank();
        let a = ne.regularized(lambda);
        let singular = || EngineError::Singular { rank: k, lambda };

        let a_mat = Mat::<f64>::from_fn(k, k, |i, j| a[[i, j]]);
        let b_mat = Mat::<f64>::from_fn(k, 1, |i, _| ne.atb[i]);

        let llt = a_mat.as_ref().llt(Side::Lower).map_err(|_| singular())?;
        let x = llt.solve(b_mat.as_ref());

        let solution = Array1::from_shape_fn(k, |i| x[(i, 0)]);
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(singular());
        }
        Ok(solution.mapv(|v| v as f32))
    }
}

/// Non-negative solve by projected coordinate descent.
///
/// Minimises `½ xᵀ(AᵀA + λI)x - (Aᵀb)ᵀx` subject to `x ≥ 0`. Each coordinate
/// update is exact for that coordinate and then clamped at zero, which
/// converges for a positive definite system.
#[derive(Debug, Clone, Copy)]
pub struct NnlsSolver {
    max_sweeps: usize,
    tolerance: f64,
}

impl NnlsSolver {
    pub fn new(max_sweeps: usize, tolerance: f64) -> Self {
        Self {
            max_sweeps,
            tolerance,
        }
    }
}

impl Default for NnlsSolver {
    fn default() -> Self {
        Self::new(500, 1e-9)
    }
}

impl LeastSquaresSolver for NnlsSolver {
    fn name(&self) -> &str {
        "nnls"
    }

    fn solve(&self, ne: &NormalEquation, lambda: f64) -> Result<Array1<f32>> {
        let k = ne.rank();
        let a = ne.regularized(lambda);
        let b = &ne.atb;
        let mut x = Array1::<f64>::zeros(k);

        for _ in 0..self.max_sweeps {
            let mut max_step: f64 = 0.0;
            let mut max_value: f64 = 0.0;

            for i in 0..k {
                let diag = a[[i, i]];
                if diag <= 0.0 {
                    // Column never observed and no ridge: the coordinate stays at zero
                    x[i] = 0.0;
                    continue;
                }
                let mut residual = b[i];
                for j in 0..k {
                    if j != i {
                        residual -= a[[i, j]] * x[j];
                    }
                }
                let updated = (residual / diag).max(0.0);
                max_step = max_step.max((updated - x[i]).abs());
                max_value = max_value.max(updated.abs());
                x[i] = updated;
            }

            if max_step <= self.tolerance * (1.0 + max_value) {
                break;
            }
        }

        Ok(x.mapv(|v| v as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn system(rows: &[[f32; 2]], targets: &[f64]) -> NormalEquation {
        let mut ne = NormalEquation::new(2);
        for (row, &t) in rows.iter().zip(targets) {
            ne.add(ArrayView1::from(&row[..]), t, 1.0);
        }
        ne
    }

    #[test]
    fn test_accumulates_gram_and_rhs() {
        let ne = system(&[[1.0, 2.0], [3.0, 4.0]], &[1.0, 2.0]);
        assert_eq!(ne.ata, array![[10.0, 14.0], [14.0, 20.0]]);
        assert_eq!(ne.atb, array![7.0, 10.0]);
    }

    #[test]
    fn test_cholesky_recovers_exact_solution() {
        // x = [1, 2]: targets are row · x
        let ne = system(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]], &[1.0, 2.0, 3.0]);
        let x = CholeskySolver.solve(&ne, 0.0).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-5);
        assert!((x[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_cholesky_handles_mixed_sign_solution() {
        // x = [1, -2, 3]
        let mut ne = NormalEquation::new(3);
        let rows: [[f32; 3]; 4] = [
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ];
        for (row, t) in rows.iter().zip([1.0, -2.0, 3.0, 2.0]) {
            ne.add(ArrayView1::from(&row[..]), t, 1.0);
        }
        let x = CholeskySolver.solve(&ne, 0.0).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-5);
        assert!((x[1] + 2.0).abs() < 1e-5);
        assert!((x[2] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_cholesky_rejects_singular_system() {
        let ne = NormalEquation::new(3);
        assert!(matches!(
            CholeskySolver.solve(&ne, 0.0),
            Err(EngineError::Singular { rank: 3, .. })
        ));
    }

    #[test]
    fn test_ridge_shrinks_solution() {
        let ne = system(&[[1.0, 0.0], [0.0, 1.0]], &[2.0, 2.0]);
        let plain = CholeskySolver.solve(&ne, 0.0).unwrap();
        let ridged = CholeskySolver.solve(&ne, 1.0).unwrap();
        assert!(ridged[0] < plain[0]);
        assert!((ridged[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_nnls_matches_cholesky_when_unconstrained_optimum_is_positive() {
        let ne = system(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]], &[1.0, 2.0, 3.0]);
        let x = NnlsSolver::default().solve(&ne, 0.01).unwrap();
        let y = CholeskySolver.solve(&ne, 0.01).unwrap();
        assert!((x[0] - y[0]).abs() < 1e-4);
        assert!((x[1] - y[1]).abs() < 1e-4);
    }

    #[test]
    fn test_nnls_clamps_negative_coordinates() {
        // Unconstrained optimum is x = [2, -1]
        let ne = system(&[[1.0, 0.0], [0.0, 1.0]], &[2.0, -1.0]);
        let x = NnlsSolver::default().solve(&ne, 0.0).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-5);
        assert_eq!(x[1], 0.0);
    }
}
