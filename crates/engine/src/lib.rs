//! # Engine Crate
//!
//! Matrix-factorization engine behind the recommender: an execution
//! session, the ALS estimator, the fitted model and a regression evaluator.
//!
//! Callers only ever see the estimator/model surface; how factors are
//! solved stays inside this crate.
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::{Als, AlsParams, Session};
//!
//! let session = Session::builder().app_name("ALSMovieRec").build()?;
//! let model = Als::new(AlsParams::default()).fit(&session, ratings.rows())?;
//! let top = model.recommend_for_user_subset(&session, &[1], 10);
//! ```

pub mod error;
pub mod session;
pub mod solver;
pub mod als;
pub mod model;
pub mod evaluator;

pub use als::{Als, AlsParams};
pub use error::{EngineError, Result};
pub use evaluator::{Metric, RegressionEvaluator};
pub use model::{AlsModel, Prediction, Predictions, Recommendation, UserRecommendations};
pub use session::{Session, SessionBuilder};
