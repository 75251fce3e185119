//! Direction-aware numerical optimization over bounded parameter vectors.
//!
//! An [`Optimizer`] is configured from [`Settings`] (the search
//! [`Direction`] plus backend options) and then searches for the best
//! [`BoundedParameters`] for a caller-supplied [`Objective`], returning an
//! [`OptimizedResult`]. The one backend, [`NloptOptimizer`], drives NLopt's
//! derivative-free algorithms.
//!
//! ```
//! # use ndarray::prelude::*;
//! # use optimize::{BoundedParameters, FnObjective, Settings};
//! let settings = Settings::from_toml(
//!     "inline",
//!     r#"
//!     direction = "MAX"
//!     algo = "LN_SBPLX"
//!     relativeToleranceX = 1e-8
//!     relativeToleranceF = 1e-10
//!     maxEval = -1
//!     maxTime = -1
//!     "#,
//! )
//! .unwrap();
//! let mut optimizer = optimize::from_settings(&settings).unwrap();
//!
//! let mut peak = FnObjective::new(|x: ArrayView1<f64>| -(x[0] - 3.0).powi(2) - (x[1] + 1.0).powi(2));
//! let guess = BoundedParameters::new(vec![0.0, 0.0], vec![-10.0; 2], vec![10.0; 2]).unwrap();
//! let result = optimizer.optimize(&mut peak, &guess).unwrap();
//! assert!((result.best_parameters().values()[0] - 3.0).abs() < 1e-3);
//! ```

pub mod backend;
mod direction;
mod error;
mod objective;
mod optimizer;
mod parameters;
mod settings;

pub use backend::nlopt_adapter::{
    FailurePolicy, NloptAlgorithm, NloptConfig, NloptConfigBuilder, NloptOptimizer, State,
};
pub use backend::{from_settings, Backend};
pub use direction::{Direction, DIRECTION_NAMES};
pub use error::{BoxError, ConfigError, Error, InvalidInput, ObjectiveFailure};
pub use objective::{FnObjective, Objective, ObjectiveContext};
pub use optimizer::{OptimizedResult, Optimizer, OptimizerCore, StopReason};
pub use parameters::BoundedParameters;
pub use settings::Settings;
