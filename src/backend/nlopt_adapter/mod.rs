//! An [`Optimizer`] backed by the NLopt library.
//!
//! NLopt drives the search: it picks candidate points and calls back into
//! Rust for their scores. The adapter keeps its own record of the best point
//! under the configured direction and reports that, not the point NLopt ends
//! on.
//!
//! # Objective failures
//!
//! NLopt's callback can only return a number, so a failing objective would
//! otherwise go unnoticed while the search wanders on. The
//! [`FailurePolicy`] decides what happens instead:
//!
//! - [`FailurePolicy::Abort`] (the default) ends the search at the first
//!   failure by returning a score beyond the stop value the adapter sets, and
//!   `optimize` returns [`Error::ObjectiveEvaluation`].
//! - [`FailurePolicy::ReportNan`] returns NaN for the failed point and lets
//!   the search continue.
//!
//! # Examples
//!
//! ```
//! # use ndarray::prelude::*;
//! # use optimize::{BoundedParameters, FnObjective, NloptOptimizer, Optimizer, Settings};
//! let settings = Settings::new("example")
//!     .with("direction", "MIN")
//!     .with("algo", "LN_COBYLA")
//!     .with("relativeToleranceX", 1e-8)
//!     .with("relativeToleranceF", 1e-10)
//!     .with("maxEval", 2000i64)
//!     .with("maxTime", -1.0);
//! let mut optimizer = NloptOptimizer::new();
//! optimizer.initialize(&settings).unwrap();
//!
//! let mut objective = FnObjective::new(|x: ArrayView1<f64>| (x[0] - 1.0).powi(2) + x[1].powi(2));
//! let guess = BoundedParameters::new(vec![3.0, -2.0], vec![-5.0, -5.0], vec![5.0, 5.0]).unwrap();
//! let result = optimizer.optimize(&mut objective, &guess).unwrap();
//! println!("{}: {} at {}", result.stop_reason(), result.best_score(), result.best_parameters().values());
//! ```
mod config;
mod run;

pub use self::config::{FailurePolicy, NloptAlgorithm, NloptConfig, NloptConfigBuilder};

use std::time::Instant;

use nlopt::{FailState, Nlopt, SuccessState, Target};
use tracing::{info, warn};

use self::run::{trampoline, Run};
use crate::direction::Direction;
use crate::error::{ConfigError, Error, InvalidInput};
use crate::objective::{Objective, ObjectiveContext};
use crate::optimizer::{OptimizedResult, Optimizer, OptimizerCore, StopReason};
use crate::parameters::BoundedParameters;
use crate::settings::Settings;

/// Where an [`NloptOptimizer`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Configured,
    Running,
    Terminated,
}

/// Drives NLopt's derivative-free algorithms through the [`Optimizer`] interface.
///
/// One search runs at a time: `optimize` borrows the optimizer mutably for
/// its whole duration.
#[derive(Debug)]
pub struct NloptOptimizer {
    core: OptimizerCore,
    config: Option<NloptConfig>,
    state: State,
}

impl Default for NloptOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NloptOptimizer {
    pub fn new() -> Self {
        Self {
            core: OptimizerCore::default(),
            config: None,
            state: State::Uninitialized,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The engine options in effect, if the optimizer is initialized.
    pub fn config(&self) -> Option<&NloptConfig> {
        self.config.as_ref()
    }

    fn load(&mut self, settings: Option<&Settings>) -> Result<NloptConfig, ConfigError> {
        match self.core.load(settings, NloptConfig::from_settings) {
            Ok(config) => {
                self.config = Some(config.clone());
                self.state = State::Configured;
                Ok(config)
            }
            Err(ConfigError::NoSettings) => Err(ConfigError::NoSettings),
            Err(err) => {
                self.config = None;
                self.state = State::Uninitialized;
                Err(err)
            }
        }
    }

    /// Returns the engine options, reloading the stored settings once if the
    /// optimizer was never successfully initialized.
    fn ensure_config(&mut self) -> Result<NloptConfig, Error> {
        if let Some(config) = &self.config {
            return Ok(config.clone());
        }
        warn!("optimizer is not initialized, reloading its configuration");
        self.load(None).map_err(|cause| Error::Uninitialized { cause })
    }

    fn search(
        &self,
        config: &NloptConfig,
        objective: &mut dyn Objective,
        initial_guess: &BoundedParameters,
    ) -> Result<OptimizedResult, Error> {
        let direction = self.core.direction();
        // only the abort sentinel can get past the stop value
        let (target, stop_value) = match direction {
            Direction::Minimize => (Target::Minimize, f64::MIN),
            Direction::Maximize => (Target::Maximize, f64::MAX),
            Direction::Unset => return Err(Error::UnsetDirection),
        };

        let context = ObjectiveContext {
            direction,
            dimension: initial_guess.len(),
        };
        objective
            .initialize(&context)
            .map_err(Error::ObjectiveInitialization)?;

        if config.algorithm.is_global() && !has_finite_bounds(initial_guess) {
            warn!(
                algorithm = %config.algorithm,
                "global algorithm with unbounded dimensions, the engine will likely reject it"
            );
        }

        let started = Instant::now();
        let mut run = Run::new(objective, direction, config.on_objective_failure, initial_guess)?;
        let mut x = initial_guess.values().to_vec();
        info!(
            algorithm = %config.algorithm,
            %direction,
            dimension = x.len(),
            "starting optimization"
        );

        let (code, engine_score) = {
            let mut engine = Nlopt::new(
                config.algorithm.engine(),
                x.len(),
                trampoline,
                target,
                &mut run,
            );
            check("set_lower_bounds", engine.set_lower_bounds(&initial_guess.lower_bounds().to_vec()))?;
            check("set_upper_bounds", engine.set_upper_bounds(&initial_guess.upper_bounds().to_vec()))?;
            check("set_xtol_rel", engine.set_xtol_rel(config.relative_tolerance_x))?;
            check("set_ftol_rel", engine.set_ftol_rel(config.relative_tolerance_f))?;
            check("set_maxeval", engine.set_maxeval(config.engine_max_eval()))?;
            check("set_maxtime", engine.set_maxtime(config.engine_max_time()))?;
            check("set_stopval", engine.set_stopval(stop_value))?;

            match engine.optimize(&mut x) {
                Ok((state, value)) => (state as i32, value),
                Err((state, value)) => (state as i32, value),
            }
        };

        let reason = StopReason::from_code(code);
        info!(
            code,
            %reason,
            engine_score,
            best_score = run.best_score(),
            evaluations = run.evaluations(),
            "optimization completed"
        );
        let outcome = run.finish()?;
        if !reason.is_success() {
            return Err(Error::Terminated { reason });
        }

        Ok(OptimizedResult::new(
            reason,
            outcome.best,
            outcome.best_score,
            outcome.evaluations,
            started.elapsed(),
        ))
    }
}

impl Optimizer for NloptOptimizer {
    fn initialize(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.load(Some(settings)).map(|_| ())
    }

    fn reinitialize(&mut self, settings: Option<&Settings>) -> Result<(), ConfigError> {
        self.load(settings).map(|_| ())
    }

    fn direction(&self) -> Direction {
        self.core.direction()
    }

    fn optimize(
        &mut self,
        objective: &mut dyn Objective,
        initial_guess: &BoundedParameters,
    ) -> Result<OptimizedResult, Error> {
        if initial_guess.is_empty() {
            return Err(InvalidInput::EmptyInitialGuess.into());
        }
        initial_guess.validate()?;
        initial_guess.check_contained()?;
        let config = self.ensure_config()?;

        self.state = State::Running;
        let result = self.search(&config, objective, initial_guess);
        self.state = State::Terminated;
        result
    }
}

/// Maps a rejected engine setting to an error.
fn check(operation: &'static str, result: Result<SuccessState, FailState>) -> Result<(), Error> {
    result.map(|_| ()).map_err(|state| Error::Engine {
        operation,
        reason: StopReason::from_code(state as i32),
    })
}

fn has_finite_bounds(parameters: &BoundedParameters) -> bool {
    parameters
        .lower_bounds()
        .iter()
        .chain(parameters.upper_bounds().iter())
        .all(|bound| bound.is_finite())
}
