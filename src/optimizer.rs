//! This module provides the base framework for all optimizers in this crate: the trait every
//! backend implements, the lifecycle state they share, and the result record they return.
use std::fmt;
use std::time::Duration;

use crate::direction::Direction;
use crate::error::{ConfigError, Error};
use crate::objective::Objective;
use crate::parameters::BoundedParameters;
use crate::settings::Settings;

/// Why a search terminated, classified from the engine's numeric result code.
///
/// Positive codes are successful terminations, anything else is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Success,
    StopvalReached,
    FtolReached,
    XtolReached,
    MaxevalReached,
    MaxtimeReached,
    Other(i32),
}

impl StopReason {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => StopReason::Success,
            2 => StopReason::StopvalReached,
            3 => StopReason::FtolReached,
            4 => StopReason::XtolReached,
            5 => StopReason::MaxevalReached,
            6 => StopReason::MaxtimeReached,
            other => StopReason::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            StopReason::Success => 1,
            StopReason::StopvalReached => 2,
            StopReason::FtolReached => 3,
            StopReason::XtolReached => 4,
            StopReason::MaxevalReached => 5,
            StopReason::MaxtimeReached => 6,
            StopReason::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self.code() > 0
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StopReason::Success => f.write_str("SUCCESS"),
            StopReason::StopvalReached => f.write_str("STOPVAL_REACHED"),
            StopReason::FtolReached => f.write_str("FTOL_REACHED"),
            StopReason::XtolReached => f.write_str("XTOL_REACHED"),
            StopReason::MaxevalReached => f.write_str("MAXEVAL_REACHED"),
            StopReason::MaxtimeReached => f.write_str("MAXTIME_REACHED"),
            StopReason::Other(code) => write!(f, "OTHER ({code})"),
        }
    }
}

/// The outcome of a successful run: the best point seen under the
/// optimizer's direction, and how the run ended.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedResult {
    stop_reason: StopReason,
    best_parameters: BoundedParameters,
    best_score: f64,
    evaluations: usize,
    elapsed: Duration,
}

impl OptimizedResult {
    pub fn new(
        stop_reason: StopReason,
        best_parameters: BoundedParameters,
        best_score: f64,
        evaluations: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            stop_reason,
            best_parameters,
            best_score,
            evaluations,
            elapsed,
        }
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    pub fn best_parameters(&self) -> &BoundedParameters {
        &self.best_parameters
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    /// The number of objective evaluations performed.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Wall-clock duration of the run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// A general optimizer: configured from [`Settings`], then run against an
/// [`Objective`] starting from a bounded initial guess.
pub trait Optimizer {
    /// Stores `settings` and resolves the direction and backend options from them.
    fn initialize(&mut self, settings: &Settings) -> Result<(), ConfigError>;

    /// Re-resolves the configuration. With `None`, the settings from the last
    /// call are read again, from their file if they were loaded from one. Safe to call any number of times, including
    /// before [`initialize`](Self::initialize).
    fn reinitialize(&mut self, settings: Option<&Settings>) -> Result<(), ConfigError>;

    fn direction(&self) -> Direction;

    /// Searches for the best point within the bounds of `initial_guess`.
    fn optimize(
        &mut self,
        objective: &mut dyn Objective,
        initial_guess: &BoundedParameters,
    ) -> Result<OptimizedResult, Error>;
}

/// Lifecycle state shared by every optimizer: the settings it was last
/// given and the direction resolved from them.
#[derive(Debug, Clone, Default)]
pub struct OptimizerCore {
    settings: Option<Settings>,
    direction: Direction,
}

impl OptimizerCore {
    /// Resolves `direction` and then the backend-specific options read by
    /// `backend`. The direction is committed only if both succeed; on
    /// failure it is reset to [`Direction::Unset`].
    ///
    /// `Some(settings)` replaces the stored settings. `None` reloads the
    /// stored ones from their file, if they came from one.
    pub fn load<T>(
        &mut self,
        settings: Option<&Settings>,
        backend: impl FnOnce(&Settings) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        match settings {
            Some(settings) => self.settings = Some(settings.clone()),
            None => {
                let stored = self.settings.as_ref().ok_or(ConfigError::NoSettings)?;
                match stored.reload() {
                    Ok(fresh) => self.settings = Some(fresh),
                    Err(err) => {
                        self.direction = Direction::Unset;
                        return Err(err);
                    }
                }
            }
        }
        let stored = self.settings.as_ref().ok_or(ConfigError::NoSettings)?;

        let loaded = stored
            .get_str("direction")
            .and_then(str::parse::<Direction>)
            .and_then(|direction| backend(stored).map(|options| (direction, options)));

        match loaded {
            Ok((direction, options)) => {
                self.direction = direction;
                Ok(options)
            }
            Err(err) => {
                self.direction = Direction::Unset;
                Err(err)
            }
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::fs;
    use std::process;

    #[test]
    fn stop_reason_names() {
        assert_eq!(StopReason::from_code(1).to_string(), "SUCCESS");
        assert_eq!(StopReason::from_code(2).to_string(), "STOPVAL_REACHED");
        assert_eq!(StopReason::from_code(3).to_string(), "FTOL_REACHED");
        assert_eq!(StopReason::from_code(4).to_string(), "XTOL_REACHED");
        assert_eq!(StopReason::from_code(5).to_string(), "MAXEVAL_REACHED");
        assert_eq!(StopReason::from_code(6).to_string(), "MAXTIME_REACHED");
        assert_eq!(StopReason::from_code(-4).to_string(), "OTHER (-4)");
        assert_eq!(StopReason::from_code(42), StopReason::Other(42));
    }

    #[test]
    fn non_positive_codes_are_failures() {
        assert!(StopReason::FtolReached.is_success());
        assert!(!StopReason::from_code(0).is_success());
        assert!(!StopReason::from_code(-5).is_success());
        assert_eq!(StopReason::from_code(-5).code(), -5);
    }

    #[test]
    fn load_resolves_direction() {
        let mut core = OptimizerCore::default();
        let settings = Settings::new("test").with("direction", "MAX");

        let options = core.load(Some(&settings), |_| Ok(7)).unwrap();

        assert_eq!(options, 7);
        assert_eq!(core.direction(), Direction::Maximize);
        assert_eq!(core.settings(), Some(&settings));
    }

    #[test]
    fn load_without_settings_leaves_state_alone() {
        let mut core = OptimizerCore::default();
        let err = core.load(None, |_| Ok(())).unwrap_err();
        assert!(matches!(err, ConfigError::NoSettings));
        assert_eq!(core.direction(), Direction::Unset);
        assert!(core.settings().is_none());
    }

    #[test]
    fn failed_backend_options_unset_the_direction() {
        let mut core = OptimizerCore::default();
        let settings = Settings::new("test").with("direction", "MIN");
        core.load(Some(&settings), |_| Ok(())).unwrap();
        assert_eq!(core.direction(), Direction::Minimize);

        let err = core
            .load(None, |s| s.get_str("algo").map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
        assert_eq!(core.direction(), Direction::Unset);
    }

    #[test]
    fn load_without_settings_rereads_the_file() {
        let path = env::temp_dir().join(format!("optimize-core-{}.toml", process::id()));
        fs::write(&path, "direction = \"MIN\"\n").unwrap();
        let mut core = OptimizerCore::default();
        core.load(Some(&Settings::load(&path).unwrap()), |_| Ok(())).unwrap();
        assert_eq!(core.direction(), Direction::Minimize);

        fs::write(&path, "direction = \"MAX\"\n").unwrap();
        let reloaded = core.load(None, |_| Ok(()));
        fs::remove_file(&path).unwrap();

        reloaded.unwrap();
        assert_eq!(core.direction(), Direction::Maximize);
    }

    #[test]
    fn unreadable_file_on_reload_unsets_the_direction() {
        let path = env::temp_dir().join(format!("optimize-core-gone-{}.toml", process::id()));
        fs::write(&path, "direction = \"MIN\"\n").unwrap();
        let mut core = OptimizerCore::default();
        core.load(Some(&Settings::load(&path).unwrap()), |_| Ok(())).unwrap();
        fs::remove_file(&path).unwrap();

        let err = core.load(None, |_| Ok(())).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(core.direction(), Direction::Unset);
    }

    #[test]
    fn unknown_direction_fails() {
        let mut core = OptimizerCore::default();
        let settings = Settings::new("test").with("direction", "SIDEWAYS");
        let err = core.load(Some(&settings), |_| Ok(())).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDirection { .. }));
    }
}
