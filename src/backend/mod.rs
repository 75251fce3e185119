//! Optimizer backends, selected by configuration.

pub mod nlopt_adapter;

use std::str::FromStr;

use self::nlopt_adapter::NloptOptimizer;
use crate::error::ConfigError;
use crate::optimizer::Optimizer;
use crate::settings::Settings;

/// The implementations behind [`Optimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Nlopt,
}

const BACKEND_NAMES: [(&str, Backend); 1] = [("nlopt", Backend::Nlopt)];

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        BACKEND_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, backend)| *backend)
            .ok_or_else(|| ConfigError::UnknownBackend {
                name: name.to_owned(),
                valid: BACKEND_NAMES
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl Backend {
    /// Reads the optional `optimizer` key, defaulting to NLopt.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.get_str_or("optimizer", "nlopt")?.parse()
    }

    /// An uninitialized optimizer of this kind.
    pub fn create(self) -> Box<dyn Optimizer> {
        match self {
            Backend::Nlopt => Box::new(NloptOptimizer::new()),
        }
    }
}

/// Builds the backend named in `settings` and initializes it from them.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn Optimizer>, ConfigError> {
    let mut optimizer = Backend::from_settings(settings)?.create();
    optimizer.initialize(settings)?;
    Ok(optimizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::prelude::*;

    use crate::direction::Direction;
    use crate::objective::FnObjective;
    use crate::parameters::BoundedParameters;

    fn settings() -> Settings {
        Settings::new("test")
            .with("direction", "MIN")
            .with("algo", "LN_NELDERMEAD")
            .with("relativeToleranceX", 1e-8)
            .with("relativeToleranceF", 1e-10)
            .with("maxEval", 10000i64)
            .with("maxTime", -1i64)
    }

    #[test]
    fn defaults_to_nlopt() {
        assert_eq!(Backend::from_settings(&settings()).unwrap(), Backend::Nlopt);
        let explicit = settings().with("optimizer", "nlopt");
        assert_eq!(Backend::from_settings(&explicit).unwrap(), Backend::Nlopt);
    }

    #[test]
    fn unknown_backend_lists_valid_names() {
        let err = from_settings(&settings().with("optimizer", "ceres"))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnknownBackend { .. }));
        assert!(err.to_string().contains("nlopt"));
    }

    #[test]
    fn configured_optimizer_runs_through_the_trait_object() {
        let mut optimizer = from_settings(&settings()).unwrap();
        assert_eq!(optimizer.direction(), Direction::Minimize);

        let mut objective = FnObjective::new(|x: ArrayView1<f64>| (x[0] + 2.0).powi(2) + 1.0);
        let guess = BoundedParameters::new(vec![3.0], vec![-5.0], vec![5.0]).unwrap();
        let result = optimizer.optimize(&mut objective, &guess).unwrap();

        assert!((result.best_parameters().values()[0] + 2.0).abs() < 1e-3);
        assert!((result.best_score() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn initialization_errors_surface() {
        let err = from_settings(&settings().with("direction", "BOTH")).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownDirection { .. }));
    }
}
