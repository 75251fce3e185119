use std::fmt;
use std::str::FromStr;

use derive_builder::Builder;
use nlopt::Algorithm;

use crate::error::ConfigError;
use crate::settings::Settings;

/// Derivative-free NLopt algorithms, named as NLopt names them.
///
/// Gradient-based algorithms are not offered: the objective callback never
/// fills the gradient buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NloptAlgorithm {
    Cobyla,
    Bobyqa,
    Newuoa,
    NewuoaBound,
    NelderMead,
    Subplex,
    Praxis,
    Direct,
    DirectL,
    DirectLRand,
    DirectNoScal,
    DirectLNoScal,
    DirectLRandNoScal,
    OrigDirect,
    OrigDirectL,
    Crs2Lm,
    Isres,
    Esch,
    Ags,
}

const ALGORITHM_NAMES: [(&str, NloptAlgorithm); 19] = [
    ("LN_COBYLA", NloptAlgorithm::Cobyla),
    ("LN_BOBYQA", NloptAlgorithm::Bobyqa),
    ("LN_NEWUOA", NloptAlgorithm::Newuoa),
    ("LN_NEWUOA_BOUND", NloptAlgorithm::NewuoaBound),
    ("LN_NELDERMEAD", NloptAlgorithm::NelderMead),
    ("LN_SBPLX", NloptAlgorithm::Subplex),
    ("LN_PRAXIS", NloptAlgorithm::Praxis),
    ("GN_DIRECT", NloptAlgorithm::Direct),
    ("GN_DIRECT_L", NloptAlgorithm::DirectL),
    ("GN_DIRECT_L_RAND", NloptAlgorithm::DirectLRand),
    ("GN_DIRECT_NOSCAL", NloptAlgorithm::DirectNoScal),
    ("GN_DIRECT_L_NOSCAL", NloptAlgorithm::DirectLNoScal),
    ("GN_DIRECT_L_RAND_NOSCAL", NloptAlgorithm::DirectLRandNoScal),
    ("GN_ORIG_DIRECT", NloptAlgorithm::OrigDirect),
    ("GN_ORIG_DIRECT_L", NloptAlgorithm::OrigDirectL),
    ("GN_CRS2_LM", NloptAlgorithm::Crs2Lm),
    ("GN_ISRES", NloptAlgorithm::Isres),
    ("GN_ESCH", NloptAlgorithm::Esch),
    ("GN_AGS", NloptAlgorithm::Ags),
];

impl NloptAlgorithm {
    pub fn name(self) -> &'static str {
        ALGORITHM_NAMES
            .iter()
            .find(|(_, algorithm)| *algorithm == self)
            .map(|(name, _)| *name)
            .unwrap_or("UNKNOWN")
    }

    /// Global algorithms need finite bounds on every dimension.
    pub fn is_global(self) -> bool {
        self.name().starts_with("GN_")
    }

    pub(crate) fn engine(self) -> Algorithm {
        match self {
            NloptAlgorithm::Cobyla => Algorithm::Cobyla,
            NloptAlgorithm::Bobyqa => Algorithm::Bobyqa,
            NloptAlgorithm::Newuoa => Algorithm::Newuoa,
            NloptAlgorithm::NewuoaBound => Algorithm::NewuoaBound,
            NloptAlgorithm::NelderMead => Algorithm::Neldermead,
            NloptAlgorithm::Subplex => Algorithm::Sbplx,
            NloptAlgorithm::Praxis => Algorithm::Praxis,
            NloptAlgorithm::Direct => Algorithm::Direct,
            NloptAlgorithm::DirectL => Algorithm::DirectL,
            NloptAlgorithm::DirectLRand => Algorithm::DirectLRand,
            NloptAlgorithm::DirectNoScal => Algorithm::DirectNoscal,
            NloptAlgorithm::DirectLNoScal => Algorithm::DirectLNoscal,
            NloptAlgorithm::DirectLRandNoScal => Algorithm::DirectLRandNoscal,
            NloptAlgorithm::OrigDirect => Algorithm::OrigDirect,
            NloptAlgorithm::OrigDirectL => Algorithm::OrigDirectL,
            NloptAlgorithm::Crs2Lm => Algorithm::Crs2Lm,
            NloptAlgorithm::Isres => Algorithm::Isres,
            NloptAlgorithm::Esch => Algorithm::Esch,
            NloptAlgorithm::Ags => Algorithm::Ags,
        }
    }
}

impl FromStr for NloptAlgorithm {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ALGORITHM_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, algorithm)| *algorithm)
            .ok_or_else(|| ConfigError::UnknownAlgorithm {
                name: name.to_owned(),
                valid: join_names(ALGORITHM_NAMES.iter().map(|(name, _)| *name)),
            })
    }
}

impl fmt::Display for NloptAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the adapter does when the objective fails during a search.
///
/// NLopt cannot see Rust errors: the callback must return a number. Both
/// policies make the failure visible; they differ in whether the search goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the search at the first failure and fail the run.
    Abort,
    /// Report NaN to the engine and keep searching. The run fails only if
    /// no evaluation succeeded.
    ReportNan,
}

const POLICY_NAMES: [(&str, FailurePolicy); 2] =
    [("ABORT", FailurePolicy::Abort), ("NAN", FailurePolicy::ReportNan)];

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        POLICY_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, policy)| *policy)
            .ok_or_else(|| ConfigError::UnknownFailurePolicy {
                name: name.to_owned(),
                valid: join_names(POLICY_NAMES.iter().map(|(name, _)| *name)),
            })
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Engine options for [`NloptOptimizer`](super::NloptOptimizer).
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct NloptConfig {
    /// The NLopt algorithm to run.
    #[builder(default = "NloptAlgorithm::Cobyla")]
    pub algorithm: NloptAlgorithm,

    /// Relative tolerance on the parameters between steps. Zero disables it.
    #[builder(default = "1e-4")]
    pub relative_tolerance_x: f64,

    /// Relative tolerance on the objective value between steps. Zero disables it.
    #[builder(default = "1e-4")]
    pub relative_tolerance_f: f64,

    /// Evaluation budget. Negative means no limit.
    #[builder(default = "-1")]
    pub max_eval: i64,

    /// Wall-clock budget in seconds. Negative means no limit.
    #[builder(default = "-1.0")]
    pub max_time: f64,

    #[builder(default = "FailurePolicy::Abort")]
    pub on_objective_failure: FailurePolicy,
}

impl NloptConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let tolerances = [
            ("relative_tolerance_x", self.relative_tolerance_x),
            ("relative_tolerance_f", self.relative_tolerance_f),
        ];
        for (name, tolerance) in tolerances {
            if let Some(tolerance) = tolerance {
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(format!("{name} must be finite and non-negative, got {tolerance}"));
                }
            }
        }
        if let Some(max_time) = self.max_time {
            if max_time.is_nan() {
                return Err("max_time must not be NaN".to_owned());
            }
        }
        Ok(())
    }
}

impl NloptConfig {
    /// Reads `algo`, `relativeToleranceX`, `relativeToleranceF`, `maxEval`,
    /// `maxTime` and the optional `onObjectiveFailure` key.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        NloptConfigBuilder::default()
            .algorithm(settings.get_str("algo")?.parse()?)
            .relative_tolerance_x(settings.get_f64("relativeToleranceX")?)
            .relative_tolerance_f(settings.get_f64("relativeToleranceF")?)
            .max_eval(settings.get_i64("maxEval")?)
            .max_time(settings.get_f64("maxTime")?)
            .on_objective_failure(settings.get_str_or("onObjectiveFailure", "ABORT")?.parse()?)
            .build()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// The evaluation limit handed to the engine.
    pub(crate) fn engine_max_eval(&self) -> u32 {
        if self.max_eval < 0 {
            i32::MAX as u32
        } else {
            self.max_eval.min(i64::from(i32::MAX)) as u32
        }
    }

    /// The time limit handed to the engine.
    pub(crate) fn engine_max_time(&self) -> f64 {
        if self.max_time < 0.0 {
            f64::INFINITY
        } else {
            self.max_time
        }
    }
}

impl Default for NloptConfig {
    fn default() -> Self {
        // every field has a valid default
        NloptConfigBuilder::default()
            .build()
            .unwrap_or_else(|err| unreachable!("default config is valid: {err}"))
    }
}
