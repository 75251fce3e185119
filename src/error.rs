//! Error types shared by every optimizer in this crate.
use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::optimizer::StopReason;

/// Boxed error returned by user code such as objectives.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Problems found while reading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing key `{key}` in configuration `{origin}`")]
    MissingKey { key: String, origin: String },

    #[error("key `{key}` in configuration `{origin}` must be {expected}")]
    WrongType {
        key: String,
        origin: String,
        expected: &'static str,
    },

    #[error("unknown direction `{name}`, expected one of: {valid}")]
    UnknownDirection { name: String, valid: String },

    #[error("unknown algorithm `{name}`, expected one of: {valid}")]
    UnknownAlgorithm { name: String, valid: String },

    #[error("unknown objective failure policy `{name}`, expected one of: {valid}")]
    UnknownFailurePolicy { name: String, valid: String },

    #[error("unknown optimizer backend `{name}`, expected one of: {valid}")]
    UnknownBackend { name: String, valid: String },

    #[error("invalid optimizer settings: {0}")]
    Invalid(String),

    #[error("no configuration has been supplied")]
    NoSettings,

    #[error("cannot read configuration file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse configuration `{origin}`")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Malformed parameter vectors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("initial guess is empty")]
    EmptyInitialGuess,

    #[error("bounds do not match the values: {values} values, {lower} lower bounds, {upper} upper bounds")]
    BoundsLength {
        values: usize,
        lower: usize,
        upper: usize,
    },

    #[error("lower bound {lower} exceeds upper bound {upper} at index {index}")]
    InvertedBounds { index: usize, lower: f64, upper: f64 },

    #[error("value {value} at index {index} lies outside its bounds [{lower}, {upper}]")]
    OutOfBounds {
        index: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("expected {expected} values, got {found}")]
    Dimension { expected: usize, found: usize },
}

/// Why a single objective evaluation did not produce a usable score.
#[derive(Debug, Error)]
pub enum ObjectiveFailure {
    #[error("objective returned an error")]
    Returned(#[source] BoxError),

    #[error("objective returned NaN")]
    NanScore,

    #[error("objective panicked: {0}")]
    Panicked(String),
}

/// Errors surfaced by [`Optimizer`](crate::Optimizer) implementations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("optimizer is not initialized, even after reloading its configuration")]
    Uninitialized {
        #[source]
        cause: ConfigError,
    },

    #[error("optimizer direction is unset")]
    UnsetDirection,

    #[error("objective initialization failed")]
    ObjectiveInitialization(#[source] BoxError),

    #[error("objective evaluation #{evaluation} failed")]
    ObjectiveEvaluation {
        evaluation: usize,
        #[source]
        source: ObjectiveFailure,
    },

    #[error("optimization failed, stop reason: {reason}")]
    Terminated { reason: StopReason },

    #[error("external engine failed: {operation} returned {reason}")]
    Engine {
        operation: &'static str,
        reason: StopReason,
    },
}
