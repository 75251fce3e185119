//! Key-value configuration consumed by the optimizers.
//!
//! A [`Settings`] value is a flat table of keys plus an origin string that
//! identifies where the table came from (a file path, or any label the caller
//! picks). Optimizers only ever read from it through the typed getters, which
//! report the offending key and the origin on failure.
//!
//! Settings read from a file remember its path, so [`Settings::reload`] can
//! pick up edits made after a failed initialization.
//!
//! ```
//! # use optimize::Settings;
//! let settings = Settings::new("inline")
//!     .with("direction", "MIN")
//!     .with("maxEval", 500i64);
//! assert_eq!(settings.get_str("direction").unwrap(), "MIN");
//! assert_eq!(settings.get_i64("maxEval").unwrap(), 500);
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    origin: String,
    source: Option<PathBuf>,
    table: Table,
}

impl Settings {
    /// An empty table labelled with `origin`.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            source: None,
            table: Table::new(),
        }
    }

    /// Parses a TOML document. Only top-level keys are looked up.
    pub fn from_toml(origin: impl Into<String>, text: &str) -> Result<Self, ConfigError> {
        let origin = origin.into();
        match text.parse::<Table>() {
            Ok(table) => Ok(Self {
                origin,
                source: None,
                table,
            }),
            Err(source) => Err(ConfigError::Parse { origin, source }),
        }
    }

    /// Reads and parses a TOML file; the path becomes the origin.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml(path.display().to_string(), &text)?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Reads the file these settings were loaded from again. In-memory
    /// settings have nothing to re-read and come back unchanged, and so do
    /// keys set on loaded settings after the fact: the file wins.
    pub fn reload(&self) -> Result<Self, ConfigError> {
        match &self.source {
            Some(path) => Self::load(path),
            None => Ok(self.clone()),
        }
    }

    /// Builder-style insert, mostly useful for in-memory configuration.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.table.insert(key.to_owned(), value.into());
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The file these settings were read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.value(key)? {
            Value::String(s) => Ok(s),
            _ => Err(self.wrong_type(key, "a string")),
        }
    }

    /// Like [`get_str`](Self::get_str), but falls back to `default` when the key is absent.
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str, ConfigError> {
        if self.contains(key) {
            self.get_str(key)
        } else {
            Ok(default)
        }
    }

    /// Reads a real number. Integers are accepted and widened.
    pub fn get_f64(&self, key: &str) -> Result<f64, ConfigError> {
        match self.value(key)? {
            Value::Float(x) => Ok(*x),
            Value::Integer(i) => Ok(*i as f64),
            _ => Err(self.wrong_type(key, "a number")),
        }
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ConfigError> {
        match self.value(key)? {
            Value::Integer(i) => Ok(*i),
            _ => Err(self.wrong_type(key, "an integer")),
        }
    }

    fn value(&self, key: &str) -> Result<&Value, ConfigError> {
        self.table.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_owned(),
            origin: self.origin.clone(),
        })
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> ConfigError {
        ConfigError::WrongType {
            key: key.to_owned(),
            origin: self.origin.clone(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::process;

    #[test]
    fn typed_lookups() {
        let settings = Settings::new("test")
            .with("algo", "LN_COBYLA")
            .with("maxEval", -1i64)
            .with("maxTime", 2i64)
            .with("relativeToleranceX", 1e-6);

        assert_eq!(settings.get_str("algo").unwrap(), "LN_COBYLA");
        assert_eq!(settings.get_i64("maxEval").unwrap(), -1);
        assert_eq!(settings.get_f64("maxTime").unwrap(), 2.0);
        assert_eq!(settings.get_f64("relativeToleranceX").unwrap(), 1e-6);
        assert_eq!(settings.get_str_or("onObjectiveFailure", "ABORT").unwrap(), "ABORT");
    }

    #[test]
    fn missing_key_names_key_and_origin() {
        let settings = Settings::new("optimizer.toml");
        let err = settings.get_str("direction").unwrap_err();
        match &err {
            ConfigError::MissingKey { key, origin } => {
                assert_eq!(key, "direction");
                assert_eq!(origin, "optimizer.toml");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("optimizer.toml"));
    }

    #[test]
    fn wrong_type_is_reported() {
        let settings = Settings::new("test").with("maxEval", "many");
        assert!(matches!(
            settings.get_i64("maxEval"),
            Err(ConfigError::WrongType { expected: "an integer", .. })
        ));
        assert!(matches!(
            settings.get_f64("maxEval"),
            Err(ConfigError::WrongType { .. })
        ));
    }

    #[test]
    fn parses_toml() {
        let text = r#"
            direction = "MAX"
            algo = "LN_SBPLX"
            relativeToleranceX = 1e-8
            maxEval = 1000
        "#;
        let settings = Settings::from_toml("inline", text).unwrap();
        assert_eq!(settings.origin(), "inline");
        assert_eq!(settings.get_str("direction").unwrap(), "MAX");
        assert_eq!(settings.get_i64("maxEval").unwrap(), 1000);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = Settings::from_toml("broken", "direction = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref origin, .. } if origin == "broken"));
    }

    #[test]
    fn loads_from_file() {
        let path = env::temp_dir().join(format!("optimize-settings-{}.toml", process::id()));
        fs::write(&path, "direction = \"MIN\"\nmaxTime = 1.5\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(settings.origin(), path.display().to_string());
        assert_eq!(settings.source(), Some(path.as_path()));
        assert_eq!(settings.get_f64("maxTime").unwrap(), 1.5);
    }

    #[test]
    fn reload_rereads_the_file() {
        let path = env::temp_dir().join(format!("optimize-reload-{}.toml", process::id()));
        fs::write(&path, "maxEval = 10\n").unwrap();
        let settings = Settings::load(&path).unwrap();

        fs::write(&path, "maxEval = 20\n").unwrap();
        let reloaded = settings.reload();
        fs::remove_file(&path).unwrap();

        assert_eq!(settings.get_i64("maxEval").unwrap(), 10);
        assert_eq!(reloaded.unwrap().get_i64("maxEval").unwrap(), 20);
    }

    #[test]
    fn reload_keeps_in_memory_settings() {
        let settings = Settings::new("inline").with("direction", "MAX");
        assert_eq!(settings.source(), None);
        assert_eq!(settings.reload().unwrap(), settings);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Settings::load("/nonexistent/optimize.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
