//! Search direction and the fixed table of names it is parsed from.
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Error};

/// Whether an optimizer seeks the smallest or the largest objective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// No direction resolved yet. Never valid for a search.
    #[default]
    Unset,
    Minimize,
    Maximize,
}

/// Configuration names, in the order they are listed in error messages.
pub const DIRECTION_NAMES: [(&str, Direction); 2] =
    [("MIN", Direction::Minimize), ("MAX", Direction::Maximize)];

impl Direction {
    /// The score every evaluated point beats. Seeding the best score with it
    /// guarantees the first evaluation is recorded.
    pub fn worst(self) -> Result<f64, Error> {
        match self {
            Direction::Minimize => Ok(f64::INFINITY),
            Direction::Maximize => Ok(f64::NEG_INFINITY),
            Direction::Unset => Err(Error::UnsetDirection),
        }
    }

    /// Whether `candidate` should replace `incumbent` as the best score.
    ///
    /// Ties count as an improvement, so among equal scores the most recently
    /// evaluated point wins. NaN never improves.
    pub fn is_improvement(self, candidate: f64, incumbent: f64) -> Result<bool, Error> {
        match self {
            Direction::Minimize => Ok(candidate <= incumbent),
            Direction::Maximize => Ok(candidate >= incumbent),
            Direction::Unset => Err(Error::UnsetDirection),
        }
    }

    pub fn name(self) -> Option<&'static str> {
        DIRECTION_NAMES
            .iter()
            .find(|(_, direction)| *direction == self)
            .map(|(name, _)| *name)
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        DIRECTION_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, direction)| *direction)
            .ok_or_else(|| ConfigError::UnknownDirection {
                name: name.to_owned(),
                valid: valid_names(),
            })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name().unwrap_or("UNSET"))
    }
}

fn valid_names() -> String {
    DIRECTION_NAMES
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("MIN".parse::<Direction>().unwrap(), Direction::Minimize);
        assert_eq!("MAX".parse::<Direction>().unwrap(), Direction::Maximize);
    }

    #[test]
    fn unknown_name_lists_valid_names() {
        let err = "max".parse::<Direction>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`max`"));
        assert!(message.contains("MIN, MAX"));
    }

    #[test]
    fn ties_go_to_the_latest_point() {
        assert!(Direction::Minimize.is_improvement(1.0, 1.0).unwrap());
        assert!(Direction::Maximize.is_improvement(1.0, 1.0).unwrap());
        assert!(Direction::Minimize.is_improvement(0.5, 1.0).unwrap());
        assert!(!Direction::Minimize.is_improvement(1.5, 1.0).unwrap());
        assert!(Direction::Maximize.is_improvement(1.5, 1.0).unwrap());
        assert!(!Direction::Maximize.is_improvement(f64::NAN, 1.0).unwrap());
    }

    #[test]
    fn seed_is_beaten_by_any_score() {
        for direction in [Direction::Minimize, Direction::Maximize] {
            let seed = direction.worst().unwrap();
            assert!(direction.is_improvement(1e300, seed).unwrap());
            assert!(direction.is_improvement(-1e300, seed).unwrap());
        }
    }

    #[test]
    fn unset_fails_loudly() {
        assert!(matches!(Direction::Unset.worst(), Err(Error::UnsetDirection)));
        assert!(matches!(
            Direction::Unset.is_improvement(0.0, 1.0),
            Err(Error::UnsetDirection)
        ));
        assert_eq!(Direction::default(), Direction::Unset);
        assert_eq!(Direction::Unset.to_string(), "UNSET");
    }
}
