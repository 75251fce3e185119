//! Parameter vectors that carry their own box constraints.
use ndarray::prelude::*;

use crate::error::InvalidInput;

/// A point in parameter space together with inclusive per-dimension bounds.
///
/// The bounds travel with the point: an optimizer reads them from the
/// initial guess rather than from its configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedParameters {
    values: Array1<f64>,
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl BoundedParameters {
    /// Creates a bounded vector, checking that all three sequences have the
    /// same length and that no lower bound exceeds its upper bound.
    pub fn new(
        values: impl Into<Array1<f64>>,
        lower: impl Into<Array1<f64>>,
        upper: impl Into<Array1<f64>>,
    ) -> Result<Self, InvalidInput> {
        let parameters = Self {
            values: values.into(),
            lower: lower.into(),
            upper: upper.into(),
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// A vector whose bounds are the whole real line.
    pub fn unbounded(values: impl Into<Array1<f64>>) -> Self {
        let values = values.into();
        let n = values.len();
        Self {
            values,
            lower: Array1::from_elem(n, f64::NEG_INFINITY),
            upper: Array1::from_elem(n, f64::INFINITY),
        }
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        let n = self.values.len();
        if self.lower.len() != n || self.upper.len() != n {
            return Err(InvalidInput::BoundsLength {
                values: n,
                lower: self.lower.len(),
                upper: self.upper.len(),
            });
        }
        // NaN bounds fail this check too
        for (index, (&lower, &upper)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !(lower <= upper) {
                return Err(InvalidInput::InvertedBounds { index, lower, upper });
            }
        }
        Ok(())
    }

    /// Replaces the point, keeping the bounds.
    pub fn set_values(&mut self, values: &[f64]) -> Result<(), InvalidInput> {
        if values.len() != self.values.len() {
            return Err(InvalidInput::Dimension {
                expected: self.values.len(),
                found: values.len(),
            });
        }
        self.values.assign(&ArrayView1::from(values));
        Ok(())
    }

    pub fn values(&self) -> ArrayView1<f64> {
        self.values.view()
    }

    pub fn lower_bounds(&self) -> ArrayView1<f64> {
        self.lower.view()
    }

    pub fn upper_bounds(&self) -> ArrayView1<f64> {
        self.upper.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether every value lies within its bounds.
    pub fn contains(&self) -> bool {
        self.check_contained().is_ok()
    }

    /// Reports the first value outside its bounds. A NaN value is never inside.
    pub fn check_contained(&self) -> Result<(), InvalidInput> {
        let bounds = self.lower.iter().zip(&self.upper);
        for (index, (&value, (&lower, &upper))) in self.values.iter().zip(bounds).enumerate() {
            if !(lower <= value && value <= upper) {
                return Err(InvalidInput::OutOfBounds {
                    index,
                    value,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }
}
