//! The scoring side of an optimization: what callers implement.
use ndarray::prelude::*;

use crate::direction::Direction;
use crate::error::BoxError;
use crate::parameters::BoundedParameters;

/// What an objective learns about the search before it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveContext {
    pub direction: Direction,
    pub dimension: usize,
}

/// A function scored by an [`Optimizer`](crate::Optimizer).
///
/// The optimizer owns the parameter vector and lends it to `evaluate`. The
/// number and order of evaluations are up to the engine, so implementations
/// must not rely on either.
pub trait Objective {
    /// Called once at the start of every run.
    fn initialize(&mut self, _context: &ObjectiveContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Scores one point. A returned NaN is treated as a failure.
    fn evaluate(&mut self, parameters: &BoundedParameters) -> Result<f64, BoxError>;
}

/// Wraps a plain closure as an [`Objective`], counting its calls.
pub struct FnObjective<F: FnMut(ArrayView1<f64>) -> f64> {
    pub num: usize,
    pub func: F,
}

impl<F: FnMut(ArrayView1<f64>) -> f64> FnObjective<F> {
    pub fn new(func: F) -> Self {
        Self { num: 0, func }
    }
}

impl<F: FnMut(ArrayView1<f64>) -> f64> Objective for FnObjective<F> {
    fn initialize(&mut self, _context: &ObjectiveContext) -> Result<(), BoxError> {
        self.num = 0;
        Ok(())
    }

    fn evaluate(&mut self, parameters: &BoundedParameters) -> Result<f64, BoxError> {
        self.num += 1;
        Ok((self.func)(parameters.values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn counts_calls() {
        let mut objective = FnObjective::new(|x: ArrayView1<f64>| x[0].powi(2) + 200. * x[1].powi(2));
        let p = BoundedParameters::unbounded(vec![1.0, 1.0]);

        let score = objective.evaluate(&p).unwrap();
        objective.evaluate(&p).unwrap();

        assert!(approx_eq!(f64, score, 201.0, ulps = 2));
        assert_eq!(objective.num, 2);

        let context = ObjectiveContext {
            direction: Direction::Minimize,
            dimension: 2,
        };
        objective.initialize(&context).unwrap();
        assert_eq!(objective.num, 0);
    }
}
