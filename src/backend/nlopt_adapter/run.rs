//! Per-call search state and the callback NLopt drives it through.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use super::config::FailurePolicy;
use crate::direction::Direction;
use crate::error::{Error, ObjectiveFailure};
use crate::objective::Objective;
use crate::parameters::BoundedParameters;

/// Everything one `optimize` call mutates while the engine runs.
///
/// Created fresh for each call and dropped before it returns, so nothing
/// leaks from one search into the next.
pub(crate) struct Run<'o> {
    objective: &'o mut dyn Objective,
    direction: Direction,
    policy: FailurePolicy,
    working: BoundedParameters,
    best: BoundedParameters,
    best_score: f64,
    evaluations: usize,
    improvements: usize,
    failures: usize,
    first_failure: Option<Error>,
    halted: bool,
}

/// What a finished run hands back to the adapter.
pub(crate) struct Outcome {
    pub best: BoundedParameters,
    pub best_score: f64,
    pub evaluations: usize,
}

/// The plain-function callback registered with NLopt.
///
/// NLopt knows nothing about methods; it hands back the user data it was
/// given, which is a handle to the current run, and this forwards to it.
/// The gradient buffer is ignored: every supported algorithm is derivative-free.
pub(crate) fn trampoline(x: &[f64], _gradient: Option<&mut [f64]>, run: &mut &mut Run<'_>) -> f64 {
    run.evaluate(x)
}

impl<'o> Run<'o> {
    pub fn new(
        objective: &'o mut dyn Objective,
        direction: Direction,
        policy: FailurePolicy,
        initial_guess: &BoundedParameters,
    ) -> Result<Self, Error> {
        let best_score = direction.worst()?;
        Ok(Self {
            objective,
            direction,
            policy,
            working: initial_guess.clone(),
            best: initial_guess.clone(),
            best_score,
            evaluations: 0,
            improvements: 0,
            failures: 0,
            first_failure: None,
            halted: false,
        })
    }

    /// The value handed to the engine once the run is aborted. It is past the
    /// stop value the adapter configures, so the engine ends the search.
    pub fn halt_score(direction: Direction) -> f64 {
        match direction {
            Direction::Maximize => f64::INFINITY,
            Direction::Minimize => f64::NEG_INFINITY,
            // Run::new rejects it
            Direction::Unset => f64::NAN,
        }
    }

    /// Scores one candidate, keeps the best point, and returns the raw score.
    pub fn evaluate(&mut self, candidate: &[f64]) -> f64 {
        if self.halted {
            return Self::halt_score(self.direction);
        }
        self.evaluations += 1;

        if let Err(err) = self.working.set_values(candidate) {
            return self.fail(Error::InvalidInput(err));
        }
        let score = match self.score() {
            Ok(score) => score,
            Err(failure) => {
                let err = Error::ObjectiveEvaluation {
                    evaluation: self.evaluations,
                    source: failure,
                };
                return self.fail(err);
            }
        };

        match self.direction.is_improvement(score, self.best_score) {
            Ok(true) => {
                self.best_score = score;
                self.best.clone_from(&self.working);
                self.improvements += 1;
            }
            Ok(false) => {}
            Err(err) => return self.fail(err),
        }
        debug!(
            evaluation = self.evaluations,
            parameters = ?candidate,
            score,
            best = self.best_score,
            "evaluated objective"
        );
        score
    }

    fn score(&mut self) -> Result<f64, ObjectiveFailure> {
        let objective = &mut *self.objective;
        let working = &self.working;
        // a panic must not unwind into the engine's C frames
        let result = panic::catch_unwind(AssertUnwindSafe(|| objective.evaluate(working)));
        match result {
            Ok(Ok(score)) if score.is_nan() => Err(ObjectiveFailure::NanScore),
            Ok(Ok(score)) => Ok(score),
            Ok(Err(err)) => Err(ObjectiveFailure::Returned(err)),
            Err(payload) => Err(ObjectiveFailure::Panicked(panic_message(payload))),
        }
    }

    fn fail(&mut self, err: Error) -> f64 {
        self.failures += 1;
        let score = match self.policy {
            FailurePolicy::Abort => {
                error!(error = %err, "objective failed, aborting the search");
                self.halted = true;
                Self::halt_score(self.direction)
            }
            FailurePolicy::ReportNan => {
                warn!(error = %err, "objective failed, reporting NaN to the engine");
                f64::NAN
            }
        };
        if self.first_failure.is_none() {
            self.first_failure = Some(err);
        }
        score
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Ends the run. An aborted run, or one where every evaluation failed,
    /// yields the first recorded failure.
    pub fn finish(self) -> Result<Outcome, Error> {
        if let Some(err) = self.first_failure {
            if self.halted || self.improvements == 0 {
                return Err(err);
            }
            warn!(
                failures = self.failures,
                evaluations = self.evaluations,
                "objective failed on some evaluations"
            );
        }
        Ok(Outcome {
            best: self.best,
            best_score: self.best_score,
            evaluations: self.evaluations,
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
