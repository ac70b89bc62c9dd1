use russell_lab::Matrix;
use std::fmt;
use thiserror::Error;

/// Holds the reasons why the integration of one time step failed
///
/// These failures are recovered by the driver, which halves the time increment and tries again.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IntegrationFailure {
    /// The behaviour rejected the strain increment
    #[error("behaviour integration failed: {0}")]
    Behaviour(String),

    /// The linear system could not be solved (e.g., singular Jacobian)
    #[error("linear system solution failed: {0}")]
    LinearSolver(String),

    /// The residual or the increment became NaN or infinite
    #[error("found NaN or Inf at iteration {iteration}")]
    NonFinite { iteration: usize },

    /// The iterations converged but the behaviour asked for a smaller time increment
    #[error("the behaviour requested a smaller time step (scaling factor {0:?})")]
    TimeStepRejected(f64),

    /// The Newton iterations did not converge
    #[error("no convergence after {iterations} iterations: {}", .failed_criteria.join("; "))]
    NotConverged {
        iterations: usize,
        failed_criteria: Vec<String>,
    },
}

impl IntegrationFailure {
    /// Returns the list of unmet criteria (or the failure message)
    pub fn failed_criteria(&self) -> Vec<String> {
        match self {
            IntegrationFailure::NotConverged { failed_criteria, .. } => failed_criteria.clone(),
            _ => vec![self.to_string()],
        }
    }
}

/// Defines the errors that terminate a run
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or contradictory setup, reported before any stepping begins
    #[error("configuration error ({field}): {message}")]
    Configuration { field: String, message: String },

    /// A constraint is not compatible with the behaviour kind or hypothesis
    #[error("incompatible constraint: {0}")]
    IncompatibleConstraint(String),

    /// The maximum number of sub-steps has been reached
    #[error("maximum number of sub-steps ({sub_steps}) reached; failed criteria: {}", .failed_criteria.join("; "))]
    SubSteppingExhausted {
        sub_steps: usize,
        failed_criteria: Vec<String>,
    },

    /// The (dynamically scaled) time increment became too small
    #[error("time step {dt:?} is below its minimal value {dt_min:?}")]
    TimeStepTooSmall { dt: f64, dt_min: f64 },

    /// The result sink could not record the results
    #[error("cannot record results: {0}")]
    Output(String),
}

impl Error {
    /// Returns a configuration error
    pub fn configuration(field: &str, message: impl Into<String>) -> Self {
        Error::Configuration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Holds the outcome of the comparison between the analytic and the numerical tangent operators
///
/// This is a diagnostic only; it never affects the iterations.
#[derive(Clone, Debug)]
pub struct NumericalTangentMismatch {
    /// Holds the maximum absolute difference between the two operators
    pub max_error: f64,

    /// Holds the comparison criterion
    pub tolerance: f64,

    /// Holds the tangent operator computed by the behaviour
    pub analytic: Matrix,

    /// Holds the tangent operator computed by central differences
    pub numerical: Matrix,
}

impl fmt::Display for NumericalTangentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "comparison to the numerical tangent operator failed (error: {:e}, criterion: {:e})\n",
            self.max_error, self.tolerance
        )?;
        write!(f, "tangent operator:\n{}\n", self.analytic)?;
        write!(f, "numerical tangent operator:\n{}", self.numerical)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Error, IntegrationFailure, NumericalTangentMismatch};
    use russell_lab::Matrix;

    #[test]
    fn integration_failure_messages_work() {
        let failure = IntegrationFailure::Behaviour("stress is too large".to_string());
        assert_eq!(failure.to_string(), "behaviour integration failed: stress is too large");
        assert_eq!(
            failure.failed_criteria(),
            &["behaviour integration failed: stress is too large"]
        );

        let failure = IntegrationFailure::NotConverged {
            iterations: 3,
            failed_criteria: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(failure.to_string(), "no convergence after 3 iterations: a; b");
        assert_eq!(failure.failed_criteria(), &["a", "b"]);

        let failure = IntegrationFailure::NonFinite { iteration: 2 };
        assert_eq!(failure.to_string(), "found NaN or Inf at iteration 2");

        let failure = IntegrationFailure::TimeStepRejected(0.25);
        assert_eq!(
            failure.to_string(),
            "the behaviour requested a smaller time step (scaling factor 0.25)"
        );
    }

    #[test]
    fn error_messages_work() {
        let error = Error::configuration("times", "at least two times are required");
        assert_eq!(
            error.to_string(),
            "configuration error (times): at least two times are required"
        );

        let error = Error::SubSteppingExhausted {
            sub_steps: 10,
            failed_criteria: vec!["x".to_string()],
        };
        assert_eq!(error.to_string(), "maximum number of sub-steps (10) reached; failed criteria: x");

        let error = Error::TimeStepTooSmall { dt: 0.5, dt_min: 1.0 };
        assert_eq!(error.to_string(), "time step 0.5 is below its minimal value 1.0");
    }

    #[test]
    fn mismatch_display_works() {
        let mismatch = NumericalTangentMismatch {
            max_error: 2.0,
            tolerance: 1.0,
            analytic: Matrix::from(&[[1.0]]),
            numerical: Matrix::from(&[[3.0]]),
        };
        let msg = format!("{}", mismatch);
        assert!(msg.starts_with("comparison to the numerical tangent operator failed (error: 2e0, criterion: 1e0)"));
    }
}
