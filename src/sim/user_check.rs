use super::{CurrentState, VariableLocation, VariableNames};
use crate::base::Evolution;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the outcome of a user check
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CheckOutcome {
    /// Time at the end of the checked step
    pub t: f64,

    /// Indicates that the check has passed
    pub passed: bool,

    /// Describes the check (and the failure, if any)
    pub message: String,
}

/// Specifies a test performed after each committed step
pub trait UserCheck: Send {
    /// Resolves the names of the variables before the first step
    fn initialize(&mut self, _names: &VariableNames) -> Result<(), StrError> {
        Ok(())
    }

    /// Checks the state at the end of the step
    ///
    /// The end values (u1, s1, iv1) of `state` hold the converged step at time `t + dt`.
    fn check(&self, state: &CurrentState, t: f64, dt: f64, period: usize) -> CheckOutcome;
}

/// Compares one variable to an evolution
///
/// The check passes if `|x(t) - ev(t)| ≤ tolerance`.
pub struct ReferenceValueCheck {
    variable: String,
    reference: Evolution,
    tolerance: f64,
    location: Option<VariableLocation>,
}

impl ReferenceValueCheck {
    /// Allocates a new instance
    pub fn new(variable: &str, reference: Evolution, tolerance: f64) -> Result<Self, StrError> {
        if !(tolerance >= 0.0) {
            return Err("the tolerance of the check must be ≥ 0.0");
        }
        reference.check_data()?;
        Ok(ReferenceValueCheck {
            variable: variable.to_string(),
            reference,
            tolerance,
            location: None,
        })
    }
}

impl UserCheck for ReferenceValueCheck {
    fn initialize(&mut self, names: &VariableNames) -> Result<(), StrError> {
        match names.locate(&self.variable) {
            Some(location) => {
                self.location = Some(location);
                Ok(())
            }
            None => Err("cannot find the variable of the check"),
        }
    }

    fn check(&self, state: &CurrentState, t: f64, dt: f64, period: usize) -> CheckOutcome {
        let time = t + dt;
        let location = match self.location {
            Some(location) => location,
            None => {
                return CheckOutcome {
                    t: time,
                    passed: false,
                    message: format!("check on {} is not initialized", self.variable),
                }
            }
        };
        let value = state.value(location);
        let reference = self.reference.value(time);
        let error = f64::abs(value - reference);
        let passed = error <= self.tolerance;
        let message = if passed {
            format!("check on {} passed at period {}", self.variable, period)
        } else {
            format!(
                "check on {} failed at period {} (t = {:?}): value {:e}, reference {:e}, error {:e} > {:e}",
                self.variable, period, time, value, reference, error, self.tolerance
            )
        };
        CheckOutcome { t: time, passed, message }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
