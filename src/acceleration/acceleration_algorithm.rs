use crate::StrError;
use russell_lab::Vector;

/// Specifies the essential functions of a convergence acceleration algorithm
///
/// The algorithm is called after each Newton correction `u ← u - δu`, where `u` holds the
/// new estimate, `du` the correction and `rr` the residual used to compute the correction.
/// Algorithms never fail: degenerate situations simply skip the acceleration.
pub trait AccelerationTrait: Send {
    /// Returns the name of the algorithm
    fn name(&self) -> &'static str;

    /// Sets a parameter from its string representation
    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError>;

    /// Allocates the internal data for the number of unknowns
    fn initialize(&mut self, n: usize) -> Result<(), StrError>;

    /// Prepares the algorithm for a new time step
    fn pre_step(&mut self);

    /// Modifies the current estimate
    ///
    /// Returns true if `u` has been modified.
    fn execute(&mut self, u: &mut Vector, du: &Vector, rr: &Vector, eeps: f64, seps: f64, iteration: usize) -> bool;

    /// Finalizes the time step (after convergence)
    fn post_step(&mut self);
}

/// Holds the actual acceleration algorithm
pub struct AccelerationAlgorithm {
    /// Holds the actual implementation
    pub actual: Box<dyn AccelerationTrait>,
}

/// Parses a positive integer parameter
pub(crate) fn parse_positive(value: &str, error: StrError) -> Result<usize, StrError> {
    match value.trim().parse::<usize>() {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(error),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
