//! mpsim: integration of constitutive behaviours at a single material point
//!
//! A behaviour is driven along a loading path made of imposed driving variables
//! (strains, deformation gradients, opening displacements) and imposed thermodynamic
//! forces (stresses, cohesive forces). Each time step is solved by Newton-Raphson
//! iterations with Lagrange multipliers and, optionally, a convergence acceleration
//! algorithm. Failed steps are retried with halved time increments.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

/// Defines a function of time
pub type FnTime = fn(f64) -> f64;

pub mod acceleration;
pub mod base;
pub mod material;
pub mod prelude;
pub mod sim;
