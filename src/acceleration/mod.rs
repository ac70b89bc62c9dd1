//! Implements the convergence acceleration algorithms of the Newton iterations

mod acceleration_algorithm;
mod anderson;
mod broyden;
mod covariance_history;
mod crossed_secant;
mod irons_tuck;
mod registry;
mod secant;
mod vector_arena;
pub use crate::acceleration::acceleration_algorithm::*;
pub use crate::acceleration::anderson::*;
pub use crate::acceleration::broyden::*;
pub use crate::acceleration::covariance_history::*;
pub use crate::acceleration::crossed_secant::*;
pub use crate::acceleration::irons_tuck::*;
pub use crate::acceleration::registry::*;
pub use crate::acceleration::secant::*;
pub use crate::acceleration::vector_arena::*;
