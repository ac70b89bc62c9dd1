//! Implements the simulation of a material point: constraints, Newton solver and time stepping

mod constraint;
mod current_state;
mod driver;
mod input_data;
mod newton_solver;
mod result_table;
mod thermal_strain;
mod user_check;
mod work_space;
pub use crate::sim::constraint::*;
pub use crate::sim::current_state::*;
pub use crate::sim::driver::*;
pub use crate::sim::input_data::*;
pub use crate::sim::newton_solver::*;
pub use crate::sim::result_table::*;
pub use crate::sim::thermal_strain::*;
pub use crate::sim::user_check::*;
pub use crate::sim::work_space::*;
