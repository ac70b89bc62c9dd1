//! Implements the base structures of a material point simulation

mod constants;
mod control;
mod enums;
mod errors;
mod evolution;
mod hypothesis;
pub use crate::base::constants::*;
pub use crate::base::control::*;
pub use crate::base::enums::*;
pub use crate::base::errors::*;
pub use crate::base::evolution::*;
pub use crate::base::hypothesis::*;
