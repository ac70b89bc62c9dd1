//! Implements the constitutive behaviours integrated at the material point

mod behaviour;
mod cohesive_elastic;
mod linear_elastic;
mod linear_spring;
mod saint_venant_kirchhoff;
mod von_mises;
pub use crate::material::behaviour::*;
pub use crate::material::cohesive_elastic::*;
pub use crate::material::linear_elastic::*;
pub use crate::material::linear_spring::*;
pub use crate::material::saint_venant_kirchhoff::*;
pub use crate::material::von_mises::*;
