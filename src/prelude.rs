//! Makes available common structures needed to run a simulation
//!
//! You may write `use mpsim::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::acceleration::{AccelerationRegistry, AccelerationTrait};
pub use crate::base::{Control, Error, Evolution, Evolutions, Hypothesis, IntegrationFailure};
pub use crate::base::{OutputFrequency, PredictionPolicy, StiffnessKind, Verbosity, DEFAULT_TEST_DIR};
pub use crate::material::{Behaviour, BehaviourInput, BehaviourModel, ParamBehaviour};
pub use crate::sim::{times_linspace, CheckOutcome, Constraint, Driver, InputData, ReferenceValueCheck};
pub use crate::sim::{ResultSink, ResultTable, RunSummary, UserCheck};
pub use crate::StrError;
