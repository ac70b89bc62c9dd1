use serde::{Deserialize, Serialize};

/// Defines the kind of constitutive behaviour
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum BehaviourKind {
    /// Driving variables are small strains; thermodynamic forces are stresses
    SmallStrain,

    /// Driving variables are deformation gradients; thermodynamic forces are Cauchy stresses
    FiniteStrain,

    /// Driving variables are opening displacements; thermodynamic forces are cohesive forces
    CohesiveZone,

    /// Arbitrary (but equal) number of driving variables and thermodynamic forces
    General,
}

/// Defines the kind of stiffness requested from the behaviour
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum StiffnessKind {
    /// No stiffness is needed (e.g., finite difference perturbations)
    NoStiffness,

    /// Elastic stiffness
    Elastic,

    /// Secant operator
    SecantOperator,

    /// Tangent operator (continuum)
    TangentOperator,

    /// Consistent tangent operator
    ConsistentTangentOperator,
}

/// Defines how the initial guess of each time step is built
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PredictionPolicy {
    /// Uses the converged values of the beginning of the step
    NoPrediction,

    /// Extrapolates linearly from the two previous converged states
    LinearPrediction,

    /// Solves one linearized system with the elastic operator
    ElasticPrediction,

    /// Solves one linearized system with the secant operator
    SecantOperatorPrediction,

    /// Solves one linearized system with the tangent operator
    TangentOperatorPrediction,
}

impl PredictionPolicy {
    /// Returns the stiffness kind of the prediction operator, if any
    pub fn stiffness_kind(&self) -> Option<StiffnessKind> {
        match self {
            PredictionPolicy::NoPrediction => None,
            PredictionPolicy::LinearPrediction => None,
            PredictionPolicy::ElasticPrediction => Some(StiffnessKind::Elastic),
            PredictionPolicy::SecantOperatorPrediction => Some(StiffnessKind::SecantOperator),
            PredictionPolicy::TangentOperatorPrediction => Some(StiffnessKind::TangentOperator),
        }
    }
}

/// Defines when results are handed to the result sink
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum OutputFrequency {
    /// After every committed (sub-)step
    EveryPeriod,

    /// Only at the times given to the driver
    UserDefinedTimes,
}

/// Defines the verbosity level of the console messages
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Verbosity {
    /// No messages at all
    Quiet,

    /// Time steps, sub-steps and warnings
    Level1,

    /// Level1 plus Newton iterations
    Level2,

    /// Level2 plus matrices
    Debug,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
