use super::{CohesiveElastic, LinearElastic, LinearSpring, SaintVenantKirchhoff, VonMises};
use crate::base::{BehaviourKind, Hypothesis, StiffnessKind};
use crate::StrError;
use russell_lab::{Matrix, Vector};
use serde::{Deserialize, Serialize};

/// Holds the data passed to the behaviour integration
///
/// All vectors refer to the beginning of the time step, except `e1` (end of the step)
/// and `mprops`, which are evaluated at the end of the step (or at the beginning for
/// the prediction operator).
pub struct BehaviourInput<'a> {
    /// Modelling hypothesis
    pub hypothesis: Hypothesis,

    /// Rotation matrix from the global frame to the material frame (3×3)
    pub rotation: &'a Matrix,

    /// Driving variables at the beginning of the step (mechanical part)
    pub e0: &'a Vector,

    /// Driving variables at the end of the step (mechanical part)
    pub e1: &'a Vector,

    /// Thermodynamic forces at the beginning of the step
    pub s0: &'a Vector,

    /// Material properties
    pub mprops: &'a Vector,

    /// Internal state variables at the beginning of the step
    pub iv0: &'a Vector,

    /// External state variables at the beginning of the step
    pub esv0: &'a Vector,

    /// Increments of the external state variables
    pub desv: &'a Vector,

    /// Time increment
    pub dt: f64,

    /// Kind of stiffness to be computed
    pub stiffness: StiffnessKind,
}

/// Specifies the essential functions of a constitutive behaviour
///
/// The sizes of the driving variables and thermodynamic forces follow from the
/// behaviour kind and the modelling hypothesis. Behaviours of the General kind
/// must override `n_driving_variables` and `n_thermodynamic_forces`.
pub trait Behaviour: Send {
    /// Returns the kind of behaviour
    fn kind(&self) -> BehaviourKind;

    /// Returns the number of driving variables
    fn n_driving_variables(&self, hypothesis: Hypothesis) -> usize {
        match self.kind() {
            BehaviourKind::SmallStrain => hypothesis.n_stensor(),
            BehaviourKind::FiniteStrain => hypothesis.n_tensor(),
            BehaviourKind::CohesiveZone => hypothesis.space_dim(),
            BehaviourKind::General => 0,
        }
    }

    /// Returns the number of thermodynamic forces
    fn n_thermodynamic_forces(&self, hypothesis: Hypothesis) -> usize {
        match self.kind() {
            BehaviourKind::SmallStrain => hypothesis.n_stensor(),
            BehaviourKind::FiniteStrain => hypothesis.n_stensor(),
            BehaviourKind::CohesiveZone => hypothesis.space_dim(),
            BehaviourKind::General => 0,
        }
    }

    /// Returns the number of internal state variables
    fn n_internal_variables(&self, _hypothesis: Hypothesis) -> usize {
        0
    }

    /// Returns the names of the driving variables
    fn driving_variable_names(&self, hypothesis: Hypothesis) -> Vec<String> {
        match self.kind() {
            BehaviourKind::SmallStrain => hypothesis.stensor_names("E"),
            BehaviourKind::FiniteStrain => hypothesis.tensor_names("F"),
            BehaviourKind::CohesiveZone => hypothesis.interface_names("U"),
            BehaviourKind::General => (0..self.n_driving_variables(hypothesis))
                .map(|i| format!("U{}", i))
                .collect(),
        }
    }

    /// Returns the names of the thermodynamic forces
    fn thermodynamic_force_names(&self, hypothesis: Hypothesis) -> Vec<String> {
        match self.kind() {
            BehaviourKind::SmallStrain | BehaviourKind::FiniteStrain => hypothesis.stensor_names("S"),
            BehaviourKind::CohesiveZone => hypothesis.interface_names("T"),
            BehaviourKind::General => (0..self.n_thermodynamic_forces(hypothesis))
                .map(|i| format!("S{}", i))
                .collect(),
        }
    }

    /// Returns the names of the internal state variables
    fn internal_variable_names(&self, hypothesis: Hypothesis) -> Vec<String> {
        (0..self.n_internal_variables(hypothesis))
            .map(|i| format!("IV{}", i))
            .collect()
    }

    /// Returns the names of the material properties (evaluated from evolutions)
    fn material_property_names(&self) -> Vec<String>;

    /// Returns the names of the external state variables (evaluated from evolutions)
    fn external_state_variable_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Returns the stiffness kind used when none is requested
    fn default_stiffness_kind(&self) -> StiffnessKind {
        StiffnessKind::ConsistentTangentOperator
    }

    /// Indicates that the behaviour is orthotropic (the rotation matrix matters)
    fn orthotropic(&self) -> bool {
        false
    }

    /// Returns the initial values of the driving variables
    ///
    /// Finite strain behaviours start from the identity deformation gradient.
    fn driving_variables_initial_values(&self, hypothesis: Hypothesis) -> Vector {
        let mut u = Vector::new(self.n_driving_variables(hypothesis));
        if self.kind() == BehaviourKind::FiniteStrain {
            for i in 0..3 {
                u[i] = 1.0;
            }
        }
        u
    }

    /// Integrates the behaviour over the time step
    ///
    /// Computes the thermodynamic forces `s1` and the internal state variables `iv1` at the
    /// end of the step and, unless `input.stiffness` is NoStiffness, the stiffness `kt`
    /// (nth × ndv). Returns an error if the integration fails (e.g., the step is too large).
    fn integrate(
        &mut self,
        kt: &mut Matrix,
        s1: &mut Vector,
        iv1: &mut Vector,
        input: &BehaviourInput,
    ) -> Result<(), StrError>;

    /// Computes the prediction operator (nth × ndv) for the stiffness kind in `input`
    fn compute_prediction_operator(&mut self, _kp: &mut Matrix, _input: &BehaviourInput) -> Result<(), StrError> {
        Err("the prediction operator is not available")
    }

    /// Returns the factor proposed for the next time increment (after the last integration)
    fn time_step_scaling_factor(&self) -> f64 {
        1.0
    }
}

/// Defines the built-in behaviours
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum ParamBehaviour {
    /// Isotropic linear elasticity (small strain)
    LinearElastic,

    /// von Mises plasticity with linear isotropic hardening (small strain)
    VonMises,

    /// Saint Venant-Kirchhoff hyperelasticity (finite strain)
    SaintVenantKirchhoff,

    /// Linear cohesive zone model
    CohesiveElastic,

    /// Uncoupled linear springs (general kind) with `n` components
    LinearSpring { n: usize },
}

/// Holds the actual behaviour implementation
pub struct BehaviourModel {
    /// Holds the actual model implementation
    pub actual: Box<dyn Behaviour>,
}

impl BehaviourModel {
    /// Allocates a new instance
    pub fn new(param: &ParamBehaviour) -> Result<Self, StrError> {
        let actual: Box<dyn Behaviour> = match *param {
            ParamBehaviour::LinearElastic => Box::new(LinearElastic::new()),
            ParamBehaviour::VonMises => Box::new(VonMises::new()),
            ParamBehaviour::SaintVenantKirchhoff => Box::new(SaintVenantKirchhoff::new()),
            ParamBehaviour::CohesiveElastic => Box::new(CohesiveElastic::new()),
            ParamBehaviour::LinearSpring { n } => {
                if n < 1 {
                    return Err("the number of components of LinearSpring must be ≥ 1");
                }
                Box::new(LinearSpring::new(n))
            }
        };
        Ok(BehaviourModel { actual })
    }
}

/// Returns the material property with the given index or an error if it is missing
pub(crate) fn material_property(mprops: &Vector, index: usize) -> Result<f64, StrError> {
    if index >= mprops.dim() {
        return Err("not enough material properties");
    }
    Ok(mprops[index])
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
