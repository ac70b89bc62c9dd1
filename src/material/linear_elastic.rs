use super::{material_property, Behaviour, BehaviourInput};
use crate::base::{BehaviourKind, Hypothesis, StiffnessKind};
use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_tensor::LinElasticity;

/// Holds the elastic modulus, rebuilt only when the properties or the hypothesis change
pub(crate) struct ElasticModulus {
    young: f64,
    poisson: f64,
    two_dim: bool,
    model: Option<LinElasticity>,
}

impl ElasticModulus {
    /// Allocates a new (empty) instance
    pub(crate) fn new() -> Self {
        ElasticModulus {
            young: 0.0,
            poisson: 0.0,
            two_dim: false,
            model: None,
        }
    }

    /// Returns the linear elasticity model for the given properties
    ///
    /// The modulus of the 1D hypothesis is the leading 3×3 block of the 2D modulus.
    pub(crate) fn get(&mut self, young: f64, poisson: f64, hypothesis: Hypothesis) -> Result<&LinElasticity, StrError> {
        if young <= 0.0 {
            return Err("YoungModulus must be > 0.0");
        }
        if poisson <= -1.0 || poisson >= 0.5 {
            return Err("PoissonRatio must be in (-1.0, 0.5)");
        }
        let two_dim = hypothesis.space_dim() < 3;
        let outdated = match self.model {
            Some(_) => young != self.young || poisson != self.poisson || two_dim != self.two_dim,
            None => true,
        };
        if outdated {
            self.young = young;
            self.poisson = poisson;
            self.two_dim = two_dim;
            self.model = Some(LinElasticity::new(young, poisson, two_dim, false));
        }
        match &self.model {
            Some(model) => Ok(model),
            None => Err("elastic modulus is not available"),
        }
    }
}

/// Copies the leading n×n block of the elastic modulus into kt
pub(crate) fn copy_modulus(kt: &mut Matrix, model: &LinElasticity, n: usize) {
    let dd = model.get_modulus().matrix();
    for i in 0..n {
        for j in 0..n {
            kt.set(i, j, dd.get(i, j));
        }
    }
}

/// Implements isotropic linear elasticity
///
/// Material properties: YoungModulus, PoissonRatio.
///
/// The stress is updated incrementally: `σ1 = σ0 + D : (ε1 - ε0)`.
/// Plane stress is obtained through the `SZZ = 0` constraint added by the driver.
pub struct LinearElastic {
    modulus: ElasticModulus,
}

impl LinearElastic {
    /// Allocates a new instance
    pub fn new() -> Self {
        LinearElastic {
            modulus: ElasticModulus::new(),
        }
    }
}

impl Behaviour for LinearElastic {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::SmallStrain
    }

    fn material_property_names(&self) -> Vec<String> {
        vec!["YoungModulus".to_string(), "PoissonRatio".to_string()]
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        s1: &mut Vector,
        _iv1: &mut Vector,
        input: &BehaviourInput,
    ) -> Result<(), StrError> {
        let young = material_property(input.mprops, 0)?;
        let poisson = material_property(input.mprops, 1)?;
        let model = self.modulus.get(young, poisson, input.hypothesis)?;
        let dd = model.get_modulus().matrix();
        let n = input.hypothesis.n_stensor();
        for i in 0..n {
            s1[i] = input.s0[i];
            for j in 0..n {
                s1[i] += dd.get(i, j) * (input.e1[j] - input.e0[j]); // σ += D : Δε
            }
        }
        if input.stiffness != StiffnessKind::NoStiffness {
            copy_modulus(kt, model, n);
        }
        Ok(())
    }

    fn compute_prediction_operator(&mut self, kp: &mut Matrix, input: &BehaviourInput) -> Result<(), StrError> {
        let young = material_property(input.mprops, 0)?;
        let poisson = material_property(input.mprops, 1)?;
        let model = self.modulus.get(young, poisson, input.hypothesis)?;
        copy_modulus(kp, model, input.hypothesis.n_stensor());
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
