use super::{material_property, Behaviour, BehaviourInput};
use crate::base::{BehaviourKind, Hypothesis, StiffnessKind};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Implements a set of uncoupled linear springs (general behaviour)
///
/// Material properties: Stiffness.
///
/// Each thermodynamic force is `s_i = k u_i`, independently of the hypothesis.
pub struct LinearSpring {
    n: usize,
}

impl LinearSpring {
    /// Allocates a new instance with n components
    pub fn new(n: usize) -> Self {
        LinearSpring { n }
    }
}

impl Behaviour for LinearSpring {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::General
    }

    fn n_driving_variables(&self, _hypothesis: Hypothesis) -> usize {
        self.n
    }

    fn n_thermodynamic_forces(&self, _hypothesis: Hypothesis) -> usize {
        self.n
    }

    fn material_property_names(&self) -> Vec<String> {
        vec!["Stiffness".to_string()]
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        s1: &mut Vector,
        _iv1: &mut Vector,
        input: &BehaviourInput,
    ) -> Result<(), StrError> {
        let k = material_property(input.mprops, 0)?;
        for i in 0..self.n {
            s1[i] = input.s0[i] + k * (input.e1[i] - input.e0[i]);
        }
        if input.stiffness != StiffnessKind::NoStiffness {
            kt.fill(0.0);
            for i in 0..self.n {
                kt.set(i, i, k);
            }
        }
        Ok(())
    }

    fn compute_prediction_operator(&mut self, kp: &mut Matrix, input: &BehaviourInput) -> Result<(), StrError> {
        let k = material_property(input.mprops, 0)?;
        kp.fill(0.0);
        for i in 0..self.n {
            kp.set(i, i, k);
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
