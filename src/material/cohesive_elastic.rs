use super::{material_property, Behaviour, BehaviourInput};
use crate::base::{BehaviourKind, StiffnessKind};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Implements a linear cohesive zone model
///
/// Material properties: NormalStiffness, TangentialStiffness.
///
/// The cohesive force is `Tn = kn Un` in the normal direction and `Tt = kt Ut` in the
/// tangential directions.
pub struct CohesiveElastic {}

impl CohesiveElastic {
    /// Allocates a new instance
    pub fn new() -> Self {
        CohesiveElastic {}
    }

    /// Returns the stiffness of each component
    fn stiffnesses(&self, input: &BehaviourInput) -> Result<(f64, f64), StrError> {
        let kn = material_property(input.mprops, 0)?;
        let kt = material_property(input.mprops, 1)?;
        if kn <= 0.0 {
            return Err("NormalStiffness must be > 0.0");
        }
        if kt <= 0.0 {
            return Err("TangentialStiffness must be > 0.0");
        }
        Ok((kn, kt))
    }
}

impl Behaviour for CohesiveElastic {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::CohesiveZone
    }

    fn material_property_names(&self) -> Vec<String> {
        vec!["NormalStiffness".to_string(), "TangentialStiffness".to_string()]
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        s1: &mut Vector,
        _iv1: &mut Vector,
        input: &BehaviourInput,
    ) -> Result<(), StrError> {
        let (kn, kt_) = self.stiffnesses(input)?;
        let n = input.hypothesis.space_dim();
        for i in 0..n {
            let k = if i == 0 { kn } else { kt_ };
            s1[i] = input.s0[i] + k * (input.e1[i] - input.e0[i]);
            if input.stiffness != StiffnessKind::NoStiffness {
                for j in 0..n {
                    kt.set(i, j, if i == j { k } else { 0.0 });
                }
            }
        }
        Ok(())
    }

    fn compute_prediction_operator(&mut self, kp: &mut Matrix, input: &BehaviourInput) -> Result<(), StrError> {
        let (kn, kt) = self.stiffnesses(input)?;
        let n = input.hypothesis.space_dim();
        for i in 0..n {
            let k = if i == 0 { kn } else { kt };
            for j in 0..n {
                kp.set(i, j, if i == j { k } else { 0.0 });
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
