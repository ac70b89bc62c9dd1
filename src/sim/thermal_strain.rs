use crate::base::{BehaviourKind, Error, Evolutions, Hypothesis};
use crate::base::{TEMPERATURE, THERMAL_EXPANSION, THERMAL_EXPANSION_ORTHO};
use crate::StrError;
use russell_lab::{Matrix, Vector};
use std::f64::consts::SQRT_2;

/// Defines the thermal expansion coefficients
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThermalExpansion {
    /// No thermal strain
    None,

    /// One coefficient (ThermalExpansion)
    Isotropic,

    /// One coefficient per material axis (ThermalExpansion1, ThermalExpansion2, ThermalExpansion3)
    Orthotropic,
}

/// Computes the thermal strain of small strain behaviours
///
/// ```text
/// εth = α (T - Tref)
/// ```
///
/// For orthotropic expansion, `α = Rᵀ diag(α₁, α₂, α₃) R` where `R` rotates the global frame
/// into the material frame. The result is written in Mandel representation.
pub struct ThermalStrain {
    /// Kind of expansion
    pub expansion: ThermalExpansion,

    /// Modelling hypothesis
    hypothesis: Hypothesis,
}

impl ThermalStrain {
    /// Allocates a new instance
    ///
    /// The kind of expansion is deduced from the available evolutions. Thermal strains are only
    /// computed for small strain behaviours.
    pub fn new(kind: BehaviourKind, hypothesis: Hypothesis, evolutions: &Evolutions) -> Result<Self, Error> {
        let isotropic = evolutions.contains(THERMAL_EXPANSION);
        let n_ortho = THERMAL_EXPANSION_ORTHO
            .iter()
            .filter(|name| evolutions.contains(name))
            .count();
        let expansion = if kind != BehaviourKind::SmallStrain {
            ThermalExpansion::None
        } else if isotropic && n_ortho > 0 {
            return Err(Error::configuration(
                "evolutions",
                "isotropic and orthotropic thermal expansion coefficients cannot be combined",
            ));
        } else if isotropic {
            ThermalExpansion::Isotropic
        } else if n_ortho == 3 {
            ThermalExpansion::Orthotropic
        } else if n_ortho > 0 {
            return Err(Error::configuration(
                "evolutions",
                "the three orthotropic thermal expansion coefficients must be given",
            ));
        } else {
            ThermalExpansion::None
        };
        if expansion != ThermalExpansion::None && !evolutions.contains(TEMPERATURE) {
            return Err(Error::configuration(
                "evolutions",
                "the Temperature evolution is required by the thermal expansion",
            ));
        }
        Ok(ThermalStrain { expansion, hypothesis })
    }

    /// Computes the thermal strain at time t
    pub fn calc(
        &self,
        e_th: &mut Vector,
        evolutions: &Evolutions,
        rotation: &Matrix,
        t_ref: f64,
        t: f64,
    ) -> Result<(), StrError> {
        e_th.fill(0.0);
        if self.expansion == ThermalExpansion::None {
            return Ok(());
        }
        let dtemp = evolutions.value(TEMPERATURE, t)? - t_ref;
        let pairs = self.hypothesis.stensor_pairs();
        match self.expansion {
            ThermalExpansion::Isotropic => {
                let alpha = evolutions.value(THERMAL_EXPANSION, t)?;
                for (k, (i, j)) in pairs.iter().enumerate() {
                    if i == j {
                        e_th[k] = alpha * dtemp;
                    }
                }
            }
            ThermalExpansion::Orthotropic => {
                let mut alpha = [0.0; 3];
                for m in 0..3 {
                    alpha[m] = evolutions.value(THERMAL_EXPANSION_ORTHO[m], t)?;
                }
                for (k, (i, j)) in pairs.iter().enumerate() {
                    // αᵢⱼ = Σₘ Rₘᵢ αₘ Rₘⱼ
                    let mut aij = 0.0;
                    for m in 0..3 {
                        aij += rotation.get(m, *i) * alpha[m] * rotation.get(m, *j);
                    }
                    let scale = if i == j { 1.0 } else { SQRT_2 };
                    e_th[k] = scale * aij * dtemp;
                }
            }
            ThermalExpansion::None => (),
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
