use super::{copy_modulus, material_property, Behaviour, BehaviourInput, ElasticModulus};
use crate::base::{BehaviourKind, Hypothesis, StiffnessKind};
use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_tensor::{Tensor2, IDENTITY2, P_SYMDEV, SQRT_2_BY_3};

/// Defines an alias to IDENTITY2
const I: &[f64; 9] = &IDENTITY2;

/// Defines an alias to P_SYMDEV
const PSD: &[[f64; 9]; 9] = &P_SYMDEV;

/// Holds the index of the equivalent plastic strain in the internal variables
const P0: usize = 0;

/// Implements the von Mises plasticity model with linear isotropic hardening
///
/// Material properties: YoungModulus, PoissonRatio, YieldStress, HardeningSlope.
///
/// Internal variables: EquivalentPlasticStrain.
///
/// The yield function is `f = σd - (σy + H p)` and the stress is updated by the radial return.
pub struct VonMises {
    /// Elastic modulus
    modulus: ElasticModulus,

    /// Stress (trial and updated)
    sigma: Tensor2,

    /// Deviatoric stress: s = dev(σ)
    s: Tensor2,

    /// Hypothesis of the allocated tensors
    hypothesis: Hypothesis,

    /// Plastic multiplier of the last update (zero if elastic)
    lambda: f64,

    /// von Mises stress of the trial state
    sigma_d_trial: f64,
}

impl VonMises {
    /// Allocates a new instance
    pub fn new() -> Self {
        let hypothesis = Hypothesis::Tridimensional;
        VonMises {
            modulus: ElasticModulus::new(),
            sigma: Tensor2::new(hypothesis.mandel()),
            s: Tensor2::new(hypothesis.mandel()),
            hypothesis,
            lambda: 0.0,
            sigma_d_trial: 0.0,
        }
    }

    /// Re-allocates the tensors if the hypothesis changes
    fn resize(&mut self, hypothesis: Hypothesis) {
        if hypothesis.mandel() != self.hypothesis.mandel() {
            self.sigma = Tensor2::new(hypothesis.mandel());
            self.s = Tensor2::new(hypothesis.mandel());
        }
        self.hypothesis = hypothesis;
    }

    /// Computes the elastoplastic modulus from the current stress `self.sigma`
    ///
    /// With `consistent`, the algorithmic modulus of the radial return is computed;
    /// otherwise the continuum elastoplastic modulus.
    fn elastoplastic_modulus(&mut self, dd: &mut Matrix, kk: f64, gg: f64, hh: f64, consistent: bool) {
        self.sigma.deviator(&mut self.s); // s = dev(σ)
        let sigma_d = self.sigma.invariant_sigma_d();
        let norm_s = sigma_d * SQRT_2_BY_3;
        let d = 3.0 * gg + hh;
        let (a, b) = if consistent {
            let lambda = self.lambda;
            let sigma_d_trial = self.sigma_d_trial;
            (
                2.0 * gg * (1.0 - lambda * 3.0 * gg / sigma_d_trial),
                6.0 * gg * gg * (lambda / sigma_d_trial - 1.0 / d) / (norm_s * norm_s),
            )
        } else {
            (2.0 * gg, -6.0 * gg * gg / (d * norm_s * norm_s))
        };
        let n = self.hypothesis.n_stensor();
        let s = self.s.vector();
        for i in 0..n {
            for j in 0..n {
                dd.set(i, j, a * PSD[i][j] + b * s[i] * s[j] + kk * I[i] * I[j]);
            }
        }
    }
}

impl Behaviour for VonMises {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::SmallStrain
    }

    fn n_internal_variables(&self, _hypothesis: Hypothesis) -> usize {
        1 // [p]
    }

    fn internal_variable_names(&self, _hypothesis: Hypothesis) -> Vec<String> {
        vec!["EquivalentPlasticStrain".to_string()]
    }

    fn material_property_names(&self) -> Vec<String> {
        vec![
            "YoungModulus".to_string(),
            "PoissonRatio".to_string(),
            "YieldStress".to_string(),
            "HardeningSlope".to_string(),
        ]
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        s1: &mut Vector,
        iv1: &mut Vector,
        input: &BehaviourInput,
    ) -> Result<(), StrError> {
        let young = material_property(input.mprops, 0)?;
        let poisson = material_property(input.mprops, 1)?;
        let sy = material_property(input.mprops, 2)?;
        let hh = material_property(input.mprops, 3)?;
        if sy <= 0.0 {
            return Err("YieldStress must be > 0.0");
        }
        self.resize(input.hypothesis);
        let n = input.hypothesis.n_stensor();

        // trial stress: σ_trial = σ0 + D : Δε
        let model = self.modulus.get(young, poisson, input.hypothesis)?;
        let (kk, gg) = model.get_bulk_shear();
        if 3.0 * gg + hh <= 0.0 {
            return Err("HardeningSlope must be > -3G");
        }
        let dd = model.get_modulus().matrix();
        {
            let vec = self.sigma.vector_mut();
            vec.fill(0.0);
            for i in 0..n {
                vec[i] = input.s0[i];
                for j in 0..n {
                    vec[i] += dd.get(i, j) * (input.e1[j] - input.e0[j]);
                }
            }
        }

        // elastic update
        let p0 = input.iv0[P0];
        let sigma_d_trial = self.sigma.invariant_sigma_d();
        let f_trial = sigma_d_trial - (sy + hh * p0);
        self.lambda = 0.0;
        self.sigma_d_trial = sigma_d_trial;
        if f_trial > 0.0 {
            // elastoplastic update: σ_new = m s_trial + σm_trial I
            let sigma_m_trial = self.sigma.invariant_sigma_m();
            let lambda = f_trial / (3.0 * gg + hh);
            let m = 1.0 - lambda * 3.0 * gg / sigma_d_trial;
            self.sigma.deviator(&mut self.s);
            let nd = self.sigma.dim();
            let s_trial = self.s.vector();
            let vec = self.sigma.vector_mut();
            for i in 0..nd {
                vec[i] = m * s_trial[i] + sigma_m_trial * I[i];
            }
            self.lambda = lambda;
        }
        let sig = self.sigma.vector();
        for i in 0..n {
            s1[i] = sig[i];
        }
        iv1[P0] = p0 + self.lambda;

        // stiffness
        let loading = self.lambda > 0.0;
        match input.stiffness {
            StiffnessKind::NoStiffness => (),
            StiffnessKind::Elastic | StiffnessKind::SecantOperator => copy_modulus(kt, model, n),
            StiffnessKind::TangentOperator => {
                if loading {
                    self.elastoplastic_modulus(kt, kk, gg, hh, false);
                } else {
                    copy_modulus(kt, model, n);
                }
            }
            StiffnessKind::ConsistentTangentOperator => {
                if loading {
                    self.elastoplastic_modulus(kt, kk, gg, hh, true);
                } else {
                    copy_modulus(kt, model, n);
                }
            }
        }
        Ok(())
    }

    fn compute_prediction_operator(&mut self, kp: &mut Matrix, input: &BehaviourInput) -> Result<(), StrError> {
        let young = material_property(input.mprops, 0)?;
        let poisson = material_property(input.mprops, 1)?;
        let sy = material_property(input.mprops, 2)?;
        let hh = material_property(input.mprops, 3)?;
        self.resize(input.hypothesis);
        let n = input.hypothesis.n_stensor();
        let model = self.modulus.get(young, poisson, input.hypothesis)?;
        let (kk, gg) = model.get_bulk_shear();
        if input.stiffness != StiffnessKind::TangentOperator {
            copy_modulus(kp, model, n);
            return Ok(());
        }

        // continuum modulus if the initial stress lies on the yield surface
        {
            let vec = self.sigma.vector_mut();
            vec.fill(0.0);
            for i in 0..n {
                vec[i] = input.s0[i];
            }
        }
        let f = self.sigma.invariant_sigma_d() - (sy + hh * input.iv0[P0]);
        if f >= -1e-10 * sy {
            self.elastoplastic_modulus(kp, kk, gg, hh, false);
        } else {
            copy_modulus(kp, self.modulus.get(young, poisson, input.hypothesis)?, n);
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::VonMises;
    use crate::base::{Hypothesis, StiffnessKind};
    use crate::material::{Behaviour, BehaviourInput};
    use russell_lab::{approx_eq, Matrix, Vector};

    #[test]
    fn integrate_works_plane_strain() {
        let mut model = VonMises::new();
        let h = Hypothesis::PlaneStrain;
        let (young, poisson, sy, hh) = (1500.0, 0.25, 9.0, 800.0);
        let gg = young / (2.0 * (1.0 + poisson));
        let rotation = Matrix::from(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let mprops = Vector::from(&[young, poisson, sy, hh]);
        let (esv0, desv) = (Vector::new(0), Vector::new(0));
        let mut kt = Matrix::new(4, 4);
        let mut s1 = Vector::new(4);
        let mut iv1 = Vector::new(1);

        // elastic step: pure shear below the yield stress (σd = √3 |τ|)
        let e0 = Vector::new(4);
        let tau = 0.5 * sy / f64::sqrt(3.0);
        let gamma = tau / gg; // engineering shear
        let mut e1 = Vector::new(4);
        e1[3] = gamma / f64::sqrt(2.0); // Mandel component
        let s0 = Vector::new(4);
        let iv0 = Vector::new(1);
        let input = BehaviourInput {
            hypothesis: h,
            rotation: &rotation,
            e0: &e0,
            e1: &e1,
            s0: &s0,
            mprops: &mprops,
            iv0: &iv0,
            esv0: &esv0,
            desv: &desv,
            dt: 1.0,
            stiffness: StiffnessKind::ConsistentTangentOperator,
        };
        model.integrate(&mut kt, &mut s1, &mut iv1, &input).unwrap();
        approx_eq(s1[3], tau * f64::sqrt(2.0), 1e-12);
        assert_eq!(iv1[0], 0.0);
        approx_eq(kt.get(3, 3), 2.0 * gg, 1e-12);

        // plastic step: pure shear beyond the yield stress
        let e1 = Vector::from(&[0.0, 0.0, 0.0, 4.0 * gamma / f64::sqrt(2.0)]);
        let input = BehaviourInput { e1: &e1, ..input };
        model.integrate(&mut kt, &mut s1, &mut iv1, &input).unwrap();
        let sigma_d_trial = 4.0 * 0.5 * sy;
        let lambda = (sigma_d_trial - sy) / (3.0 * gg + hh);
        approx_eq(iv1[0], lambda, 1e-14);
        let sigma_d = f64::sqrt(3.0) * s1[3] / f64::sqrt(2.0);
        approx_eq(sigma_d, sy + hh * lambda, 1e-10);

        // consistent modulus vs numerical derivative of the shear component
        let delta = 1e-7;
        let mut ep = e1.clone();
        ep[3] += delta;
        let mut sp = Vector::new(4);
        let input_p = BehaviourInput {
            e1: &ep,
            stiffness: StiffnessKind::NoStiffness,
            ..input
        };
        model.integrate(&mut kt.clone(), &mut sp, &mut iv1.clone(), &input_p).unwrap();
        let mut em = e1.clone();
        em[3] -= delta;
        let mut sm = Vector::new(4);
        let input_m = BehaviourInput {
            e1: &em,
            stiffness: StiffnessKind::NoStiffness,
            ..input
        };
        model.integrate(&mut kt.clone(), &mut sm, &mut iv1.clone(), &input_m).unwrap();
        model.integrate(&mut kt, &mut s1, &mut iv1, &input).unwrap();
        approx_eq(kt.get(3, 3), (sp[3] - sm[3]) / (2.0 * delta), 1e-4);
    }

    #[test]
    fn prediction_operator_works() {
        let mut model = VonMises::new();
        let h = Hypothesis::Tridimensional;
        let (young, poisson, sy, hh) = (1500.0, 0.25, 9.0, 0.0);
        let rotation = Matrix::from(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let mprops = Vector::from(&[young, poisson, sy, hh]);
        let (esv0, desv) = (Vector::new(0), Vector::new(0));
        let e0 = Vector::new(6);
        let s0 = Vector::from(&[sy, 0.0, 0.0, 0.0, 0.0, 0.0]); // on the yield surface
        let iv0 = Vector::new(1);
        let mut kp = Matrix::new(6, 6);
        let input = BehaviourInput {
            hypothesis: h,
            rotation: &rotation,
            e0: &e0,
            e1: &e0,
            s0: &s0,
            mprops: &mprops,
            iv0: &iv0,
            esv0: &esv0,
            desv: &desv,
            dt: 1.0,
            stiffness: StiffnessKind::Elastic,
        };
        model.compute_prediction_operator(&mut kp, &input).unwrap();
        approx_eq(kp.get(0, 0), 1800.0, 1e-12);

        // perfect plasticity: the uniaxial tangent in the loading direction vanishes
        let input = BehaviourInput {
            stiffness: StiffnessKind::TangentOperator,
            ..input
        };
        model.compute_prediction_operator(&mut kp, &input).unwrap();
        assert!(kp.get(0, 0) < 1800.0);
        approx_eq(kp.get(3, 3), 1200.0, 1e-12);
    }
}
