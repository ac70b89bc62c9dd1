use super::{material_property, Behaviour, BehaviourInput};
use crate::base::{BehaviourKind, Hypothesis, StiffnessKind};
use crate::StrError;
use russell_lab::{Matrix, Vector};
use std::f64::consts::SQRT_2;

type Mat3 = [[f64; 3]; 3];

/// Implements the Saint Venant-Kirchhoff hyperelastic model
///
/// Material properties: YoungModulus, PoissonRatio.
///
/// ```text
/// E = ½ (Fᵀ F - I)
/// S = λ tr(E) I + 2 μ E
/// σ = J⁻¹ F S Fᵀ
/// ```
///
/// The tangent operator is the derivative of the Cauchy stress with respect to the
/// deformation gradient (dσ/dF). The Cauchy stress is returned in Mandel representation.
pub struct SaintVenantKirchhoff {}

impl SaintVenantKirchhoff {
    /// Allocates a new instance
    pub fn new() -> Self {
        SaintVenantKirchhoff {}
    }
}

/// Builds the 3×3 deformation gradient from its components
fn unpack(hypothesis: Hypothesis, f: &Vector) -> Mat3 {
    let mut ff = [[0.0; 3]; 3];
    for (k, (i, j)) in hypothesis.tensor_pairs().iter().enumerate() {
        ff[*i][*j] = f[k];
    }
    ff
}

fn determinant(a: &Mat3) -> f64 {
    a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1]) - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
}

/// Computes the inverse matrix (the determinant must be non-zero)
fn inverse(a: &Mat3, det: f64) -> Mat3 {
    let mut ai = [[0.0; 3]; 3];
    ai[0][0] = (a[1][1] * a[2][2] - a[1][2] * a[2][1]) / det;
    ai[0][1] = (a[0][2] * a[2][1] - a[0][1] * a[2][2]) / det;
    ai[0][2] = (a[0][1] * a[1][2] - a[0][2] * a[1][1]) / det;
    ai[1][0] = (a[1][2] * a[2][0] - a[1][0] * a[2][2]) / det;
    ai[1][1] = (a[0][0] * a[2][2] - a[0][2] * a[2][0]) / det;
    ai[1][2] = (a[0][2] * a[1][0] - a[0][0] * a[1][2]) / det;
    ai[2][0] = (a[1][0] * a[2][1] - a[1][1] * a[2][0]) / det;
    ai[2][1] = (a[0][1] * a[2][0] - a[0][0] * a[2][1]) / det;
    ai[2][2] = (a[0][0] * a[1][1] - a[0][1] * a[1][0]) / det;
    ai
}

/// Computes c = a · b
fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut c = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                c[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    c
}

/// Computes c = a · bᵀ
fn mul_t(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut c = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                c[i][j] += a[i][k] * b[j][k];
            }
        }
    }
    c
}

/// Computes c = aᵀ · b
fn t_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut c = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                c[i][j] += a[k][i] * b[k][j];
            }
        }
    }
    c
}

/// Computes the second Piola-Kirchhoff stress from the Green-Lagrange strain
fn piola_kirchhoff(ee: &Mat3, lambda: f64, mu: f64) -> Mat3 {
    let tr = ee[0][0] + ee[1][1] + ee[2][2];
    let mut ss = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            ss[i][j] = 2.0 * mu * ee[i][j];
        }
        ss[i][i] += lambda * tr;
    }
    ss
}

/// Writes a symmetric 3×3 matrix in Mandel representation
fn pack(hypothesis: Hypothesis, a: &Mat3, v: &mut Vector) {
    for (k, (p, q)) in hypothesis.stensor_pairs().iter().enumerate() {
        let m = if k < 3 { 1.0 } else { SQRT_2 };
        v[k] = m * a[*p][*q];
    }
}

/// Writes a symmetric 3×3 matrix in Mandel representation into the column of a matrix
fn pack_column(hypothesis: Hypothesis, a: &Mat3, kt: &mut Matrix, col: usize) {
    for (k, (p, q)) in hypothesis.stensor_pairs().iter().enumerate() {
        let m = if k < 3 { 1.0 } else { SQRT_2 };
        kt.set(k, col, m * a[*p][*q]);
    }
}

impl Behaviour for SaintVenantKirchhoff {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::FiniteStrain
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
        if young <= 0.0 {
            return Err("YoungModulus must be > 0.0");
        }
        if poisson <= -1.0 || poisson >= 0.5 {
            return Err("PoissonRatio must be in (-1.0, 0.5)");
        }
        let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        let mu = young / (2.0 * (1.0 + poisson));
        let h = input.hypothesis;

        // kinematics
        let ff = unpack(h, input.e1);
        let jj = determinant(&ff);
        if jj <= 0.0 {
            return Err("the determinant of the deformation gradient must be positive");
        }
        let c = t_mul(&ff, &ff);
        let mut ee = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                ee[i][j] = 0.5 * c[i][j];
            }
            ee[i][i] -= 0.5;
        }
        let ss = piola_kirchhoff(&ee, lambda, mu);

        // σ = J⁻¹ F S Fᵀ
        let fs = mul(&ff, &ss);
        let mut sigma = mul_t(&fs, &ff);
        for i in 0..3 {
            for j in 0..3 {
                sigma[i][j] /= jj;
            }
        }
        pack(h, &sigma, s1);
        if input.stiffness == StiffnessKind::NoStiffness {
            return Ok(());
        }

        // dσ = -tr(F⁻¹ dF) σ + J⁻¹ (dF S Fᵀ + F dS Fᵀ + F S dFᵀ)
        let fi = inverse(&ff, jj);
        for (col, (a, b)) in h.tensor_pairs().iter().enumerate() {
            let mut df = [[0.0; 3]; 3];
            df[*a][*b] = 1.0;
            let tr = fi[*b][*a]; // tr(F⁻¹ dF)
            let dc = {
                let x = t_mul(&df, &ff);
                let y = t_mul(&ff, &df);
                let mut z = [[0.0; 3]; 3];
                for i in 0..3 {
                    for j in 0..3 {
                        z[i][j] = 0.5 * (x[i][j] + y[i][j]);
                    }
                }
                z
            };
            let dss = piola_kirchhoff(&dc, lambda, mu);
            let t1 = mul_t(&mul(&df, &ss), &ff);
            let t2 = mul_t(&mul(&ff, &dss), &ff);
            let t3 = mul_t(&fs, &df);
            let mut dsigma = [[0.0; 3]; 3];
            for i in 0..3 {
                for j in 0..3 {
                    dsigma[i][j] = -tr * sigma[i][j] + (t1[i][j] + t2[i][j] + t3[i][j]) / jj;
                }
            }
            pack_column(h, &dsigma, kt, col);
        }
        Ok(())
    }

    fn compute_prediction_operator(&mut self, kp: &mut Matrix, input: &BehaviourInput) -> Result<(), StrError> {
        let mut s = Vector::new(input.hypothesis.n_stensor());
        let mut iv = Vector::new(0);
        let input_0 = BehaviourInput {
            e1: input.e0,
            stiffness: StiffnessKind::ConsistentTangentOperator,
            ..*input
        };
        self.integrate(kp, &mut s, &mut iv, &input_0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
