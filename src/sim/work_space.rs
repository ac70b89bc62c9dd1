use russell_lab::{Matrix, Vector};

/// Holds the buffers of the Newton solver
///
/// All buffers are allocated once per run and reused by every iteration of every step.
pub struct WorkSpace {
    /// Global Jacobian matrix (n × n)
    pub kk: Matrix,

    /// Copy of the Jacobian matrix destroyed by the LU factorization (n × n)
    pub kk_lu: Matrix,

    /// Stiffness computed by the behaviour (nth × ndv)
    pub kt: Matrix,

    /// Stiffness computed by central differences (nth × ndv)
    pub nkt: Matrix,

    /// Prediction operator (nth × ndv)
    pub kp: Matrix,

    /// Residual vector (n)
    pub rr: Vector,

    /// Increment (solution of the linear system) (n)
    pub du: Vector,

    /// Perturbed driving variables (ndv)
    pub e_pert: Vector,

    /// Thermodynamic forces of the perturbed state (nth)
    pub s_pert: Vector,

    /// Internal variables of the perturbed state (niv)
    pub iv_pert: Vector,

    /// Normalisation factor of the Lagrange multipliers
    pub a: f64,

    /// Indicates that the normalisation factor must be computed at the next assembly
    pub first_assembly: bool,
}

impl WorkSpace {
    /// Allocates a new instance
    pub fn new(ndv: usize, n_multipliers: usize, nth: usize, niv: usize) -> Self {
        let n = ndv + n_multipliers;
        WorkSpace {
            kk: Matrix::new(n, n),
            kk_lu: Matrix::new(n, n),
            kt: Matrix::new(nth, ndv),
            nkt: Matrix::new(nth, ndv),
            kp: Matrix::new(nth, ndv),
            rr: Vector::new(n),
            du: Vector::new(n),
            e_pert: Vector::new(ndv),
            s_pert: Vector::new(nth),
            iv_pert: Vector::new(niv),
            a: 1.0,
            first_assembly: true,
        }
    }

    /// Freezes the normalisation factor `a = max |Kij|` (or 1 if K is zero) at the first call
    pub fn freeze_normalisation_factor(&mut self) {
        if !self.first_assembly {
            return;
        }
        let (nrow, ncol) = self.kk.dims();
        let mut a: f64 = 0.0;
        for i in 0..nrow {
            for j in 0..ncol {
                a = f64::max(a, f64::abs(self.kk.get(i, j)));
            }
        }
        self.a = if a > 0.0 && a.is_finite() { a } else { 1.0 };
        self.first_assembly = false;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
