use super::{parse_positive, AccelerationTrait};
use crate::base::DEGENERATE_SQUARED_NORM;
use crate::StrError;
use russell_lab::{vec_inner, Matrix, Vector};

/// Defines the default iteration from which the secant-type accelerations are applied
pub const SECANT_DEFAULT_TRIGGER: usize = 2;

/// Implements the Broyden (second method) acceleration
///
/// The fixed-point map is `G(x) = x - δu(x)` with correction `f(x) = G(x) - x`. An approximation
/// `H` of the inverse Jacobian of `f` starts at `-I` (plain fixed-point iteration) and is updated
/// by the rank-one formula
///
/// ```text
/// H ← H + (s - H y) yᵀ / (yᵀ y)
/// ```
///
/// with `s` and `y` the differences of the last two iterates and corrections. The new estimate
/// is `x - H f(x)`.
///
/// Parameters: `AccelerationTrigger` (default 2).
pub struct Broyden {
    trigger: usize,
    hh: Matrix,
    x: Vector,
    f: Vector,
    x_prev: Vector,
    f_prev: Vector,
    s: Vector,
    y: Vector,
    hy: Vector,
    n_pairs: usize,
}

impl Broyden {
    /// Allocates a new instance
    pub fn new() -> Self {
        Broyden {
            trigger: SECANT_DEFAULT_TRIGGER,
            hh: Matrix::new(0, 0),
            x: Vector::new(0),
            f: Vector::new(0),
            x_prev: Vector::new(0),
            f_prev: Vector::new(0),
            s: Vector::new(0),
            y: Vector::new(0),
            hy: Vector::new(0),
            n_pairs: 0,
        }
    }
}

impl AccelerationTrait for Broyden {
    fn name(&self) -> &'static str {
        "Broyden"
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        match key {
            "AccelerationTrigger" => {
                self.trigger = parse_positive(value, "AccelerationTrigger must be an integer ≥ 1")?;
                Ok(())
            }
            _ => Err("unknown parameter of the Broyden algorithm"),
        }
    }

    fn initialize(&mut self, n: usize) -> Result<(), StrError> {
        self.hh = Matrix::new(n, n);
        self.x = Vector::new(n);
        self.f = Vector::new(n);
        self.x_prev = Vector::new(n);
        self.f_prev = Vector::new(n);
        self.s = Vector::new(n);
        self.y = Vector::new(n);
        self.hy = Vector::new(n);
        self.pre_step();
        Ok(())
    }

    fn pre_step(&mut self) {
        let n = self.x.dim();
        self.hh.fill(0.0);
        for i in 0..n {
            self.hh.set(i, i, -1.0);
        }
        self.n_pairs = 0;
    }

    fn execute(&mut self, u: &mut Vector, du: &Vector, _rr: &Vector, _eeps: f64, _seps: f64, iteration: usize) -> bool {
        let n = self.x.dim();

        // iterate at which the correction has been computed
        for i in 0..n {
            self.x[i] = u[i] + du[i];
            self.f[i] = -du[i];
        }

        // rank-one update
        let mut updated = false;
        if self.n_pairs > 0 {
            for i in 0..n {
                self.s[i] = self.x[i] - self.x_prev[i];
                self.y[i] = self.f[i] - self.f_prev[i];
            }
            let yy = vec_inner(&self.y, &self.y);
            if yy > DEGENERATE_SQUARED_NORM {
                for i in 0..n {
                    self.hy[i] = 0.0;
                    for j in 0..n {
                        self.hy[i] += self.hh.get(i, j) * self.y[j];
                    }
                }
                for i in 0..n {
                    for j in 0..n {
                        let hij = self.hh.get(i, j) + (self.s[i] - self.hy[i]) * self.y[j] / yy;
                        self.hh.set(i, j, hij);
                    }
                }
                updated = true;
            }
        }
        std::mem::swap(&mut self.x, &mut self.x_prev);
        std::mem::swap(&mut self.f, &mut self.f_prev);
        self.n_pairs += 1;

        // new estimate: x - H f
        if !updated || iteration < self.trigger {
            return false;
        }
        for i in 0..n {
            u[i] = self.x_prev[i];
            for j in 0..n {
                u[i] -= self.hh.get(i, j) * self.f_prev[j];
            }
        }
        true
    }

    fn post_step(&mut self) {}
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
