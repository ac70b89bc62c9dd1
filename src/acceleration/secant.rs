use super::{parse_positive, AccelerationTrait, SECANT_DEFAULT_TRIGGER};
use crate::base::DEGENERATE_SQUARED_NORM;
use crate::StrError;
use russell_lab::Vector;

/// Implements the secant acceleration and its alternate variant
///
/// With `xₖ` the estimate after the Newton correction and `fₖ = -δuₖ`:
///
/// ```text
/// θ = fₖ · (fₖ - fₖ₋₁) / ‖fₖ - fₖ₋₁‖²
/// x ← xₖ - θ (xₖ - xₖ₋₁)
/// ```
///
/// The alternate variant applies the correction every other iteration only.
///
/// Parameters: `AccelerationTrigger` (default 2).
pub struct Secant {
    alternate: bool,
    trigger: usize,
    x: Vector,
    f: Vector,
    x_prev: Vector,
    f_prev: Vector,
    n_pairs: usize,
}

impl Secant {
    /// Allocates a new instance
    pub fn new() -> Self {
        Secant {
            alternate: false,
            trigger: SECANT_DEFAULT_TRIGGER,
            x: Vector::new(0),
            f: Vector::new(0),
            x_prev: Vector::new(0),
            f_prev: Vector::new(0),
            n_pairs: 0,
        }
    }

    /// Allocates a new instance of the alternate variant
    pub fn new_alternate() -> Self {
        Secant {
            alternate: true,
            ..Secant::new()
        }
    }
}

impl AccelerationTrait for Secant {
    fn name(&self) -> &'static str {
        if self.alternate {
            "AlternateSecant"
        } else {
            "Secant"
        }
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        match key {
            "AccelerationTrigger" => {
                self.trigger = parse_positive(value, "AccelerationTrigger must be an integer ≥ 1")?;
                Ok(())
            }
            _ => Err("unknown parameter of the secant algorithm"),
        }
    }

    fn initialize(&mut self, n: usize) -> Result<(), StrError> {
        self.x = Vector::new(n);
        self.f = Vector::new(n);
        self.x_prev = Vector::new(n);
        self.f_prev = Vector::new(n);
        self.n_pairs = 0;
        Ok(())
    }

    fn pre_step(&mut self) {
        self.n_pairs = 0;
    }

    fn execute(&mut self, u: &mut Vector, du: &Vector, _rr: &Vector, _eeps: f64, _seps: f64, iteration: usize) -> bool {
        let n = self.x.dim();
        for i in 0..n {
            self.x[i] = u[i];
            self.f[i] = -du[i];
        }
        let active = iteration >= self.trigger && (!self.alternate || (iteration - self.trigger) % 2 == 0);
        let mut applied = false;
        if self.n_pairs > 0 && active {
            let mut num = 0.0;
            let mut den = 0.0;
            for i in 0..n {
                let df = self.f[i] - self.f_prev[i];
                num += self.f[i] * df;
                den += df * df;
            }
            if den > DEGENERATE_SQUARED_NORM {
                let theta = num / den;
                for i in 0..n {
                    u[i] = self.x[i] - theta * (self.x[i] - self.x_prev[i]);
                }
                applied = true;
            }
        }
        std::mem::swap(&mut self.x, &mut self.x_prev);
        std::mem::swap(&mut self.f, &mut self.f_prev);
        self.n_pairs += 1;
        applied
    }

    fn post_step(&mut self) {}
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
