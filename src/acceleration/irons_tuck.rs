use super::{parse_positive, AccelerationTrait, SECANT_DEFAULT_TRIGGER};
use crate::base::DEGENERATE_SQUARED_NORM;
use crate::StrError;
use russell_lab::{vec_inner, Vector};

/// Implements the Irons-Tuck acceleration (vector Aitken Δ² process)
///
/// With the last two corrections `δuₖ₋₁` and `δuₖ`:
///
/// ```text
/// Δ = δuₖ - δuₖ₋₁
/// x ← x + (δuₖ · Δ / ‖Δ‖²) δuₖ
/// ```
///
/// Parameters: `AccelerationTrigger` (default 2).
pub struct IronsTuck {
    trigger: usize,
    du_prev: Vector,
    delta: Vector,
    n_pairs: usize,
}

impl IronsTuck {
    /// Allocates a new instance
    pub fn new() -> Self {
        IronsTuck {
            trigger: SECANT_DEFAULT_TRIGGER,
            du_prev: Vector::new(0),
            delta: Vector::new(0),
            n_pairs: 0,
        }
    }
}

impl AccelerationTrait for IronsTuck {
    fn name(&self) -> &'static str {
        "IronsTuck"
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        match key {
            "AccelerationTrigger" => {
                self.trigger = parse_positive(value, "AccelerationTrigger must be an integer ≥ 1")?;
                Ok(())
            }
            _ => Err("unknown parameter of the Irons-Tuck algorithm"),
        }
    }

    fn initialize(&mut self, n: usize) -> Result<(), StrError> {
        self.du_prev = Vector::new(n);
        self.delta = Vector::new(n);
        self.n_pairs = 0;
        Ok(())
    }

    fn pre_step(&mut self) {
        self.n_pairs = 0;
    }

    fn execute(&mut self, u: &mut Vector, du: &Vector, _rr: &Vector, _eeps: f64, _seps: f64, iteration: usize) -> bool {
        let n = self.du_prev.dim();
        let mut applied = false;
        if self.n_pairs > 0 && iteration >= self.trigger {
            for i in 0..n {
                self.delta[i] = du[i] - self.du_prev[i];
            }
            let dd = vec_inner(&self.delta, &self.delta);
            if dd > DEGENERATE_SQUARED_NORM {
                let mut num = 0.0;
                for i in 0..n {
                    num += du[i] * self.delta[i];
                }
                let a = num / dd;
                for i in 0..n {
                    u[i] += a * du[i];
                }
                applied = true;
            }
        }
        for i in 0..n {
            self.du_prev[i] = du[i];
        }
        self.n_pairs += 1;
        applied
    }

    fn post_step(&mut self) {}
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
