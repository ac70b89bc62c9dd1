use super::{parse_positive, AccelerationTrait};
use crate::StrError;
use russell_lab::{vec_inner, Vector};

/// Defines the default iteration from which the crossed secant acceleration is applied
pub const CROSSED_SECANT_DEFAULT_TRIGGER: usize = 4;

/// Defines the default number of iterations between two crossed secant accelerations
pub const CROSSED_SECANT_DEFAULT_PERIOD: usize = 2;

/// Implements the crossed secant (Cast3M) acceleration
///
/// The last three estimates `u₀, u₁, u₂` and the residuals `r₀, r₁, r₂` that produced them
/// are kept. The combination `r₀ + c₀ (r₁ - r₀) + c₁ (r₂ - r₀)` of minimum norm is found by
/// orthonormalizing the two residual differences, and the same combination is applied to the
/// estimates:
///
/// ```text
/// u ← (1 - c₀ - c₁) u₀ + c₀ u₁ + c₁ u₂
/// ```
///
/// If the two differences are almost colinear, only the first one is used.
///
/// Parameters: `AccelerationTrigger` (default 4) and `AccelerationPeriod` (default 2).
pub struct CrossedSecant {
    trigger: usize,
    period: usize,
    uu: [Vector; 3],
    rr: [Vector; 3],
    tmp0: Vector,
    tmp1: Vector,
    count: usize,
}

impl CrossedSecant {
    /// Allocates a new instance
    pub fn new() -> Self {
        CrossedSecant {
            trigger: CROSSED_SECANT_DEFAULT_TRIGGER,
            period: CROSSED_SECANT_DEFAULT_PERIOD,
            uu: [Vector::new(0), Vector::new(0), Vector::new(0)],
            rr: [Vector::new(0), Vector::new(0), Vector::new(0)],
            tmp0: Vector::new(0),
            tmp1: Vector::new(0),
            count: 0,
        }
    }

    /// Stores the newest pair, discarding the oldest one
    fn push(&mut self, u: &Vector, rr: &Vector) {
        self.uu.rotate_left(1);
        self.rr.rotate_left(1);
        let n = u.dim();
        for i in 0..n {
            self.uu[2][i] = u[i];
            self.rr[2][i] = rr[i];
        }
        self.count += 1;
    }
}

impl AccelerationTrait for CrossedSecant {
    fn name(&self) -> &'static str {
        "CrossedSecant"
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        match key {
            "AccelerationTrigger" => {
                self.trigger = parse_positive(value, "AccelerationTrigger must be an integer ≥ 1")?
            }
            "AccelerationPeriod" => {
                self.period = parse_positive(value, "AccelerationPeriod must be an integer ≥ 1")?
            }
            _ => return Err("unknown parameter of the crossed secant algorithm"),
        }
        Ok(())
    }

    fn initialize(&mut self, n: usize) -> Result<(), StrError> {
        self.uu = [Vector::new(n), Vector::new(n), Vector::new(n)];
        self.rr = [Vector::new(n), Vector::new(n), Vector::new(n)];
        self.tmp0 = Vector::new(n);
        self.tmp1 = Vector::new(n);
        self.count = 0;
        Ok(())
    }

    fn pre_step(&mut self) {
        self.count = 0;
    }

    fn execute(&mut self, u: &mut Vector, _du: &Vector, rr: &Vector, _eeps: f64, seps: f64, iteration: usize) -> bool {
        self.push(u, rr);
        if iteration < self.trigger || (iteration - self.trigger) % self.period != 0 || self.count < 3 {
            return false;
        }
        let n = u.dim();
        let tol = 100.0 * seps * f64::EPSILON;

        // first direction
        for i in 0..n {
            self.tmp0[i] = self.rr[1][i] - self.rr[0][i];
            self.tmp1[i] = self.rr[2][i] - self.rr[0][i];
        }
        let nr0 = f64::sqrt(vec_inner(&self.tmp0, &self.tmp0));
        if nr0 <= tol {
            return false;
        }
        for i in 0..n {
            self.tmp0[i] /= nr0; // n₀
        }
        let p0 = -vec_inner(&self.rr[0], &self.tmp0);

        // second direction, orthogonal to the first one
        let ntmp1 = vec_inner(&self.tmp1, &self.tmp0);
        for i in 0..n {
            self.tmp1[i] -= ntmp1 * self.tmp0[i];
        }
        let nr1 = f64::sqrt(vec_inner(&self.tmp1, &self.tmp1));
        if nr1 > 0.1 * f64::abs(ntmp1) && nr1 > tol {
            for i in 0..n {
                self.tmp1[i] /= nr1; // n₁
            }
            let p1 = -vec_inner(&self.rr[0], &self.tmp1);
            let c0 = p0 / nr0 - p1 * ntmp1 / (nr1 * nr0);
            let c1 = p1 / nr1;
            for i in 0..n {
                u[i] = (1.0 - c0 - c1) * self.uu[0][i] + c0 * self.uu[1][i] + c1 * self.uu[2][i];
            }
        } else {
            // colinear differences
            let c0 = p0 / nr0;
            for i in 0..n {
                u[i] = (1.0 - c0) * self.uu[0][i] + c0 * self.uu[1][i];
            }
        }
        true
    }

    fn post_step(&mut self) {}
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::CrossedSecant;
    use crate::acceleration::AccelerationTrait;
    use russell_lab::{vec_approx_eq, Vector};

    #[test]
    fn set_parameter_captures_errors() {
        let mut aa = CrossedSecant::new();
        assert_eq!(aa.name(), "CrossedSecant");
        assert_eq!(
            aa.set_parameter("AccelerationPeriod", "0").err(),
            Some("AccelerationPeriod must be an integer ≥ 1")
        );
        assert_eq!(
            aa.set_parameter("AccelerationTrigger", "-4").err(),
            Some("AccelerationTrigger must be an integer ≥ 1")
        );
        assert_eq!(
            aa.set_parameter("Nmax", "4").err(),
            Some("unknown parameter of the crossed secant algorithm")
        );
    }

    #[test]
    fn crossed_secant_cancels_the_residual_combination() {
        let mut aa = CrossedSecant::new();
        aa.set_parameter("AccelerationTrigger", "3").unwrap();
        aa.initialize(2).unwrap();
        aa.pre_step();
        let du = Vector::new(2);
        let mut u = Vector::from(&[0.0, 0.0]);
        assert_eq!(aa.execute(&mut u, &du, &Vector::from(&[1.0, 0.0]), 1e-8, 1e-3, 1), false);
        let mut u = Vector::from(&[1.0, 0.0]);
        assert_eq!(aa.execute(&mut u, &du, &Vector::from(&[0.0, 1.0]), 1e-8, 1e-3, 2), false);
        let mut u = Vector::from(&[0.0, 1.0]);
        assert_eq!(aa.execute(&mut u, &du, &Vector::from(&[1.0, 1.0]), 1e-8, 1e-3, 3), true);
        // r₀ + 1 (r₁ - r₀) - 1 (r₂ - r₀) = 0
        vec_approx_eq(&u, &[1.0, -1.0], 1e-14);
    }

    #[test]
    fn crossed_secant_handles_colinear_residuals() {
        let mut aa = CrossedSecant::new();
        aa.set_parameter("AccelerationTrigger", "3").unwrap();
        aa.initialize(1).unwrap();
        aa.pre_step();
        let du = Vector::new(1);
        // g(x) = 0.5 x + 1 with r = x - g(x) = 0.5 x - 1
        let mut u = Vector::from(&[0.0]);
        aa.execute(&mut u, &du, &Vector::from(&[-1.0]), 1e-8, 1e-3, 1);
        let mut u = Vector::from(&[1.0]);
        aa.execute(&mut u, &du, &Vector::from(&[-0.5]), 1e-8, 1e-3, 2);
        let mut u = Vector::from(&[1.5]);
        assert_eq!(aa.execute(&mut u, &du, &Vector::from(&[-0.25]), 1e-8, 1e-3, 3), true);
        vec_approx_eq(&u, &[2.0], 1e-14);
    }

    #[test]
    fn period_and_history_length_are_respected() {
        let mut aa = CrossedSecant::new();
        aa.initialize(1).unwrap();
        aa.pre_step();
        let du = Vector::new(1);
        let rr = Vector::from(&[1.0]);
        for iteration in 1..4 {
            let mut u = Vector::from(&[iteration as f64]);
            assert_eq!(aa.execute(&mut u, &du, &rr, 1e-8, 1e-3, iteration), false);
        }
        aa.pre_step();
        let mut u = Vector::from(&[0.0]);
        assert_eq!(aa.execute(&mut u, &du, &rr, 1e-8, 1e-3, 4), false); // only one pair
        assert_eq!(aa.execute(&mut u, &du, &rr, 1e-8, 1e-3, 5), false); // off period
    }
}
