use super::{NumericalTangentMismatch, OutputFrequency, PredictionPolicy, StiffnessKind, Verbosity};
use super::{DEFAULT_EEPS, DEFAULT_N_MAX_ITERATIONS, DEFAULT_N_MAX_SUB_STEPS, DEFAULT_REFERENCE_TEMPERATURE};
use super::{DEFAULT_SEPS, TANGENT_PERTURBATION_RATIO, TANGENT_TOLERANCE_RATIO};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the smallest allowed tolerance (Control)
pub const CONTROL_MIN_TOL: f64 = 1e-15;

/// Holds the options to control the time loop and the Newton iterations
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Control {
    /// Tolerance on the driving variables (e.g., strain)
    pub eeps: f64,

    /// Tolerance on the thermodynamic forces (e.g., stress)
    pub seps: f64,

    /// Maximum number of Newton iterations
    pub n_max_iterations: usize,

    /// Maximum number of sub-steps within one loading interval
    pub n_max_sub_steps: usize,

    /// Policy to build the initial guess of each step
    pub prediction: PredictionPolicy,

    /// Kind of stiffness requested from the behaviour (None means the behaviour's default)
    pub stiffness: Option<StiffnessKind>,

    /// Compares the tangent operator to one computed by central differences
    pub compare_to_numerical_tangent: bool,

    /// Perturbation of the central differences (None means 10·eeps)
    pub tangent_perturbation: Option<f64>,

    /// Comparison criterion of the tangent operators (None means 1e10·seps)
    pub tangent_tolerance: Option<f64>,

    /// Reference temperature of the thermal strain
    pub reference_temperature: f64,

    /// Lets the behaviour propose the scaling of the time increment
    pub dynamic_time_step_scaling: bool,

    /// Minimum time increment (dynamic time step scaling)
    pub dt_min: f64,

    /// Maximum time increment (dynamic time step scaling)
    pub dt_max: Option<f64>,

    /// Minimum scaling factor of the time increment (dynamic time step scaling)
    pub rdt_min: f64,

    /// Maximum scaling factor of the time increment (dynamic time step scaling)
    pub rdt_max: f64,

    /// When to hand results to the result sink
    pub output_frequency: OutputFrequency,

    /// Verbosity of the console messages
    pub verbose: Verbosity,
}

impl Control {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Control {
            eeps: DEFAULT_EEPS,
            seps: DEFAULT_SEPS,
            n_max_iterations: DEFAULT_N_MAX_ITERATIONS,
            n_max_sub_steps: DEFAULT_N_MAX_SUB_STEPS,
            prediction: PredictionPolicy::NoPrediction,
            stiffness: None,
            compare_to_numerical_tangent: false,
            tangent_perturbation: None,
            tangent_tolerance: None,
            reference_temperature: DEFAULT_REFERENCE_TEMPERATURE,
            dynamic_time_step_scaling: false,
            dt_min: 0.0,
            dt_max: None,
            rdt_min: 0.1,
            rdt_max: 2.0,
            output_frequency: OutputFrequency::EveryPeriod,
            verbose: Verbosity::Quiet,
        }
    }

    /// Sets the tolerance on the driving variables
    pub fn set_eeps(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < CONTROL_MIN_TOL {
            return Err("eeps must be ≥ 1e-15");
        }
        self.eeps = value;
        Ok(self)
    }

    /// Sets the tolerance on the thermodynamic forces
    pub fn set_seps(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < CONTROL_MIN_TOL {
            return Err("seps must be ≥ 1e-15");
        }
        self.seps = value;
        Ok(self)
    }

    /// Sets the maximum number of Newton iterations
    pub fn set_n_max_iterations(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("n_max_iterations must be ≥ 1");
        }
        self.n_max_iterations = value;
        Ok(self)
    }

    /// Sets the maximum number of sub-steps
    pub fn set_n_max_sub_steps(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("n_max_sub_steps must be ≥ 1");
        }
        self.n_max_sub_steps = value;
        Ok(self)
    }

    /// Enables the comparison to the numerical tangent operator
    pub fn set_compare_to_numerical_tangent(
        &mut self,
        perturbation: Option<f64>,
        tolerance: Option<f64>,
    ) -> Result<&mut Self, StrError> {
        if let Some(v) = perturbation {
            if v <= 0.0 {
                return Err("the tangent perturbation must be > 0.0");
            }
        }
        if let Some(v) = tolerance {
            if v <= 0.0 {
                return Err("the tangent tolerance must be > 0.0");
            }
        }
        self.compare_to_numerical_tangent = true;
        self.tangent_perturbation = perturbation;
        self.tangent_tolerance = tolerance;
        Ok(self)
    }

    /// Enables the dynamic time step scaling
    pub fn set_dynamic_time_step_scaling(&mut self, dt_min: f64, dt_max: Option<f64>) -> Result<&mut Self, StrError> {
        if dt_min < 0.0 {
            return Err("dt_min must be ≥ 0.0");
        }
        if let Some(v) = dt_max {
            if v <= dt_min {
                return Err("dt_max must be > dt_min");
            }
        }
        self.dynamic_time_step_scaling = true;
        self.dt_min = dt_min;
        self.dt_max = dt_max;
        Ok(self)
    }

    /// Returns the perturbation of the central differences
    pub fn tangent_perturbation(&self) -> f64 {
        match self.tangent_perturbation {
            Some(v) => v,
            None => TANGENT_PERTURBATION_RATIO * self.eeps,
        }
    }

    /// Returns the comparison criterion of the tangent operators
    pub fn tangent_tolerance(&self) -> f64 {
        match self.tangent_tolerance {
            Some(v) => v,
            None => TANGENT_TOLERANCE_RATIO * self.seps,
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.eeps < CONTROL_MIN_TOL {
            return Some(format!(
                "eeps = {:?} is incorrect; it must be ≥ {:e}",
                self.eeps, CONTROL_MIN_TOL
            ));
        }
        if self.seps < CONTROL_MIN_TOL {
            return Some(format!(
                "seps = {:?} is incorrect; it must be ≥ {:e}",
                self.seps, CONTROL_MIN_TOL
            ));
        }
        if self.n_max_iterations < 1 {
            return Some(format!(
                "n_max_iterations = {} is incorrect; it must be ≥ 1",
                self.n_max_iterations
            ));
        }
        if self.n_max_sub_steps < 1 {
            return Some(format!(
                "n_max_sub_steps = {} is incorrect; it must be ≥ 1",
                self.n_max_sub_steps
            ));
        }
        if self.tangent_perturbation() <= 0.0 {
            return Some(format!(
                "tangent_perturbation = {:?} is incorrect; it must be > 0.0",
                self.tangent_perturbation()
            ));
        }
        if self.tangent_tolerance() <= 0.0 {
            return Some(format!(
                "tangent_tolerance = {:?} is incorrect; it must be > 0.0",
                self.tangent_tolerance()
            ));
        }
        if self.dt_min < 0.0 {
            return Some(format!("dt_min = {:?} is incorrect; it must be ≥ 0.0", self.dt_min));
        }
        if let Some(dt_max) = self.dt_max {
            if dt_max <= self.dt_min {
                return Some(format!(
                    "dt_max = {:?} is incorrect; it must be > dt_min = {:?}",
                    dt_max, self.dt_min
                ));
            }
        }
        if self.rdt_min <= 0.0 || self.rdt_min >= 1.0 {
            return Some(format!(
                "rdt_min = {:?} is incorrect; it must be 0.0 < rdt_min < 1.0",
                self.rdt_min
            ));
        }
        if self.rdt_max < 1.0 {
            return Some(format!("rdt_max = {:?} is incorrect; it must be ≥ 1.0", self.rdt_max));
        }
        None // all good
    }

    /// Prints the header of the table with time step and iteration data
    #[inline]
    pub fn print_header(&self) {
        if self.verbose >= Verbosity::Level1 {
            println!("Legend:");
            println!("✅ : converged");
            println!("👍 : converging");
            println!("🥵 : diverging");
            println!("😱 : found NaN or Inf\n");
            println!(
                "{:>8} {:>13} {:>13} {:>5} {:>9}   {:>9}   {:>6}",
                "period", "t", "Δt", "iter", "|δu|", "|R|", "order"
            );
        }
    }

    /// Prints time step data
    #[inline]
    #[rustfmt::skip]
    pub fn print_timestep(&self, period: usize, t: f64, dt: f64) {
        if self.verbose < Verbosity::Level1 {
            return;
        }
        println!(
            "{:>8} {:>13.6e} {:>13.6e} {:>5} {:>9}   {:>9}   {:>6}",
            period, t, dt, ".", ".", ".", "."
        );
    }

    /// Prints iteration data
    ///
    /// The order of convergence is only available from the third iteration on.
    #[inline]
    pub fn print_iteration(&self, it: usize, ne: f64, nr: f64, ne_prev: Option<f64>, order: Option<f64>) {
        // skip if not verbose
        if self.verbose < Verbosity::Level2 {
            return;
        }
        let (l, r) = if !ne.is_finite() || !nr.is_finite() {
            ("😱", "  ") // found NaN or Inf
        } else {
            let (l, r) = (
                if ne < self.eeps { "✅" } else { "  " },
                if nr < self.seps { "✅" } else { "  " },
            );
            match ne_prev {
                Some(prev) if ne >= self.eeps && ne > prev => ("🥵", r), // diverging
                Some(_) if ne >= self.eeps => ("👍", r),                 // converging
                _ => (l, r),
            }
        };
        let ord = match order {
            Some(v) => format!("{:>6.2}", v),
            None => format!("{:>6}", "."),
        };
        println!(
            "{:>8} {:>13} {:>13} {:>5} {:>9.2e}{} {:>9.2e}{} {}",
            ".", ".", ".", it, ne, l, nr, r, ord
        );
    }

    /// Prints a message about a sub-step (a failed attempt)
    #[inline]
    pub fn print_sub_step(&self, reason: &str, dt_new: f64) {
        if self.verbose < Verbosity::Level1 {
            return;
        }
        println!("{:>8} {}", "⚠", reason);
        println!("{:>8} trying again with Δt = {:e}", ".", dt_new);
    }

    /// Prints a warning (e.g., the failure of the prediction operator)
    #[inline]
    pub fn print_warning(&self, message: &str) {
        if self.verbose < Verbosity::Level1 {
            return;
        }
        println!("WARNING: {}", message);
    }

    /// Prints the mismatch between the tangent operators
    #[inline]
    pub fn print_tangent_mismatch(&self, mismatch: &NumericalTangentMismatch) {
        if self.verbose == Verbosity::Quiet {
            return;
        }
        println!("{}", mismatch);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Control;
    use crate::base::{OutputFrequency, PredictionPolicy, Verbosity};

    #[test]
    fn new_works() {
        let control = Control::new();
        assert_eq!(control.eeps, 1e-12);
        assert_eq!(control.seps, 1e-3);
        assert_eq!(control.n_max_iterations, 100);
        assert_eq!(control.n_max_sub_steps, 10);
        assert_eq!(control.prediction, PredictionPolicy::NoPrediction);
        assert_eq!(control.stiffness, None);
        assert_eq!(control.compare_to_numerical_tangent, false);
        assert_eq!(control.tangent_perturbation(), 1e-11);
        assert_eq!(control.tangent_tolerance(), 1e7);
        assert_eq!(control.reference_temperature, 293.15);
        assert_eq!(control.dynamic_time_step_scaling, false);
        assert_eq!(control.output_frequency, OutputFrequency::EveryPeriod);
        assert_eq!(control.verbose, Verbosity::Quiet);
        assert_eq!(control.validate(), None);
    }

    #[test]
    fn setters_capture_errors() {
        let mut control = Control::new();
        assert_eq!(control.set_eeps(0.0).err(), Some("eeps must be ≥ 1e-15"));
        assert_eq!(control.set_seps(-1.0).err(), Some("seps must be ≥ 1e-15"));
        assert_eq!(control.set_n_max_iterations(0).err(), Some("n_max_iterations must be ≥ 1"));
        assert_eq!(control.set_n_max_sub_steps(0).err(), Some("n_max_sub_steps must be ≥ 1"));
        assert_eq!(
            control.set_compare_to_numerical_tangent(Some(0.0), None).err(),
            Some("the tangent perturbation must be > 0.0")
        );
        assert_eq!(
            control.set_compare_to_numerical_tangent(None, Some(-1.0)).err(),
            Some("the tangent tolerance must be > 0.0")
        );
        assert_eq!(
            control.set_dynamic_time_step_scaling(-1.0, None).err(),
            Some("dt_min must be ≥ 0.0")
        );
        assert_eq!(
            control.set_dynamic_time_step_scaling(0.1, Some(0.1)).err(),
            Some("dt_max must be > dt_min")
        );
    }

    #[test]
    fn setters_work() {
        let mut control = Control::new();
        control
            .set_eeps(1e-10)
            .unwrap()
            .set_seps(1e-2)
            .unwrap()
            .set_n_max_iterations(20)
            .unwrap()
            .set_n_max_sub_steps(3)
            .unwrap()
            .set_compare_to_numerical_tangent(None, None)
            .unwrap();
        assert_eq!(control.eeps, 1e-10);
        assert_eq!(control.seps, 1e-2);
        assert_eq!(control.n_max_iterations, 20);
        assert_eq!(control.n_max_sub_steps, 3);
        assert_eq!(control.compare_to_numerical_tangent, true);
        assert_eq!(control.tangent_perturbation(), 1e-9);
        assert_eq!(control.tangent_tolerance(), 1e8);
        control.set_dynamic_time_step_scaling(1e-3, Some(0.5)).unwrap();
        assert_eq!(control.dynamic_time_step_scaling, true);
        assert_eq!(control.dt_min, 1e-3);
        assert_eq!(control.dt_max, Some(0.5));
    }

    #[test]
    fn validate_works() {
        let mut control = Control::new();

        control.eeps = 0.0;
        assert_eq!(
            control.validate(),
            Some("eeps = 0.0 is incorrect; it must be ≥ 1e-15".to_string())
        );
        control.eeps = 1e-12;

        control.seps = -1.0;
        assert_eq!(
            control.validate(),
            Some("seps = -1.0 is incorrect; it must be ≥ 1e-15".to_string())
        );
        control.seps = 1e-3;

        control.n_max_iterations = 0;
        assert_eq!(
            control.validate(),
            Some("n_max_iterations = 0 is incorrect; it must be ≥ 1".to_string())
        );
        control.n_max_iterations = 10;

        control.n_max_sub_steps = 0;
        assert_eq!(
            control.validate(),
            Some("n_max_sub_steps = 0 is incorrect; it must be ≥ 1".to_string())
        );
        control.n_max_sub_steps = 10;

        control.tangent_perturbation = Some(0.0);
        assert_eq!(
            control.validate(),
            Some("tangent_perturbation = 0.0 is incorrect; it must be > 0.0".to_string())
        );
        control.tangent_perturbation = None;

        control.tangent_tolerance = Some(-2.0);
        assert_eq!(
            control.validate(),
            Some("tangent_tolerance = -2.0 is incorrect; it must be > 0.0".to_string())
        );
        control.tangent_tolerance = None;

        control.dt_min = -1.0;
        assert_eq!(
            control.validate(),
            Some("dt_min = -1.0 is incorrect; it must be ≥ 0.0".to_string())
        );
        control.dt_min = 0.5;

        control.dt_max = Some(0.5);
        assert_eq!(
            control.validate(),
            Some("dt_max = 0.5 is incorrect; it must be > dt_min = 0.5".to_string())
        );
        control.dt_max = None;

        control.rdt_min = 1.0;
        assert_eq!(
            control.validate(),
            Some("rdt_min = 1.0 is incorrect; it must be 0.0 < rdt_min < 1.0".to_string())
        );
        control.rdt_min = 0.1;

        control.rdt_max = 0.5;
        assert_eq!(
            control.validate(),
            Some("rdt_max = 0.5 is incorrect; it must be ≥ 1.0".to_string())
        );
        control.rdt_max = 2.0;

        assert_eq!(control.validate(), None);
    }

    #[test]
    fn serialize_works() {
        let control = Control::new();
        let json = serde_json::to_string(&control).unwrap();
        let read: Control = serde_json::from_str(&json).unwrap();
        assert_eq!(read.eeps, control.eeps);
        assert_eq!(read.prediction, control.prediction);
    }
}
