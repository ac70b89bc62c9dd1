use crate::StrError;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the names of the variables of the material point
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VariableNames {
    /// Driving variables (e.g., EXX, EYY, ...)
    pub driving: Vec<String>,

    /// Thermodynamic forces (e.g., SXX, SYY, ...)
    pub forces: Vec<String>,

    /// Internal state variables
    pub internal: Vec<String>,
}

/// Locates a variable in the state vectors
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VariableLocation {
    DrivingVariable(usize),
    ThermodynamicForce(usize),
    InternalVariable(usize),
}

impl VariableNames {
    /// Finds a variable by name
    pub fn locate(&self, name: &str) -> Option<VariableLocation> {
        if let Some(i) = self.driving.iter().position(|n| n == name) {
            return Some(VariableLocation::DrivingVariable(i));
        }
        if let Some(i) = self.forces.iter().position(|n| n == name) {
            return Some(VariableLocation::ThermodynamicForce(i));
        }
        if let Some(i) = self.internal.iter().position(|n| n == name) {
            return Some(VariableLocation::InternalVariable(i));
        }
        None
    }

    /// Returns all names in the order t, driving variables, thermodynamic forces, internal variables
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["t".to_string()];
        header.extend(self.driving.iter().cloned());
        header.extend(self.forces.iter().cloned());
        header.extend(self.internal.iter().cloned());
        header
    }
}

/// Holds the state of the material point
///
/// The vectors come in three flavours: `_prev` (beginning of the previous step), `0` (beginning
/// of the current step) and `1` (end of the current step). The driving variables vectors also
/// hold the Lagrange multipliers after the `ndv` driving variables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentState {
    /// Time at the beginning of the step
    pub t: f64,

    /// Index of the current step (starting at 1)
    pub period: usize,

    /// Previous time increment
    pub dt_prev: f64,

    /// Reference temperature of the thermal strain
    pub t_ref: f64,

    /// Number of driving variables
    pub ndv: usize,

    /// Driving variables and multipliers at the beginning of the previous step
    pub u_prev: Vector,

    /// Driving variables and multipliers at the beginning of the step
    pub u0: Vector,

    /// Driving variables and multipliers at the end of the step
    pub u1: Vector,

    /// Thermodynamic forces at the beginning of the previous step
    pub s_prev: Vector,

    /// Thermodynamic forces at the beginning of the step
    pub s0: Vector,

    /// Thermodynamic forces at the end of the step
    pub s1: Vector,

    /// Internal state variables at the beginning of the previous step
    pub iv_prev: Vector,

    /// Internal state variables at the beginning of the step
    pub iv0: Vector,

    /// Internal state variables at the end of the step
    pub iv1: Vector,

    /// Mechanical part of the driving variables at the beginning of the step
    pub e0: Vector,

    /// Mechanical part of the driving variables at the end of the step
    pub e1: Vector,

    /// Thermal strain at the beginning of the step
    pub e_th0: Vector,

    /// Thermal strain at the end of the step
    pub e_th1: Vector,

    /// Material properties at the beginning of the step
    pub mprops0: Vector,

    /// Material properties at the end of the step
    pub mprops1: Vector,

    /// External state variables at the beginning of the step
    pub esv0: Vector,

    /// Increments of the external state variables
    pub desv: Vector,
}

impl CurrentState {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `ndv` -- number of driving variables
    /// * `n_multipliers` -- number of Lagrange multipliers
    /// * `nth` -- number of thermodynamic forces
    /// * `niv` -- number of internal state variables
    /// * `n_mprops` -- number of material properties
    /// * `n_esv` -- number of external state variables
    pub fn new(ndv: usize, n_multipliers: usize, nth: usize, niv: usize, n_mprops: usize, n_esv: usize) -> Self {
        let n = ndv + n_multipliers;
        CurrentState {
            t: 0.0,
            period: 1,
            dt_prev: 0.0,
            t_ref: 0.0,
            ndv,
            u_prev: Vector::new(n),
            u0: Vector::new(n),
            u1: Vector::new(n),
            s_prev: Vector::new(nth),
            s0: Vector::new(nth),
            s1: Vector::new(nth),
            iv_prev: Vector::new(niv),
            iv0: Vector::new(niv),
            iv1: Vector::new(niv),
            e0: Vector::new(ndv),
            e1: Vector::new(ndv),
            e_th0: Vector::new(ndv),
            e_th1: Vector::new(ndv),
            mprops0: Vector::new(n_mprops),
            mprops1: Vector::new(n_mprops),
            esv0: Vector::new(n_esv),
            desv: Vector::new(n_esv),
        }
    }

    /// Sets the initial values of the driving variables (the multipliers are not affected)
    pub fn set_driving_variables(&mut self, values: &[f64]) -> Result<(), StrError> {
        if values.len() != self.ndv {
            return Err("the number of initial driving variables is incorrect");
        }
        for i in 0..self.ndv {
            self.u_prev[i] = values[i];
            self.u0[i] = values[i];
            self.u1[i] = values[i];
        }
        Ok(())
    }

    /// Sets the initial values of the thermodynamic forces
    pub fn set_thermodynamic_forces(&mut self, values: &[f64]) -> Result<(), StrError> {
        if values.len() != self.s0.dim() {
            return Err("the number of initial thermodynamic forces is incorrect");
        }
        for i in 0..values.len() {
            self.s_prev[i] = values[i];
            self.s0[i] = values[i];
            self.s1[i] = values[i];
        }
        Ok(())
    }

    /// Sets the initial values of the internal state variables
    pub fn set_internal_variables(&mut self, values: &[f64]) -> Result<(), StrError> {
        if values.len() != self.iv0.dim() {
            return Err("the number of initial internal variables is incorrect");
        }
        for i in 0..values.len() {
            self.iv_prev[i] = values[i];
            self.iv0[i] = values[i];
            self.iv1[i] = values[i];
        }
        Ok(())
    }

    /// Accepts the end of the step
    ///
    /// The beginning values become the previous values and the end values become the
    /// beginning values. The time is advanced by `dt`.
    pub fn commit(&mut self, dt: f64) {
        copy(&mut self.u_prev, &self.u0);
        copy(&mut self.u0, &self.u1);
        copy(&mut self.s_prev, &self.s0);
        copy(&mut self.s0, &self.s1);
        copy(&mut self.iv_prev, &self.iv0);
        copy(&mut self.iv0, &self.iv1);
        self.dt_prev = dt;
        self.t += dt;
        self.period += 1;
    }

    /// Restores the end values from the beginning values (e.g., after a failed attempt)
    pub fn revert(&mut self) {
        copy(&mut self.u1, &self.u0);
        copy(&mut self.s1, &self.s0);
        copy(&mut self.iv1, &self.iv0);
    }

    /// Extrapolates the end values from the two previous steps
    ///
    /// Nothing happens during the first step.
    pub fn linear_prediction(&mut self, dt: f64) {
        if self.period <= 1 || self.dt_prev <= 0.0 {
            return;
        }
        let r = dt / self.dt_prev;
        extrapolate(&mut self.u1, &self.u0, &self.u_prev, r);
        extrapolate(&mut self.s1, &self.s0, &self.s_prev, r);
        extrapolate(&mut self.iv1, &self.iv0, &self.iv_prev, r);
    }

    /// Returns the value of a variable at the end of the step
    pub fn value(&self, location: VariableLocation) -> f64 {
        match location {
            VariableLocation::DrivingVariable(i) => self.u1[i],
            VariableLocation::ThermodynamicForce(i) => self.s1[i],
            VariableLocation::InternalVariable(i) => self.iv1[i],
        }
    }

    /// Reads a JSON file containing the state data
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let state = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(state)
    }

    /// Writes a JSON file with the state data
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

/// Copies b into a (same dimensions)
fn copy(a: &mut Vector, b: &Vector) {
    for i in 0..a.dim() {
        a[i] = b[i];
    }
}

/// Computes x1 = x0 + (x0 - x_prev) r
fn extrapolate(x1: &mut Vector, x0: &Vector, x_prev: &Vector, r: f64) {
    for i in 0..x1.dim() {
        x1[i] = x0[i] + (x0[i] - x_prev[i]) * r;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{CurrentState, VariableLocation, VariableNames};
    use crate::base::DEFAULT_TEST_DIR;
    use russell_lab::vec_approx_eq;

    #[test]
    fn new_works() {
        let state = CurrentState::new(6, 2, 6, 1, 2, 0);
        assert_eq!(state.period, 1);
        assert_eq!(state.u0.dim(), 8);
        assert_eq!(state.u1.dim(), 8);
        assert_eq!(state.s1.dim(), 6);
        assert_eq!(state.iv1.dim(), 1);
        assert_eq!(state.e_th1.dim(), 6);
        assert_eq!(state.mprops1.dim(), 2);
        assert_eq!(state.desv.dim(), 0);
    }

    #[test]
    fn setters_capture_errors() {
        let mut state = CurrentState::new(2, 1, 2, 0, 0, 0);
        assert_eq!(
            state.set_driving_variables(&[1.0]).err(),
            Some("the number of initial driving variables is incorrect")
        );
        assert_eq!(
            state.set_thermodynamic_forces(&[1.0, 2.0, 3.0]).err(),
            Some("the number of initial thermodynamic forces is incorrect")
        );
        assert_eq!(
            state.set_internal_variables(&[1.0]).err(),
            Some("the number of initial internal variables is incorrect")
        );
        state.set_driving_variables(&[1.0, 2.0]).unwrap();
        vec_approx_eq(&state.u1, &[1.0, 2.0, 0.0], 1e-15);
    }

    #[test]
    fn commit_revert_and_prediction_work() {
        let mut state = CurrentState::new(1, 0, 1, 1, 0, 0);
        state.u1[0] = 1.0;
        state.s1[0] = 10.0;
        state.iv1[0] = 0.1;
        state.commit(0.5);
        assert_eq!(state.t, 0.5);
        assert_eq!(state.period, 2);
        assert_eq!(state.dt_prev, 0.5);
        vec_approx_eq(&state.u0, &[1.0], 1e-15);
        vec_approx_eq(&state.u_prev, &[0.0], 1e-15);

        state.u1[0] = 123.0;
        state.revert();
        vec_approx_eq(&state.u1, &[1.0], 1e-15);

        state.linear_prediction(1.0);
        vec_approx_eq(&state.u1, &[3.0], 1e-15);
        vec_approx_eq(&state.s1, &[30.0], 1e-15);
        vec_approx_eq(&state.iv1, &[0.3], 1e-15);
    }

    #[test]
    fn linear_prediction_skips_the_first_step() {
        let mut state = CurrentState::new(1, 0, 1, 0, 0, 0);
        state.u0[0] = 1.0;
        state.u1[0] = 1.0;
        state.linear_prediction(1.0);
        vec_approx_eq(&state.u1, &[1.0], 1e-15);
    }

    #[test]
    fn names_work() {
        let names = VariableNames {
            driving: vec!["EXX".to_string()],
            forces: vec!["SXX".to_string()],
            internal: vec!["EquivalentPlasticStrain".to_string()],
        };
        assert_eq!(names.locate("SXX"), Some(VariableLocation::ThermodynamicForce(0)));
        assert_eq!(
            names.locate("EquivalentPlasticStrain"),
            Some(VariableLocation::InternalVariable(0))
        );
        assert_eq!(names.locate("FXX"), None);
        assert_eq!(names.header(), &["t", "EXX", "SXX", "EquivalentPlasticStrain"]);

        let mut state = CurrentState::new(1, 0, 1, 1, 0, 0);
        state.s1[0] = 7.0;
        assert_eq!(state.value(VariableLocation::ThermodynamicForce(0)), 7.0);
    }

    #[test]
    fn read_write_json_work() {
        let mut state = CurrentState::new(2, 1, 2, 0, 1, 0);
        state.u0[2] = 3.0;
        state.mprops1[0] = 200e3;
        let path = format!("{}/current_state.json", DEFAULT_TEST_DIR);
        state.write_json(&path).unwrap();
        let read = CurrentState::read_json(&path).unwrap();
        assert_eq!(read.ndv, 2);
        vec_approx_eq(&read.u0, &[0.0, 0.0, 3.0], 1e-15);
        vec_approx_eq(&read.mprops1, &[200e3], 1e-15);
        assert_eq!(
            CurrentState::read_json("/tmp/mpsim/__not_found__.json").err(),
            Some("cannot open file")
        );
    }
}
