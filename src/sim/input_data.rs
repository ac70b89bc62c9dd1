use super::{Driver, ReferenceValueCheck};
use crate::acceleration::AccelerationRegistry;
use crate::base::{Control, Error, Evolution, Evolutions, Hypothesis};
use crate::material::{BehaviourModel, ParamBehaviour};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Defines the kind of an imposed quantity
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum ConstraintKind {
    DrivingVariable,
    ThermodynamicForce,
    Strain,
    Stress,
    DeformationGradient,
    OpeningDisplacement,
    CohesiveForce,
}

/// Holds the parameters of a constraint
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamConstraint {
    /// Kind of imposed quantity
    pub kind: ConstraintKind,

    /// Name of the component (e.g., SXX)
    pub component: String,

    /// Imposed value
    pub evolution: Evolution,
}

/// Holds the parameters of the acceleration algorithm
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamAcceleration {
    /// Name of the algorithm (e.g., Anderson)
    pub name: String,

    /// Parameters of the algorithm (key, value)
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// Holds the parameters of a reference value check
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamCheck {
    /// Name of the checked variable (e.g., EXX)
    pub variable: String,

    /// Reference value
    pub reference: Evolution,

    /// Absolute tolerance
    pub tolerance: f64,
}

/// Holds the description of a whole test of a material point
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputData {
    /// Modelling hypothesis
    #[serde(default)]
    pub hypothesis: Hypothesis,

    /// Behaviour
    pub behaviour: ParamBehaviour,

    /// Evolutions of the material properties, external state variables, ...
    #[serde(default)]
    pub evolutions: Evolutions,

    /// Constraints (in declaration order)
    #[serde(default)]
    pub constraints: Vec<ParamConstraint>,

    /// Acceleration algorithm
    #[serde(default)]
    pub acceleration: Option<ParamAcceleration>,

    /// Control parameters
    #[serde(default = "Control::new")]
    pub control: Control,

    /// Times splitting the loading path
    pub times: Vec<f64>,

    /// Rotation matrix from the global frame to the material frame
    #[serde(default)]
    pub rotation: Option<[[f64; 3]; 3]>,

    /// Initial values of the driving variables
    #[serde(default)]
    pub initial_driving_variables: Option<Vec<f64>>,

    /// Initial values of the thermodynamic forces
    #[serde(default)]
    pub initial_thermodynamic_forces: Option<Vec<f64>>,

    /// Initial values of the internal state variables
    #[serde(default)]
    pub initial_internal_variables: Option<Vec<f64>>,

    /// Reference value checks
    #[serde(default)]
    pub checks: Vec<ParamCheck>,
}

impl InputData {
    /// Reads a JSON file containing the input data
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
        let data = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(data)
    }

    /// Writes a JSON file with the input data
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
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

impl Driver {
    /// Allocates a driver from the input data
    pub fn from_input(input: &InputData, registry: &AccelerationRegistry) -> Result<Self, Error> {
        let behaviour = BehaviourModel::new(&input.behaviour).map_err(|e| Error::configuration("behaviour", e))?;
        let mut driver = Driver::new(input.hypothesis);
        driver.set_behaviour(behaviour).set_control(input.control.clone());
        driver.evolutions = input.evolutions.clone();
        for p in &input.constraints {
            let ev = p.evolution.clone();
            let name = p.component.as_str();
            match p.kind {
                ConstraintKind::DrivingVariable => driver.impose_driving_variable(name, ev)?,
                ConstraintKind::ThermodynamicForce => driver.impose_thermodynamic_force(name, ev)?,
                ConstraintKind::Strain => driver.impose_strain(name, ev)?,
                ConstraintKind::Stress => driver.impose_stress(name, ev)?,
                ConstraintKind::DeformationGradient => driver.impose_deformation_gradient(name, ev)?,
                ConstraintKind::OpeningDisplacement => driver.impose_opening_displacement(name, ev)?,
                ConstraintKind::CohesiveForce => driver.impose_cohesive_force(name, ev)?,
            };
        }
        if let Some(acceleration) = &input.acceleration {
            let parameters: Vec<(&str, &str)> = acceleration
                .parameters
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            driver.set_accelerator(registry, &acceleration.name, &parameters)?;
        }
        if let Some(rotation) = &input.rotation {
            driver.set_rotation(rotation)?;
        }
        if let Some(values) = &input.initial_driving_variables {
            driver.set_initial_driving_variables(values);
        }
        if let Some(values) = &input.initial_thermodynamic_forces {
            driver.set_initial_thermodynamic_forces(values);
        }
        if let Some(values) = &input.initial_internal_variables {
            driver.set_initial_internal_variables(values);
        }
        for p in &input.checks {
            let check = ReferenceValueCheck::new(&p.variable, p.reference.clone(), p.tolerance)
                .map_err(|e| Error::configuration("checks", e))?;
            driver.add_check(Box::new(check));
        }
        Ok(driver)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::InputData;
    use crate::acceleration::AccelerationRegistry;
    use crate::base::{Evolution, Hypothesis, DEFAULT_TEST_DIR};
    use crate::material::ParamBehaviour;
    use crate::sim::{Driver, ResultTable};
    use russell_lab::approx_eq;

    const INPUT: &str = r#"{
        "behaviour": "LinearElastic",
        "evolutions": {
            "YoungModulus": {"Constant": 200000.0},
            "PoissonRatio": {"Constant": 0.3}
        },
        "constraints": [
            {"kind": "Stress", "component": "SXX", "evolution": {"LinearTable": {"times": [0.0, 1.0], "values": [0.0, 100.0]}}}
        ],
        "acceleration": {"name": "Anderson", "parameters": {"Nmax": "3", "alMax": "2"}},
        "times": [0.0, 0.5, 1.0],
        "checks": [
            {"variable": "EXX", "reference": {"LinearTable": {"times": [0.0, 1.0], "values": [0.0, 5e-4]}}, "tolerance": 1e-9}
        ]
    }"#;

    #[test]
    fn deserialize_and_run_work() {
        let input: InputData = serde_json::from_str(INPUT).unwrap();
        assert_eq!(input.hypothesis, Hypothesis::Tridimensional);
        assert_eq!(input.behaviour, ParamBehaviour::LinearElastic);
        assert_eq!(input.control.n_max_iterations, 100);
        let registry = AccelerationRegistry::new();
        let mut driver = Driver::from_input(&input, &registry).unwrap();
        let mut table = ResultTable::new();
        let summary = driver.run(&input.times, &mut table).unwrap();
        assert_eq!(summary.checks.len(), 2);
        assert!(summary.all_checks_passed());
        approx_eq(table.column("EXX").unwrap()[2], 5e-4, 1e-9);
    }

    #[test]
    fn from_input_captures_errors() {
        let mut input: InputData = serde_json::from_str(INPUT).unwrap();
        input.constraints[0].component = "FXY".to_string();
        let registry = AccelerationRegistry::new();
        assert!(Driver::from_input(&input, &registry).is_err());

        let mut input: InputData = serde_json::from_str(INPUT).unwrap();
        input.acceleration.as_mut().unwrap().name = "Unknown".to_string();
        assert_eq!(
            Driver::from_input(&input, &registry).err().unwrap().to_string(),
            "configuration error (acceleration): unknown acceleration algorithm (Unknown)"
        );

        let mut input: InputData = serde_json::from_str(INPUT).unwrap();
        input.checks[0].reference = Evolution::LinearTable {
            times: Vec::new(),
            values: Vec::new(),
        };
        assert_eq!(
            Driver::from_input(&input, &registry).err().unwrap().to_string(),
            "configuration error (checks): the table of an evolution must not be empty"
        );
    }

    #[test]
    fn read_write_json_work() {
        let input: InputData = serde_json::from_str(INPUT).unwrap();
        let path = format!("{}/input_data.json", DEFAULT_TEST_DIR);
        input.write_json(&path).unwrap();
        let read = InputData::read_json(&path).unwrap();
        assert_eq!(read.times, &[0.0, 0.5, 1.0]);
        assert_eq!(read.constraints.len(), 1);
        assert_eq!(read.constraints[0].component, "SXX");
        assert_eq!(InputData::read_json("/tmp/mpsim/not-found.json").err(), Some("cannot open file"));
    }
}
