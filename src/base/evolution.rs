use crate::{FnTime, StrError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Defines the evolution of a scalar quantity with time
///
/// Evolutions describe imposed values, material properties and external state variables.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Evolution {
    /// Constant value
    Constant(f64),

    /// Piecewise linear interpolation of (time, value) pairs
    ///
    /// The first (last) value is used before (after) the first (last) time.
    LinearTable { times: Vec<f64>, values: Vec<f64> },

    /// Piecewise constant interpolation of (time, value) pairs
    ///
    /// The value of the last time that is ≤ t is returned; the first value is used before the first time.
    StepwiseTable { times: Vec<f64>, values: Vec<f64> },

    /// User-defined function of time
    #[serde(skip)]
    Function(FnTime),
}

impl Evolution {
    /// Allocates a constant evolution
    pub fn constant(value: f64) -> Self {
        Evolution::Constant(value)
    }

    /// Allocates a linearly interpolated evolution
    pub fn linear(times: &[f64], values: &[f64]) -> Result<Self, StrError> {
        check_table(times, values)?;
        Ok(Evolution::LinearTable {
            times: times.to_vec(),
            values: values.to_vec(),
        })
    }

    /// Allocates a piecewise constant evolution
    pub fn stepwise(times: &[f64], values: &[f64]) -> Result<Self, StrError> {
        check_table(times, values)?;
        Ok(Evolution::StepwiseTable {
            times: times.to_vec(),
            values: values.to_vec(),
        })
    }

    /// Allocates an evolution given by a function of time
    pub fn function(f: FnTime) -> Self {
        Evolution::Function(f)
    }

    /// Indicates that the value does not depend on time
    pub fn is_constant(&self) -> bool {
        match self {
            Evolution::Constant(_) => true,
            Evolution::LinearTable { values, .. } | Evolution::StepwiseTable { values, .. } => {
                values.iter().all(|v| *v == values[0])
            }
            Evolution::Function(_) => false,
        }
    }

    /// Returns the value at time t
    pub fn value(&self, t: f64) -> f64 {
        match self {
            Evolution::Constant(v) => *v,
            Evolution::LinearTable { times, values } => {
                let n = times.len();
                if t <= times[0] {
                    return values[0];
                }
                if t >= times[n - 1] {
                    return values[n - 1];
                }
                let k = times.partition_point(|tk| *tk <= t); // times[k-1] ≤ t < times[k]
                let (t0, t1) = (times[k - 1], times[k]);
                let (v0, v1) = (values[k - 1], values[k]);
                v0 + (v1 - v0) * (t - t0) / (t1 - t0)
            }
            Evolution::StepwiseTable { times, values } => {
                let k = times.partition_point(|tk| *tk <= t);
                if k == 0 {
                    values[0]
                } else {
                    values[k - 1]
                }
            }
            Evolution::Function(f) => f(t),
        }
    }

    /// Modifies the value at time t
    ///
    /// A constant evolution takes the new value; for tables, the value of an existing time
    /// is replaced, otherwise a new (time, value) pair is inserted.
    pub fn set_value(&mut self, t: f64, value: f64) -> Result<(), StrError> {
        match self {
            Evolution::Constant(v) => {
                *v = value;
                Ok(())
            }
            Evolution::LinearTable { times, values } | Evolution::StepwiseTable { times, values } => {
                let k = times.partition_point(|tk| *tk < t);
                if k < times.len() && times[k] == t {
                    values[k] = value;
                } else {
                    times.insert(k, t);
                    values.insert(k, value);
                }
                Ok(())
            }
            Evolution::Function(_) => Err("cannot set the value of a function evolution"),
        }
    }

    /// Validates the data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        match self.check_data() {
            Ok(()) => None,
            Err(e) => Some(e.to_string()),
        }
    }

    /// Checks that the evolution can be evaluated at any time
    pub fn check_data(&self) -> Result<(), StrError> {
        match self {
            Evolution::LinearTable { times, values } | Evolution::StepwiseTable { times, values } => {
                check_table(times, values)
            }
            _ => Ok(()),
        }
    }
}

/// Checks the (time, value) pairs of a table
fn check_table(times: &[f64], values: &[f64]) -> Result<(), StrError> {
    if times.len() == 0 {
        return Err("the table of an evolution must not be empty");
    }
    if times.len() != values.len() {
        return Err("the numbers of times and values of an evolution must be equal");
    }
    for k in 1..times.len() {
        if times[k] <= times[k - 1] {
            return Err("the times of an evolution must be strictly increasing");
        }
    }
    Ok(())
}

/// Holds the evolutions by name (material properties, external state variables, ...)
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Evolutions {
    /// Holds all evolutions
    pub all: BTreeMap<String, Evolution>,
}

impl Evolutions {
    /// Allocates an empty collection
    pub fn new() -> Self {
        Evolutions { all: BTreeMap::new() }
    }

    /// Sets (or replaces) an evolution
    pub fn set(&mut self, name: &str, evolution: Evolution) -> &mut Self {
        self.all.insert(name.to_string(), evolution);
        self
    }

    /// Returns the evolution with the given name, if any
    pub fn get(&self, name: &str) -> Option<&Evolution> {
        self.all.get(name)
    }

    /// Indicates whether an evolution with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.all.contains_key(name)
    }

    /// Returns the value of an evolution at time t
    pub fn value(&self, name: &str, t: f64) -> Result<f64, StrError> {
        match self.all.get(name) {
            Some(ev) => Ok(ev.value(t)),
            None => Err("cannot find the evolution"),
        }
    }

    /// Evaluates a list of evolutions at time t
    ///
    /// The evolutions must exist (see [Evolutions::missing]).
    pub fn evaluate(&self, values: &mut [f64], names: &[String], t: f64) -> Result<(), StrError> {
        for (value, name) in values.iter_mut().zip(names) {
            *value = self.value(name, t)?;
        }
        Ok(())
    }

    /// Returns the first name that has no evolution
    pub fn missing<'a>(&self, names: &'a [String]) -> Option<&'a String> {
        names.iter().find(|name| !self.all.contains_key(name.as_str()))
    }

    /// Validates all evolutions
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        for (name, ev) in &self.all {
            if let Some(msg) = ev.validate() {
                return Some(format!("{}: {}", name, msg));
            }
        }
        None
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Evolution, Evolutions};
    use russell_lab::approx_eq;

    #[test]
    fn constructors_capture_errors() {
        assert_eq!(
            Evolution::linear(&[], &[]).err(),
            Some("the table of an evolution must not be empty")
        );
        assert_eq!(
            Evolution::linear(&[0.0, 1.0], &[0.0]).err(),
            Some("the numbers of times and values of an evolution must be equal")
        );
        assert_eq!(
            Evolution::stepwise(&[0.0, 0.0], &[1.0, 2.0]).err(),
            Some("the times of an evolution must be strictly increasing")
        );
    }

    #[test]
    fn constant_works() {
        let mut ev = Evolution::constant(3.0);
        assert!(ev.is_constant());
        assert_eq!(ev.value(-1.0), 3.0);
        assert_eq!(ev.value(100.0), 3.0);
        ev.set_value(0.0, 4.0).unwrap();
        assert_eq!(ev.value(1.0), 4.0);
        assert_eq!(ev.validate(), None);
    }

    #[test]
    fn linear_works() {
        let ev = Evolution::linear(&[0.0, 1.0, 3.0], &[0.0, 100.0, 0.0]).unwrap();
        assert!(!ev.is_constant());
        assert_eq!(ev.value(-1.0), 0.0);
        assert_eq!(ev.value(0.0), 0.0);
        approx_eq(ev.value(0.25), 25.0, 1e-14);
        assert_eq!(ev.value(1.0), 100.0);
        approx_eq(ev.value(2.0), 50.0, 1e-14);
        assert_eq!(ev.value(3.0), 0.0);
        assert_eq!(ev.value(10.0), 0.0);
    }

    #[test]
    fn stepwise_works() {
        let ev = Evolution::stepwise(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ev.value(-0.5), 1.0);
        assert_eq!(ev.value(0.0), 1.0);
        assert_eq!(ev.value(0.99), 1.0);
        assert_eq!(ev.value(1.0), 2.0);
        assert_eq!(ev.value(1.5), 2.0);
        assert_eq!(ev.value(2.0), 3.0);
        assert_eq!(ev.value(5.0), 3.0);
    }

    #[test]
    fn function_works() {
        let mut ev = Evolution::function(|t| 100.0 * t);
        assert!(!ev.is_constant());
        assert_eq!(ev.value(0.5), 50.0);
        assert_eq!(
            ev.set_value(0.0, 1.0).err(),
            Some("cannot set the value of a function evolution")
        );
    }

    #[test]
    fn set_value_works_with_tables() {
        let mut ev = Evolution::linear(&[0.0, 2.0], &[0.0, 2.0]).unwrap();
        ev.set_value(2.0, 4.0).unwrap();
        assert_eq!(ev.value(2.0), 4.0);
        ev.set_value(1.0, 0.0).unwrap();
        assert_eq!(ev.value(1.0), 0.0);
        approx_eq(ev.value(1.5), 2.0, 1e-14);
        match ev {
            Evolution::LinearTable { times, values } => {
                assert_eq!(times, &[0.0, 1.0, 2.0]);
                assert_eq!(values, &[0.0, 0.0, 4.0]);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn serialize_works() {
        let ev = Evolution::linear(&[0.0, 1.0], &[0.0, 100.0]).unwrap();
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"LinearTable":{"times":[0.0,1.0],"values":[0.0,100.0]}}"#);
        let read: Evolution = serde_json::from_str(&json).unwrap();
        assert_eq!(read.value(0.5), 50.0);

        let bad: Evolution = serde_json::from_str(r#"{"StepwiseTable":{"times":[1.0,0.0],"values":[0.0,1.0]}}"#).unwrap();
        assert_eq!(
            bad.validate(),
            Some("the times of an evolution must be strictly increasing".to_string())
        );
    }

    #[test]
    fn evolutions_work() {
        let mut evolutions = Evolutions::new();
        evolutions
            .set("YoungModulus", Evolution::constant(200e3))
            .set("Temperature", Evolution::linear(&[0.0, 1.0], &[293.15, 393.15]).unwrap());
        assert_eq!(evolutions.value("YoungModulus", 3.0), Ok(200e3));
        approx_eq(evolutions.value("Temperature", 0.5).unwrap(), 343.15, 1e-12);
        assert_eq!(evolutions.value("PoissonRatio", 0.0).err(), Some("cannot find the evolution"));
        let names = vec!["YoungModulus".to_string(), "PoissonRatio".to_string()];
        assert_eq!(evolutions.missing(&names), Some(&names[1]));
        let mut values = vec![0.0; 1];
        evolutions.evaluate(&mut values, &names[..1], 0.0).unwrap();
        assert_eq!(values, &[200e3]);
        assert!(evolutions.contains("Temperature"));
        assert_eq!(evolutions.validate(), None);
        evolutions.all.insert(
            "Bad".to_string(),
            Evolution::LinearTable {
                times: vec![1.0, 0.0],
                values: vec![0.0, 0.0],
            },
        );
        assert_eq!(
            evolutions.validate(),
            Some("Bad: the times of an evolution must be strictly increasing".to_string())
        );
    }
}
