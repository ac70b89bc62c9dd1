use super::{AccelerationAlgorithm, AccelerationTrait, Anderson, Broyden, CrossedSecant, IronsTuck, Secant};
use crate::StrError;
use std::collections::HashMap;

/// Defines the function allocating an acceleration algorithm
pub type FnNewAcceleration = fn() -> Box<dyn AccelerationTrait>;

/// Holds the acceleration algorithms available by name
pub struct AccelerationRegistry {
    builders: HashMap<String, FnNewAcceleration>,
}

impl AccelerationRegistry {
    /// Allocates a registry with the built-in algorithms
    ///
    /// Names: UAnderson (alias Anderson), FAnderson, Broyden, Secant, IronsTuck,
    /// AlternateSecant and CrossedSecant (alias Cast3M).
    pub fn new() -> Self {
        let mut builders: HashMap<String, FnNewAcceleration> = HashMap::new();
        builders.insert("UAnderson".to_string(), || Box::new(Anderson::new(false)));
        builders.insert("Anderson".to_string(), || Box::new(Anderson::new(false)));
        builders.insert("FAnderson".to_string(), || Box::new(Anderson::new(true)));
        builders.insert("Broyden".to_string(), || Box::new(Broyden::new()));
        builders.insert("Secant".to_string(), || Box::new(Secant::new()));
        builders.insert("AlternateSecant".to_string(), || Box::new(Secant::new_alternate()));
        builders.insert("IronsTuck".to_string(), || Box::new(IronsTuck::new()));
        builders.insert("CrossedSecant".to_string(), || Box::new(CrossedSecant::new()));
        builders.insert("Cast3M".to_string(), || Box::new(CrossedSecant::new()));
        AccelerationRegistry { builders }
    }

    /// Allocates an empty registry
    pub fn empty() -> Self {
        AccelerationRegistry {
            builders: HashMap::new(),
        }
    }

    /// Registers a new algorithm
    pub fn register(&mut self, name: &str, builder: FnNewAcceleration) -> Result<(), StrError> {
        if self.builders.contains_key(name) {
            return Err("an acceleration algorithm with this name is already registered");
        }
        self.builders.insert(name.to_string(), builder);
        Ok(())
    }

    /// Returns the sorted names of the registered algorithms
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.builders.keys().cloned().collect();
        names.sort();
        names
    }

    /// Allocates an algorithm and sets its parameters
    pub fn create(&self, name: &str, parameters: &[(&str, &str)]) -> Result<AccelerationAlgorithm, StrError> {
        let builder = self.builders.get(name).ok_or("unknown acceleration algorithm")?;
        let mut actual = builder();
        for (key, value) in parameters {
            actual.set_parameter(key, value)?;
        }
        Ok(AccelerationAlgorithm { actual })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
