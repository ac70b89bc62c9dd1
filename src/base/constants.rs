/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/mpsim/test";

/// Defines the default tolerance on the driving variables (e.g., strain)
pub const DEFAULT_EEPS: f64 = 1e-12;

/// Defines the default tolerance on the thermodynamic forces (e.g., stress)
pub const DEFAULT_SEPS: f64 = 1e-3;

/// Defines the default maximum number of Newton iterations
pub const DEFAULT_N_MAX_ITERATIONS: usize = 100;

/// Defines the default maximum number of sub-steps within a loading interval
pub const DEFAULT_N_MAX_SUB_STEPS: usize = 10;

/// Defines the default reference temperature for the thermal strain
pub const DEFAULT_REFERENCE_TEMPERATURE: f64 = 293.15;

/// Defines the ratio between the default tangent comparison criterion and the force tolerance
///
/// With `seps = 1e-3`, the criterion is `1e7`.
pub const TANGENT_TOLERANCE_RATIO: f64 = 1e10;

/// Defines the ratio between the default tangent perturbation and the driving-variable tolerance
pub const TANGENT_PERTURBATION_RATIO: f64 = 10.0;

/// Defines the threshold below which a squared norm is regarded as zero by the accelerators
pub const DEGENERATE_SQUARED_NORM: f64 = 100.0 * f64::EPSILON * f64::EPSILON;

/// Defines the name of the temperature external state variable
pub const TEMPERATURE: &str = "Temperature";

/// Defines the name of the isotropic thermal expansion coefficient
pub const THERMAL_EXPANSION: &str = "ThermalExpansion";

/// Defines the names of the orthotropic thermal expansion coefficients
pub const THERMAL_EXPANSION_ORTHO: [&str; 3] = ["ThermalExpansion1", "ThermalExpansion2", "ThermalExpansion3"];
