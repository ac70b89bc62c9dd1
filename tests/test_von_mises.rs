use mpsim::prelude::*;
use russell_lab::approx_eq;

const YOUNG: f64 = 200000.0;
const POISSON: f64 = 0.3;
const YIELD_STRESS: f64 = 200.0;
const HARDENING: f64 = 10000.0;
const EXX_MAX: f64 = 2e-3;

fn plastic_driver() -> Result<Driver, Error> {
    let mut driver = Driver::new(Hypothesis::Tridimensional);
    driver
        .set_behaviour(BehaviourModel::new(&ParamBehaviour::VonMises).unwrap())
        .set_evolution("YoungModulus", Evolution::constant(YOUNG))
        .set_evolution("PoissonRatio", Evolution::constant(POISSON))
        .set_evolution("YieldStress", Evolution::constant(YIELD_STRESS))
        .set_evolution("HardeningSlope", Evolution::constant(HARDENING));
    driver.impose_strain("EXX", Evolution::linear(&[0.0, 1.0], &[0.0, EXX_MAX]).unwrap())?;
    Ok(driver)
}

/// Returns (σxx, εyy, p) at the end of the uniaxial tension
fn analytical() -> (f64, f64, f64) {
    let sxx = (YIELD_STRESS + HARDENING * EXX_MAX) / (1.0 + HARDENING / YOUNG);
    let p = EXX_MAX - sxx / YOUNG;
    let eyy = -POISSON * sxx / YOUNG - 0.5 * p;
    (sxx, eyy, p)
}

fn check_last(table: &ResultTable) {
    let (sxx, eyy, p) = analytical();
    let last = table.last().unwrap();
    let header = &table.header;
    let at = |name: &str| last[header.iter().position(|n| n == name).unwrap()];
    approx_eq(at("EXX"), EXX_MAX, 1e-14);
    approx_eq(at("SXX"), sxx, 1e-6);
    approx_eq(at("SYY"), 0.0, 1e-6);
    approx_eq(at("SZZ"), 0.0, 1e-6);
    approx_eq(at("EYY"), eyy, 1e-10);
    approx_eq(at("EZZ"), eyy, 1e-10);
    approx_eq(at("EquivalentPlasticStrain"), p, 1e-10);
}

#[test]
fn test_von_mises_uniaxial_tension() -> Result<(), Error> {
    let mut driver = plastic_driver()?;
    let mut table = ResultTable::new();
    let summary = driver.run(&times_linspace(0.0, 1.0, 10), &mut table)?;
    assert_eq!(summary.n_failed(), 0);
    assert_eq!(summary.n_committed(), 10);
    check_last(&table);

    // elastic up to t = 0.5 (εxx = 1e-3 = sy / E)
    let p = table.column("EquivalentPlasticStrain").unwrap();
    approx_eq(p[5], 0.0, 1e-15);
    assert!(p[6] > 0.0);

    // quadratic convergence with the consistent tangent operator
    for attempt in &summary.attempts {
        assert!(attempt.iterations <= 10);
    }
    Ok(())
}

#[test]
fn test_von_mises_numerical_tangent() -> Result<(), Error> {
    let mut driver = plastic_driver()?;
    driver.control.stiffness = Some(StiffnessKind::NoStiffness);
    let mut table = ResultTable::new();
    let summary = driver.run(&times_linspace(0.0, 1.0, 10), &mut table)?;
    assert_eq!(summary.n_failed(), 0);
    check_last(&table);
    Ok(())
}

#[test]
fn test_von_mises_comparison_to_numerical_tangent() -> Result<(), Error> {
    let mut driver = plastic_driver()?;
    driver.control.set_compare_to_numerical_tangent(None, None).unwrap();
    let mut table = ResultTable::new();
    let summary = driver.run(&times_linspace(0.0, 1.0, 4), &mut table)?;
    assert_eq!(summary.n_failed(), 0);
    check_last(&table);
    Ok(())
}

#[test]
fn test_von_mises_elastic_stiffness_with_accelerators() -> Result<(), Error> {
    let registry = AccelerationRegistry::new();
    let names = registry.names();
    assert_eq!(names.len(), 9);

    // reference: fixed-point iterations
    let mut driver = plastic_driver()?;
    driver.control.stiffness = Some(StiffnessKind::Elastic);
    let mut table = ResultTable::new();
    let reference = driver.run(&times_linspace(0.0, 1.0, 4), &mut table)?;
    assert_eq!(reference.n_failed(), 0);
    check_last(&table);

    for name in &names {
        let mut driver = plastic_driver()?;
        driver.control.stiffness = Some(StiffnessKind::Elastic);
        driver.set_accelerator(&registry, name, &[])?;
        let mut table = ResultTable::new();
        driver.run(&times_linspace(0.0, 1.0, 4), &mut table)?;
        check_last(&table);
    }
    Ok(())
}
