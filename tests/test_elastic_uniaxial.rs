use mpsim::prelude::*;
use russell_lab::{approx_eq, vec_approx_eq, Vector};

const YOUNG: f64 = 200000.0;
const POISSON: f64 = 0.3;

fn elastic_driver() -> Driver {
    let mut driver = Driver::new(Hypothesis::Tridimensional);
    driver
        .set_behaviour(BehaviourModel::new(&ParamBehaviour::LinearElastic).unwrap())
        .set_evolution("YoungModulus", Evolution::constant(YOUNG))
        .set_evolution("PoissonRatio", Evolution::constant(POISSON));
    driver
}

#[test]
fn test_elastic_uniaxial_stress() -> Result<(), Error> {
    // imposed stress σxx = 100 t
    let mut driver = elastic_driver();
    driver.impose_stress("SXX", Evolution::function(|t| 100.0 * t))?;

    // run
    let mut table = ResultTable::new();
    let summary = driver.run(&[0.0, 1.0], &mut table)?;
    assert_eq!(summary.n_committed(), 1);
    assert_eq!(summary.n_failed(), 0);

    // check
    assert_eq!(table.rows.len(), 2);
    let exx = table.column("EXX").unwrap();
    let eyy = table.column("EYY").unwrap();
    let sxx = table.column("SXX").unwrap();
    approx_eq(exx[1], 5e-4, 1e-9);
    approx_eq(eyy[1], -POISSON * 5e-4, 1e-9);
    approx_eq(sxx[1], 100.0, 1e-9);
    Ok(())
}

#[test]
fn test_elastic_uniaxial_strain_in_plane_stress() -> Result<(), Error> {
    let mut driver = Driver::new(Hypothesis::PlaneStress);
    driver
        .set_behaviour(BehaviourModel::new(&ParamBehaviour::LinearElastic).unwrap())
        .set_evolution("YoungModulus", Evolution::constant(YOUNG))
        .set_evolution("PoissonRatio", Evolution::constant(POISSON));
    driver.impose_strain("EXX", Evolution::linear(&[0.0, 1.0], &[0.0, 1e-3]).unwrap())?;
    driver.impose_strain("EXY", Evolution::constant(0.0))?;

    let mut table = ResultTable::new();
    driver.run(&times_linspace(0.0, 1.0, 4), &mut table)?;
    assert_eq!(table.rows.len(), 5);

    // uniaxial stress: σyy is free and σzz = 0 (plane stress)
    let last = table.last().unwrap();
    let header = &table.header;
    assert_eq!(header, &["t", "EXX", "EYY", "EZZ", "EXY", "SXX", "SYY", "SZZ", "SXY"]);
    approx_eq(last[5], YOUNG * 1e-3, 1e-6);
    vec_approx_eq(&Vector::from(&&last[6..9]), &[0.0, 0.0, 0.0], 1e-8);
    approx_eq(last[2], -POISSON * 1e-3, 1e-12);
    approx_eq(last[3], -POISSON * 1e-3, 1e-12);
    Ok(())
}

#[test]
fn test_elastic_shear_strain_uses_tensorial_components() -> Result<(), Error> {
    // εxy = 1e-3 → σxy = 2 G εxy (stored as √2 σxy)
    let mut driver = elastic_driver();
    driver.impose_strain("EXY", Evolution::constant(1e-3))?;
    let mut table = ResultTable::new();
    driver.run(&[0.0, 1.0], &mut table)?;
    let gg = YOUNG / (2.0 * (1.0 + POISSON));
    let sxy = table.column("SXY").unwrap();
    let exy = table.column("EXY").unwrap();
    approx_eq(exy[1], f64::sqrt(2.0) * 1e-3, 1e-15);
    approx_eq(sxy[1], f64::sqrt(2.0) * 2.0 * gg * 1e-3, 1e-8);
    Ok(())
}

#[test]
fn test_elastic_free_thermal_expansion() -> Result<(), Error> {
    // no constraint: the material point expands freely
    let mut driver = elastic_driver();
    driver
        .set_evolution("Temperature", Evolution::linear(&[0.0, 1.0], &[293.15, 393.15]).unwrap())
        .set_evolution("ThermalExpansion", Evolution::constant(1e-5));
    let mut table = ResultTable::new();
    driver.run(&[0.0, 0.5, 1.0], &mut table)?;
    let last = table.last().unwrap();
    vec_approx_eq(&Vector::from(&&last[1..7]), &[1e-3, 1e-3, 1e-3, 0.0, 0.0, 0.0], 1e-12);
    vec_approx_eq(&Vector::from(&&last[7..13]), &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 1e-6);
    let exx = table.column("EXX").unwrap();
    approx_eq(exx[1], 0.5e-3, 1e-12);
    Ok(())
}

#[test]
fn test_elastic_initial_stress_is_kept() -> Result<(), Error> {
    let mut driver = elastic_driver();
    driver.set_initial_thermodynamic_forces(&[10.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    driver.impose_stress("SXX", Evolution::constant(10.0))?;
    let mut table = ResultTable::new();
    driver.run(&[0.0, 1.0], &mut table)?;
    let exx = table.column("EXX").unwrap();
    let sxx = table.column("SXX").unwrap();
    approx_eq(exx[1], 0.0, 1e-15);
    approx_eq(sxx[1], 10.0, 1e-12);
    Ok(())
}

#[test]
fn test_elastic_reference_value_check() -> Result<(), Error> {
    let mut driver = elastic_driver();
    driver.impose_stress("SXX", Evolution::linear(&[0.0, 1.0], &[0.0, 100.0]).unwrap())?;
    let good = ReferenceValueCheck::new("EXX", Evolution::linear(&[0.0, 1.0], &[0.0, 5e-4]).unwrap(), 1e-9).unwrap();
    let bad = ReferenceValueCheck::new("EYY", Evolution::constant(0.0), 1e-9).unwrap();
    driver.add_check(Box::new(good)).add_check(Box::new(bad));
    let mut table = ResultTable::new();
    let summary = driver.run(&[0.0, 0.5, 1.0], &mut table)?;
    assert_eq!(summary.checks.len(), 4);
    assert!(summary.checks[0].passed);
    assert!(!summary.checks[1].passed);
    assert!(summary.checks[2].passed);
    assert!(!summary.checks[3].passed);
    assert!(!summary.all_checks_passed());
    approx_eq(summary.checks[3].t, 1.0, 1e-15);
    Ok(())
}
