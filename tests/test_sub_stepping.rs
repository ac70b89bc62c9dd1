use mpsim::prelude::*;
use russell_lab::{approx_eq, Matrix, Vector};

/// Linear spring rejecting time increments larger than `dt_max`
struct FragileSpring {
    dt_max: f64,
}

impl Behaviour for FragileSpring {
    fn kind(&self) -> mpsim::base::BehaviourKind {
        mpsim::base::BehaviourKind::General
    }

    fn n_driving_variables(&self, _hypothesis: Hypothesis) -> usize {
        1
    }

    fn n_thermodynamic_forces(&self, _hypothesis: Hypothesis) -> usize {
        1
    }

    fn material_property_names(&self) -> Vec<String> {
        vec!["Stiffness".to_string()]
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        s1: &mut Vector,
        _iv1: &mut Vector,
        input: &BehaviourInput,
    ) -> Result<(), StrError> {
        if input.dt > self.dt_max {
            return Err("the time increment is too large");
        }
        let k = input.mprops[0];
        s1[0] = input.s0[0] + k * (input.e1[0] - input.e0[0]);
        kt.set(0, 0, k);
        Ok(())
    }
}

fn fragile_driver(dt_max: f64) -> Driver {
    let mut driver = Driver::new(Hypothesis::Tridimensional);
    driver
        .set_behaviour(BehaviourModel {
            actual: Box::new(FragileSpring { dt_max }),
        })
        .set_evolution("Stiffness", Evolution::constant(10.0));
    driver
        .impose_thermodynamic_force("S0", Evolution::linear(&[0.0, 1.0], &[0.0, 5.0]).unwrap())
        .unwrap();
    driver
}

#[test]
fn test_sub_stepping_two_attempts() -> Result<(), Error> {
    let mut driver = fragile_driver(0.5);
    let mut table = ResultTable::new();
    let summary = driver.run(&[0.0, 1.0], &mut table)?;

    // dt = 1 fails; dt = 0.5 succeeds; the rest of the interval keeps dt = 0.5
    assert_eq!(summary.attempts.len(), 3);
    assert_eq!(summary.attempts[0].converged, false);
    assert_eq!(summary.attempts[0].dt, 1.0);
    assert_eq!(summary.attempts[0].iterations, 0);
    assert_eq!(summary.attempts[1].converged, true);
    assert_eq!(summary.attempts[1].t, 0.0);
    assert_eq!(summary.attempts[1].dt, 0.5);
    assert_eq!(summary.attempts[2].t, 0.5);
    assert_eq!(summary.attempts[2].dt, 0.5);

    // first commit at t = 0.5
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[1][0], 0.5);
    approx_eq(table.rows[1][1], 0.25, 1e-12);
    approx_eq(table.rows[2][1], 0.5, 1e-12);
    Ok(())
}

#[test]
fn test_sub_stepping_halves_the_time_increment() -> Result<(), Error> {
    let mut driver = fragile_driver(0.1);
    let mut table = ResultTable::new();
    let summary = driver.run(&[0.0, 1.0], &mut table)?;
    let dts: Vec<_> = summary.attempts.iter().take(5).map(|a| a.dt).collect();
    assert_eq!(dts, &[1.0, 0.5, 0.25, 0.125, 0.0625]);
    assert_eq!(summary.n_failed(), 4);
    assert_eq!(summary.n_committed(), 16);
    approx_eq(driver.state().unwrap().t, 1.0, 1e-14);
    approx_eq(table.last().unwrap()[1], 0.5, 1e-12);
    Ok(())
}

#[test]
fn test_sub_stepping_exhausted() {
    let mut driver = fragile_driver(0.0);
    driver.control.set_n_max_sub_steps(3).unwrap();
    let mut table = ResultTable::new();
    match driver.run(&[0.0, 1.0], &mut table) {
        Err(Error::SubSteppingExhausted {
            sub_steps,
            failed_criteria,
        }) => {
            assert_eq!(sub_steps, 3);
            assert_eq!(
                failed_criteria,
                &["behaviour integration failed: the time increment is too large"]
            );
        }
        _ => panic!("sub-stepping should be exhausted"),
    }
    // only the initial state has been recorded
    assert_eq!(table.rows.len(), 1);
    assert_eq!(driver.state().unwrap().t, 0.0);
}

#[test]
fn test_sub_stepping_reports_the_failed_criteria() {
    let mut driver = fragile_driver(1.0);
    driver.control.set_n_max_iterations(1).unwrap().set_n_max_sub_steps(2).unwrap();
    let mut table = ResultTable::new();
    match driver.run(&[0.0, 1.0], &mut table) {
        Err(Error::SubSteppingExhausted { failed_criteria, .. }) => {
            // dt = 0.5: |δu| = 0.25 and σ = 0 at the beginning of the iteration
            assert_eq!(
                failed_criteria,
                &[
                    "test on driving variables (error : 2.5e-1, criterion value : 1e-12)",
                    "imposed thermodynamic force S0 not reached (error : 2.5e0, criterion value : 1e-3)",
                ]
            );
        }
        _ => panic!("sub-stepping should be exhausted"),
    }
}

#[test]
fn test_dynamic_time_step_too_small() {
    let mut driver = fragile_driver(0.01);
    driver.control.set_dynamic_time_step_scaling(0.2, None).unwrap();
    let mut table = ResultTable::new();
    match driver.run(&[0.0, 1.0], &mut table) {
        Err(Error::TimeStepTooSmall { dt, dt_min }) => {
            // r = 1 → dt *= max(min(0.5, 1), rdt_min) = 0.5
            assert_eq!(dt, 0.125);
            assert_eq!(dt_min, 0.2);
        }
        _ => panic!("the time step should become too small"),
    }
}
