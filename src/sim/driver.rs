use super::{CheckOutcome, Constraint, CurrentState, NewtonSolver, ResultSink, ThermalStrain, UserCheck};
use super::VariableNames;
use crate::acceleration::{AccelerationAlgorithm, AccelerationRegistry};
use crate::base::{BehaviourKind, Control, Error, Evolution, Evolutions, Hypothesis, IntegrationFailure};
use crate::base::OutputFrequency;
use crate::material::{Behaviour, BehaviourModel};
use crate::StrError;
use russell_lab::Matrix;

/// Defines the relative tolerance used to detect the end of a loading interval (dynamic time step)
const INTERVAL_END_TOLERANCE: f64 = 1e-10;

/// Defines the tolerance of the orthogonality test of the rotation matrix
const ROTATION_TOLERANCE: f64 = 1e-10;

/// Holds the data of one attempt to solve a time step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepAttempt {
    /// Time at the beginning of the step
    pub t: f64,

    /// Time increment
    pub dt: f64,

    /// Indicates that the Newton iterations converged
    pub converged: bool,

    /// Number of iterations (zero if the attempt failed before the convergence test)
    pub iterations: usize,
}

/// Holds a summary of a run
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// All attempts, including the failed ones
    pub attempts: Vec<StepAttempt>,

    /// Outcomes of the user checks, in the order they were performed
    pub checks: Vec<CheckOutcome>,
}

impl RunSummary {
    /// Returns the number of committed steps
    pub fn n_committed(&self) -> usize {
        self.attempts.iter().filter(|a| a.converged).count()
    }

    /// Returns the number of failed attempts (sub-steps)
    pub fn n_failed(&self) -> usize {
        self.attempts.iter().filter(|a| !a.converged).count()
    }

    /// Indicates that all user checks have passed
    pub fn all_checks_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Drives the material point along a loading path
///
/// # Example
///
/// ```
/// use mpsim::prelude::*;
/// use russell_lab::approx_eq;
///
/// fn main() -> Result<(), Error> {
///     let mut driver = Driver::new(Hypothesis::Tridimensional);
///     driver
///         .set_behaviour(BehaviourModel::new(&ParamBehaviour::LinearElastic).unwrap())
///         .set_evolution("YoungModulus", Evolution::constant(200000.0))
///         .set_evolution("PoissonRatio", Evolution::constant(0.3));
///     driver.impose_stress("SXX", Evolution::linear(&[0.0, 1.0], &[0.0, 100.0]).unwrap())?;
///     let mut table = ResultTable::new();
///     driver.run(&[0.0, 1.0], &mut table)?;
///     let exx = table.column("EXX").unwrap();
///     approx_eq(exx[1], 5e-4, 1e-9);
///     Ok(())
/// }
/// ```
pub struct Driver {
    /// Modelling hypothesis
    hypothesis: Hypothesis,

    /// Holds the behaviour
    behaviour: Option<BehaviourModel>,

    /// Holds the control parameters
    pub control: Control,

    /// Holds the evolutions (material properties, external state variables, ...)
    pub evolutions: Evolutions,

    /// Holds the user constraints (in declaration order)
    constraints: Vec<Constraint>,

    /// Holds the (optional) acceleration algorithm
    accelerator: Option<AccelerationAlgorithm>,

    /// Holds the user checks
    checks: Vec<Box<dyn UserCheck>>,

    /// Rotation matrix from the global frame to the material frame
    rotation: Matrix,

    /// Initial values of the driving variables (None means the behaviour's default)
    initial_driving_variables: Option<Vec<f64>>,

    /// Initial values of the thermodynamic forces (None means zero)
    initial_thermodynamic_forces: Option<Vec<f64>>,

    /// Initial values of the internal state variables (None means zero)
    initial_internal_variables: Option<Vec<f64>>,

    /// Holds the state at the end of the last run
    state: Option<CurrentState>,
}

impl Driver {
    /// Allocates a new instance
    pub fn new(hypothesis: Hypothesis) -> Self {
        Driver {
            hypothesis,
            behaviour: None,
            control: Control::new(),
            evolutions: Evolutions::new(),
            constraints: Vec::new(),
            accelerator: None,
            checks: Vec::new(),
            rotation: Matrix::from(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
            initial_driving_variables: None,
            initial_thermodynamic_forces: None,
            initial_internal_variables: None,
            state: None,
        }
    }

    /// Returns the modelling hypothesis
    pub fn hypothesis(&self) -> Hypothesis {
        self.hypothesis
    }

    /// Sets the behaviour
    ///
    /// The constraints declared so far are removed because they refer to the components of the
    /// previous behaviour.
    pub fn set_behaviour(&mut self, behaviour: BehaviourModel) -> &mut Self {
        self.behaviour = Some(behaviour);
        self.constraints.clear();
        self
    }

    /// Sets the control parameters
    pub fn set_control(&mut self, control: Control) -> &mut Self {
        self.control = control;
        self
    }

    /// Sets an evolution (material property, external state variable, thermal expansion, ...)
    pub fn set_evolution(&mut self, name: &str, evolution: Evolution) -> &mut Self {
        self.evolutions.set(name, evolution);
        self
    }

    /// Imposes a driving variable given by name
    pub fn impose_driving_variable(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, Error> {
        let c = Constraint::imposed_driving_variable(self.behaviour_ref()?, self.hypothesis, name, evolution)?;
        self.add_constraint(c)
    }

    /// Imposes a thermodynamic force given by name
    pub fn impose_thermodynamic_force(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, Error> {
        let c = Constraint::imposed_thermodynamic_force(self.behaviour_ref()?, self.hypothesis, name, evolution)?;
        self.add_constraint(c)
    }

    /// Imposes a component of the strain (small strain behaviours)
    pub fn impose_strain(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, Error> {
        let c = Constraint::imposed_strain(self.behaviour_ref()?, self.hypothesis, name, evolution)?;
        self.add_constraint(c)
    }

    /// Imposes a component of the stress (small and finite strain behaviours)
    pub fn impose_stress(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, Error> {
        let c = Constraint::imposed_stress(self.behaviour_ref()?, self.hypothesis, name, evolution)?;
        self.add_constraint(c)
    }

    /// Imposes a component of the deformation gradient (finite strain behaviours)
    pub fn impose_deformation_gradient(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, Error> {
        let c = Constraint::imposed_deformation_gradient(self.behaviour_ref()?, self.hypothesis, name, evolution)?;
        self.add_constraint(c)
    }

    /// Imposes a component of the opening displacement (cohesive zone models)
    pub fn impose_opening_displacement(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, Error> {
        let c = Constraint::imposed_opening_displacement(self.behaviour_ref()?, self.hypothesis, name, evolution)?;
        self.add_constraint(c)
    }

    /// Imposes a component of the cohesive force (cohesive zone models)
    pub fn impose_cohesive_force(&mut self, name: &str, evolution: Evolution) -> Result<&mut Self, Error> {
        let c = Constraint::imposed_cohesive_force(self.behaviour_ref()?, self.hypothesis, name, evolution)?;
        self.add_constraint(c)
    }

    /// Adds a constraint
    ///
    /// Returns an error if another constraint already imposes the same component.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<&mut Self, Error> {
        if let Some(other) = self.constraints.iter().find(|c| c.conflicts_with(&constraint)) {
            return Err(Error::configuration(
                "constraints",
                format!("{} is already imposed by another constraint", other.name()),
            ));
        }
        self.constraints.push(constraint);
        Ok(self)
    }

    /// Returns the user constraints
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Selects the acceleration algorithm
    ///
    /// # Input
    ///
    /// * `registry` -- the collection of available algorithms
    /// * `name` -- the name of the algorithm (e.g., "Anderson")
    /// * `parameters` -- (key, value) pairs given to the algorithm
    pub fn set_accelerator(
        &mut self,
        registry: &AccelerationRegistry,
        name: &str,
        parameters: &[(&str, &str)],
    ) -> Result<&mut Self, Error> {
        let algorithm = registry
            .create(name, parameters)
            .map_err(|e| Error::configuration("acceleration", format!("{} ({})", e, name)))?;
        self.accelerator = Some(algorithm);
        Ok(self)
    }

    /// Adds a user check, performed after each committed step
    pub fn add_check(&mut self, check: Box<dyn UserCheck>) -> &mut Self {
        self.checks.push(check);
        self
    }

    /// Sets the rotation matrix from the global frame to the material frame
    pub fn set_rotation(&mut self, rotation: &[[f64; 3]; 3]) -> Result<&mut Self, Error> {
        // R Rᵀ = I
        for i in 0..3 {
            for j in 0..3 {
                let mut rr = 0.0;
                for k in 0..3 {
                    rr += rotation[i][k] * rotation[j][k];
                }
                let delta = if i == j { 1.0 } else { 0.0 };
                if f64::abs(rr - delta) > ROTATION_TOLERANCE {
                    return Err(Error::configuration("rotation", "the rotation matrix must be orthogonal"));
                }
            }
        }
        self.rotation = Matrix::from(rotation);
        Ok(self)
    }

    /// Sets the initial values of the driving variables
    pub fn set_initial_driving_variables(&mut self, values: &[f64]) -> &mut Self {
        self.initial_driving_variables = Some(values.to_vec());
        self
    }

    /// Sets the initial values of the thermodynamic forces
    pub fn set_initial_thermodynamic_forces(&mut self, values: &[f64]) -> &mut Self {
        self.initial_thermodynamic_forces = Some(values.to_vec());
        self
    }

    /// Sets the initial values of the internal state variables
    pub fn set_initial_internal_variables(&mut self, values: &[f64]) -> &mut Self {
        self.initial_internal_variables = Some(values.to_vec());
        self
    }

    /// Returns the names of the variables
    pub fn variable_names(&self) -> Result<VariableNames, Error> {
        let b = self.behaviour_ref()?;
        Ok(VariableNames {
            driving: b.driving_variable_names(self.hypothesis),
            forces: b.thermodynamic_force_names(self.hypothesis),
            internal: b.internal_variable_names(self.hypothesis),
        })
    }

    /// Returns the state at the end of the last run (converged or not)
    pub fn state(&self) -> Option<&CurrentState> {
        self.state.as_ref()
    }

    /// Runs the simulation
    ///
    /// # Input
    ///
    /// * `times` -- the times splitting the loading path (at least two; strictly increasing)
    /// * `sink` -- receives the committed states, including the initial one
    pub fn run(&mut self, times: &[f64], sink: &mut dyn ResultSink) -> Result<RunSummary, Error> {
        // check data
        if let Some(msg) = self.validate(times) {
            self.control.print_warning(&msg.to_string());
            return Err(msg);
        }

        // constraints implied by the modelling hypothesis come first
        let b = self.behaviour_ref()?;
        let mut constraints = Constraint::from_hypothesis(b, self.hypothesis)?;
        for constraint in &self.constraints {
            if let Some(other) = constraints.iter().find(|c| c.conflicts_with(constraint)) {
                return Err(Error::configuration(
                    "constraints",
                    format!(
                        "{} is already imposed by the modelling hypothesis {:?}",
                        other.name(),
                        self.hypothesis
                    ),
                ));
            }
        }
        constraints.extend(self.constraints.iter().cloned());
        let thermal = ThermalStrain::new(b.kind(), self.hypothesis, &self.evolutions)?;

        // initial state
        let names = self.variable_names()?;
        let mut state = self.initial_state(&constraints, times[0])?;
        sink.initialize(&names).map_err(|e| Error::Output(e.to_string()))?;
        for check in self.checks.iter_mut() {
            check
                .initialize(&names)
                .map_err(|e| Error::configuration("checks", e))?;
        }
        let ndv = state.ndv;
        sink.record(
            state.t,
            &state.u0.as_data()[..ndv],
            state.s0.as_data(),
            state.iv0.as_data(),
        )
        .map_err(|e| Error::Output(e.to_string()))?;

        // time loop
        let result = self.time_loop(&mut state, times, sink, &constraints, &thermal);
        self.state = Some(state);
        result
    }

    /// Validates all data
    fn validate(&self, times: &[f64]) -> Option<Error> {
        let b = match &self.behaviour {
            Some(b) => &b.actual,
            None => return Some(Error::configuration("behaviour", "the behaviour has not been set")),
        };
        if b.kind() == BehaviourKind::CohesiveZone && self.hypothesis.space_dim() < 2 {
            return Some(Error::configuration(
                "hypothesis",
                "cohesive zone models require a 2D or 3D modelling hypothesis",
            ));
        }
        if times.len() < 2 {
            return Some(Error::configuration("times", "at least two times are required"));
        }
        for i in 0..times.len() {
            if !times[i].is_finite() {
                return Some(Error::configuration("times", format!("times[{}] is not finite", i)));
            }
            if i > 0 && times[i] <= times[i - 1] {
                return Some(Error::configuration(
                    "times",
                    format!("times must be strictly increasing (times[{}] = {:?})", i, times[i]),
                ));
            }
        }
        if let Some(msg) = self.control.validate() {
            return Some(Error::configuration("control", msg));
        }
        if let Some(msg) = self.evolutions.validate() {
            return Some(Error::configuration("evolutions", msg));
        }
        if let Some(name) = self.evolutions.missing(&b.material_property_names()) {
            return Some(Error::configuration(
                "evolutions",
                format!("the evolution of the material property {} is missing", name),
            ));
        }
        if let Some(name) = self.evolutions.missing(&b.external_state_variable_names()) {
            return Some(Error::configuration(
                "evolutions",
                format!("the evolution of the external state variable {} is missing", name),
            ));
        }
        for constraint in &self.constraints {
            if let Some(msg) = constraint.validate() {
                return Some(Error::configuration("constraints", msg));
            }
        }
        None // all good
    }

    /// Returns a reference to the behaviour or an error if it is missing
    fn behaviour_ref(&self) -> Result<&dyn Behaviour, Error> {
        match &self.behaviour {
            Some(b) => Ok(b.actual.as_ref()),
            None => Err(Error::configuration("behaviour", "the behaviour has not been set")),
        }
    }

    /// Allocates the state and sets the initial values
    fn initial_state(&self, constraints: &[Constraint], t0: f64) -> Result<CurrentState, Error> {
        let b = self.behaviour_ref()?;
        let h = self.hypothesis;
        let ndv = b.n_driving_variables(h);
        let n_multipliers = constraints.iter().map(|c| c.n_multipliers()).sum();
        let mut state = CurrentState::new(
            ndv,
            n_multipliers,
            b.n_thermodynamic_forces(h),
            b.n_internal_variables(h),
            b.material_property_names().len(),
            b.external_state_variable_names().len(),
        );
        state.t = t0;
        state.t_ref = self.control.reference_temperature;
        let init = |e: StrError| Error::configuration("initial values", e);
        match &self.initial_driving_variables {
            Some(values) => state.set_driving_variables(values).map_err(init)?,
            None => state
                .set_driving_variables(b.driving_variables_initial_values(h).as_data())
                .map_err(init)?,
        }
        if let Some(values) = &self.initial_thermodynamic_forces {
            state.set_thermodynamic_forces(values).map_err(init)?;
        }
        if let Some(values) = &self.initial_internal_variables {
            state.set_internal_variables(values).map_err(init)?;
        }
        Ok(state)
    }

    /// Runs all loading intervals
    fn time_loop(
        &mut self,
        state: &mut CurrentState,
        times: &[f64],
        sink: &mut dyn ResultSink,
        constraints: &[Constraint],
        thermal: &ThermalStrain,
    ) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::default();
        let control = &self.control;
        let evolutions = &self.evolutions;
        let checks = &self.checks;
        let rotation = &self.rotation;
        let behaviour = match self.behaviour.as_mut() {
            Some(b) => b,
            None => return Err(Error::configuration("behaviour", "the behaviour has not been set")),
        };
        let mprop_names = behaviour.actual.material_property_names();
        let esv_names = behaviour.actual.external_state_variable_names();
        let mut solver = NewtonSolver::new(
            control,
            self.hypothesis,
            behaviour,
            constraints,
            self.accelerator.as_mut(),
            rotation,
        )
        .map_err(|e| Error::configuration("behaviour", e))?;
        let ndv = state.ndv;
        let dynamic = control.dynamic_time_step_scaling;

        control.print_header();
        for interval in times.windows(2) {
            let (ti, te) = (interval[0], interval[1]);
            let mut dt = te - ti;
            if let Some(dt_max) = control.dt_max {
                if dynamic && dt > dt_max {
                    dt = dt_max;
                }
            }
            let mut n_sub_steps = 0;
            let interval_done = |t: f64, dt: f64| {
                if dynamic {
                    te - t <= INTERVAL_END_TOLERANCE * (te - ti)
                } else {
                    f64::abs(te - t) <= 0.5 * dt
                }
            };
            while !interval_done(state.t, dt) {
                let t = state.t;
                if t + dt > te || (dynamic && dt > te - t - control.dt_min) {
                    dt = te - t;
                }
                control.print_timestep(state.period, t, dt);

                // material properties, external state variables and thermal strain
                let ev = |e: StrError| Error::configuration("evolutions", e);
                evolutions
                    .evaluate(state.mprops0.as_mut_data(), &mprop_names, t)
                    .map_err(ev)?;
                evolutions
                    .evaluate(state.mprops1.as_mut_data(), &mprop_names, t + dt)
                    .map_err(ev)?;
                evolutions.evaluate(state.esv0.as_mut_data(), &esv_names, t).map_err(ev)?;
                evolutions
                    .evaluate(state.desv.as_mut_data(), &esv_names, t + dt)
                    .map_err(ev)?;
                for i in 0..state.esv0.dim() {
                    state.desv[i] -= state.esv0[i];
                }
                thermal
                    .calc(&mut state.e_th0, evolutions, rotation, state.t_ref, t)
                    .map_err(ev)?;
                thermal
                    .calc(&mut state.e_th1, evolutions, rotation, state.t_ref, t + dt)
                    .map_err(ev)?;
                for i in 0..ndv {
                    state.e0[i] = state.u0[i] - state.e_th0[i];
                }

                // solve
                solver.predict(state, t, dt);
                let outcome = match solver.solve(state, t, dt) {
                    Ok(iterations) => {
                        let r = solver.time_step_scaling_factor();
                        if dynamic && r < 1.0 {
                            Err((IntegrationFailure::TimeStepRejected(r), iterations))
                        } else {
                            Ok(iterations)
                        }
                    }
                    Err(failure) => {
                        let iterations = match &failure {
                            IntegrationFailure::NotConverged { iterations, .. } => *iterations,
                            IntegrationFailure::NonFinite { iteration } => *iteration,
                            _ => 0,
                        };
                        Err((failure, iterations))
                    }
                };
                match outcome {
                    Ok(iterations) => {
                        summary.attempts.push(StepAttempt {
                            t,
                            dt,
                            converged: true,
                            iterations,
                        });
                        for check in checks.iter() {
                            let outcome = check.check(state, t, dt, state.period);
                            if !outcome.passed {
                                control.print_warning(&outcome.message);
                            }
                            summary.checks.push(outcome);
                        }
                        state.commit(dt);
                        let at_requested_time = interval_done(state.t, dt);
                        if control.output_frequency == OutputFrequency::EveryPeriod || at_requested_time {
                            sink.record(
                                state.t,
                                &state.u0.as_data()[..ndv],
                                state.s0.as_data(),
                                state.iv0.as_data(),
                            )
                            .map_err(|e| Error::Output(e.to_string()))?;
                        }
                        if dynamic {
                            let r = solver.time_step_scaling_factor();
                            dt *= f64::max(f64::min(control.rdt_max, r), 1.0);
                            if let Some(dt_max) = control.dt_max {
                                dt = f64::min(dt, dt_max);
                            }
                        }
                    }
                    Err((failure, iterations)) => {
                        summary.attempts.push(StepAttempt {
                            t,
                            dt,
                            converged: false,
                            iterations,
                        });
                        n_sub_steps += 1;
                        if n_sub_steps >= control.n_max_sub_steps {
                            return Err(Error::SubSteppingExhausted {
                                sub_steps: n_sub_steps,
                                failed_criteria: failure.failed_criteria(),
                            });
                        }
                        if dynamic {
                            let r = solver.time_step_scaling_factor();
                            dt *= f64::max(f64::min(0.5, r), control.rdt_min);
                            if dt < control.dt_min {
                                return Err(Error::TimeStepTooSmall {
                                    dt,
                                    dt_min: control.dt_min,
                                });
                            }
                        } else {
                            dt *= 0.5;
                        }
                        control.print_sub_step(&failure.to_string(), dt);
                        state.revert();
                    }
                }
            }
        }
        Ok(summary)
    }
}

/// Returns `n + 1` equally spaced times from `t0` to `t1`
pub fn times_linspace(t0: f64, t1: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return vec![t0];
    }
    let dt = (t1 - t0) / (n as f64);
    let mut times: Vec<_> = (0..n).map(|i| t0 + (i as f64) * dt).collect();
    times.push(t1);
    times
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
