use super::{Constraint, CurrentState, WorkSpace};
use crate::acceleration::AccelerationAlgorithm;
use crate::base::{BehaviourKind, Control, Hypothesis, IntegrationFailure, NumericalTangentMismatch};
use crate::base::{PredictionPolicy, StiffnessKind, Verbosity};
use crate::material::{BehaviourInput, BehaviourModel};
use crate::StrError;
use russell_lab::{solve_lin_sys, Matrix, Vector};

/// Solves the nonlinear system of one time step by Newton-Raphson iterations
///
/// The unknowns are the driving variables followed by the Lagrange multipliers of the
/// constraints. The equations are the thermodynamic forces (the material point is free of
/// external loads) and the constraint equations.
pub struct NewtonSolver<'a> {
    /// Holds the control parameters
    control: &'a Control,

    /// Modelling hypothesis
    hypothesis: Hypothesis,

    /// Holds the behaviour
    behaviour: &'a mut BehaviourModel,

    /// Holds the constraints (in declaration order)
    constraints: &'a [Constraint],

    /// Holds the (optional) acceleration algorithm
    accelerator: Option<&'a mut AccelerationAlgorithm>,

    /// Rotation matrix from the global frame to the material frame
    rotation: &'a Matrix,

    /// Kind of behaviour
    kind: BehaviourKind,

    /// Number of driving variables
    ndv: usize,

    /// Kind of stiffness requested at each iteration
    stiffness: StiffnessKind,

    /// Holds the buffers
    pub ws: WorkSpace,
}

impl<'a> NewtonSolver<'a> {
    /// Allocates a new instance
    pub fn new(
        control: &'a Control,
        hypothesis: Hypothesis,
        behaviour: &'a mut BehaviourModel,
        constraints: &'a [Constraint],
        mut accelerator: Option<&'a mut AccelerationAlgorithm>,
        rotation: &'a Matrix,
    ) -> Result<Self, StrError> {
        let kind = behaviour.actual.kind();
        let ndv = behaviour.actual.n_driving_variables(hypothesis);
        let nth = behaviour.actual.n_thermodynamic_forces(hypothesis);
        let niv = behaviour.actual.n_internal_variables(hypothesis);
        if ndv == 0 {
            return Err("the behaviour must have at least one driving variable");
        }
        let n_force_rows = match kind {
            BehaviourKind::FiniteStrain => hypothesis.n_tensor(),
            _ => nth,
        };
        if n_force_rows != ndv {
            return Err("the numbers of driving variables and thermodynamic forces are inconsistent");
        }
        let n_multipliers: usize = constraints.iter().map(|c| c.n_multipliers()).sum();
        if let Some(aa) = accelerator.as_mut() {
            aa.actual.initialize(ndv + n_multipliers)?;
        }
        let stiffness = match control.stiffness {
            Some(s) => s,
            None => behaviour.actual.default_stiffness_kind(),
        };
        Ok(NewtonSolver {
            control,
            hypothesis,
            behaviour,
            constraints,
            accelerator,
            rotation,
            kind,
            ndv,
            stiffness,
            ws: WorkSpace::new(ndv, n_multipliers, nth, niv),
        })
    }

    /// Returns the total number of unknowns (driving variables and multipliers)
    pub fn n_unknowns(&self) -> usize {
        self.ws.rr.dim()
    }

    /// Returns the factor proposed by the behaviour for the next time increment
    pub fn time_step_scaling_factor(&self) -> f64 {
        self.behaviour.actual.time_step_scaling_factor()
    }

    /// Builds the initial guess of the end state according to the prediction policy
    ///
    /// The end state must equal the beginning state when this function is called. If the
    /// prediction operator is not available, the end state is left untouched.
    pub fn predict(&mut self, state: &mut CurrentState, t: f64, dt: f64) {
        let stiffness = match self.control.prediction {
            PredictionPolicy::NoPrediction => return,
            PredictionPolicy::LinearPrediction => {
                state.linear_prediction(dt);
                return;
            }
            other => match other.stiffness_kind() {
                Some(s) => s,
                None => return,
            },
        };

        // prediction operator
        let input = BehaviourInput {
            hypothesis: self.hypothesis,
            rotation: self.rotation,
            e0: &state.e0,
            e1: &state.e0,
            s0: &state.s0,
            mprops: &state.mprops0,
            iv0: &state.iv0,
            esv0: &state.esv0,
            desv: &state.desv,
            dt,
            stiffness,
        };
        if let Err(e) = self.behaviour.actual.compute_prediction_operator(&mut self.ws.kp, &input) {
            self.control
                .print_warning(&format!("the computation of the prediction operator failed: {}", e));
            return;
        }

        // linearized system
        self.assemble(state, t, dt, true);
        if let Err(e) = self.solve_linear_system() {
            self.control.print_warning(&format!("the prediction failed: {}", e));
            return;
        }
        for i in 0..state.u1.dim() {
            state.u1[i] -= self.ws.du[i];
        }
    }

    /// Solves the time step
    ///
    /// Returns the number of iterations.
    pub fn solve(&mut self, state: &mut CurrentState, t: f64, dt: f64) -> Result<usize, IntegrationFailure> {
        let ndv = self.ndv;
        let n = self.n_unknowns();
        let (eeps, seps) = (self.control.eeps, self.control.seps);
        if let Some(aa) = self.accelerator.as_mut() {
            aa.actual.pre_step();
        }
        let (mut ne, mut ne_prev, mut ne_prev2) = (0.0, 0.0, 0.0);
        let mut iteration = 0;
        loop {
            iteration += 1;
            ne_prev2 = ne_prev;
            ne_prev = ne;

            // mechanical part of the driving variables
            for i in 0..ndv {
                state.e1[i] = state.u1[i] - state.e_th1[i];
            }

            // behaviour integration
            self.integrate(state, dt, self.stiffness)
                .map_err(|e| IntegrationFailure::Behaviour(e.to_string()))?;
            if self.stiffness == StiffnessKind::NoStiffness {
                self.numerical_tangent(state, dt)
                    .map_err(|e| IntegrationFailure::Behaviour(e.to_string()))?;
                let (nrow, ncol) = self.ws.kt.dims();
                for i in 0..nrow {
                    for j in 0..ncol {
                        self.ws.kt.set(i, j, self.ws.nkt.get(i, j));
                    }
                }
            } else if self.control.compare_to_numerical_tangent
                && self.stiffness == StiffnessKind::ConsistentTangentOperator
            {
                match self.numerical_tangent(state, dt) {
                    Ok(()) => {
                        if let Some(mismatch) = self.compare_tangents() {
                            self.control.print_tangent_mismatch(&mismatch);
                        }
                    }
                    Err(e) => self.control.print_warning(&format!(
                        "the numerical evaluation of the tangent operator failed: {}",
                        e
                    )),
                }
            }

            // linear system
            self.assemble(state, t, dt, false);
            if self.control.verbose >= Verbosity::Debug {
                println!("K =\n{}\nR =\n{}", self.ws.kk, self.ws.rr);
            }
            let nr = max_abs(&self.ws.rr, ndv);
            self.solve_linear_system()
                .map_err(|e| IntegrationFailure::LinearSolver(e.to_string()))?;
            for i in 0..n {
                state.u1[i] -= self.ws.du[i];
            }
            ne = max_abs(&self.ws.du, ndv);

            // convergence
            let order = if iteration >= 3 && ne > 0.0 && ne_prev > 0.0 && ne_prev2 > 0.0 && ne_prev != ne_prev2 {
                Some(f64::ln(ne / ne_prev) / f64::ln(ne_prev / ne_prev2))
            } else {
                None
            };
            let previous = if iteration > 1 { Some(ne_prev) } else { None };
            self.control.print_iteration(iteration, ne, nr, previous, order);
            if !ne.is_finite() || !nr.is_finite() {
                return Err(IntegrationFailure::NonFinite { iteration });
            }
            let mut converged = ne < eeps
                && nr < seps
                && self
                    .constraints
                    .iter()
                    .all(|c| c.check_convergence(&state.u1, &state.s1, eeps, seps, t, dt));
            if self.control.prediction == PredictionPolicy::NoPrediction {
                converged = converged && iteration > 1;
            }
            if converged {
                if let Some(aa) = self.accelerator.as_mut() {
                    aa.actual.post_step();
                }
                return Ok(iteration);
            }
            if iteration >= self.control.n_max_iterations {
                return Err(IntegrationFailure::NotConverged {
                    iterations: iteration,
                    failed_criteria: self.failed_criteria(state, iteration, ne, nr, t, dt),
                });
            }

            // acceleration
            if let Some(aa) = self.accelerator.as_mut() {
                aa.actual
                    .execute(&mut state.u1, &self.ws.du, &self.ws.rr, eeps, seps, iteration);
            }
        }
    }

    /// Integrates the behaviour from the beginning to the end of the step
    fn integrate(&mut self, state: &mut CurrentState, dt: f64, stiffness: StiffnessKind) -> Result<(), StrError> {
        let input = BehaviourInput {
            hypothesis: self.hypothesis,
            rotation: self.rotation,
            e0: &state.e0,
            e1: &state.e1,
            s0: &state.s0,
            mprops: &state.mprops1,
            iv0: &state.iv0,
            esv0: &state.esv0,
            desv: &state.desv,
            dt,
            stiffness,
        };
        self.behaviour
            .actual
            .integrate(&mut self.ws.kt, &mut state.s1, &mut state.iv1, &input)?;
        if !state.s1.as_data().iter().all(|v| v.is_finite()) {
            return Err("the behaviour returned NaN or Inf");
        }
        Ok(())
    }

    /// Computes the tangent operator by central differences
    ///
    /// The end state (s1, iv1) is not modified.
    fn numerical_tangent(&mut self, state: &CurrentState, dt: f64) -> Result<(), StrError> {
        let pv = self.control.tangent_perturbation();
        let nth = state.s1.dim();
        for j in 0..self.ndv {
            for sign in [1.0, -1.0] {
                for i in 0..self.ndv {
                    self.ws.e_pert[i] = state.e1[i];
                }
                self.ws.e_pert[j] += sign * pv;
                let input = BehaviourInput {
                    hypothesis: self.hypothesis,
                    rotation: self.rotation,
                    e0: &state.e0,
                    e1: &self.ws.e_pert,
                    s0: &state.s0,
                    mprops: &state.mprops1,
                    iv0: &state.iv0,
                    esv0: &state.esv0,
                    desv: &state.desv,
                    dt,
                    stiffness: StiffnessKind::NoStiffness,
                };
                self.behaviour
                    .actual
                    .integrate(&mut self.ws.kp, &mut self.ws.s_pert, &mut self.ws.iv_pert, &input)?;
                for i in 0..nth {
                    let value = if sign > 0.0 {
                        self.ws.s_pert[i] / (2.0 * pv)
                    } else {
                        self.ws.nkt.get(i, j) - self.ws.s_pert[i] / (2.0 * pv)
                    };
                    self.ws.nkt.set(i, j, value);
                }
            }
        }
        Ok(())
    }

    /// Compares the analytic and numerical tangent operators
    fn compare_tangents(&self) -> Option<NumericalTangentMismatch> {
        let tolerance = self.control.tangent_tolerance();
        let (nrow, ncol) = self.ws.kt.dims();
        let mut max_error = 0.0;
        for i in 0..nrow {
            for j in 0..ncol {
                max_error = f64::max(max_error, f64::abs(self.ws.kt.get(i, j) - self.ws.nkt.get(i, j)));
            }
        }
        if max_error > tolerance {
            Some(NumericalTangentMismatch {
                max_error,
                tolerance,
                analytic: self.ws.kt.clone(),
                numerical: self.ws.nkt.clone(),
            })
        } else {
            None
        }
    }

    /// Assembles the Jacobian matrix and the residual vector
    ///
    /// With `prediction`, the prediction operator and the beginning values are used and the
    /// increment of the thermal strain is accounted for.
    fn assemble(&mut self, state: &CurrentState, t: f64, dt: f64, prediction: bool) {
        let ndv = self.ndv;
        let ws = &mut self.ws;
        let (kt, s) = if prediction {
            (&ws.kp, &state.s0)
        } else {
            (&ws.kt, &state.s1)
        };
        ws.kk.fill(0.0);
        ws.rr.fill(0.0);
        let nth = s.dim();
        if self.kind == BehaviourKind::FiniteStrain {
            // an off-diagonal stress component k couples the rows 2k-3 and 2k-2
            for k in 0..nth {
                let rows = if k < 3 { [k, k] } else { [2 * k - 3, 2 * k - 2] };
                let n_rows = if k < 3 { 1 } else { 2 };
                for row in &rows[..n_rows] {
                    ws.rr[*row] += s[k];
                    for j in 0..ndv {
                        ws.kk.set(*row, j, ws.kk.get(*row, j) + kt.get(k, j));
                    }
                }
            }
        } else {
            for i in 0..nth {
                ws.rr[i] = s[i];
                for j in 0..ndv {
                    ws.kk.set(i, j, kt.get(i, j));
                }
            }
        }
        if prediction && self.kind == BehaviourKind::SmallStrain {
            for i in 0..nth {
                for j in 0..ndv {
                    ws.rr[i] -= ws.kk.get(i, j) * (state.e_th1[j] - state.e_th0[j]);
                }
            }
        }
        ws.freeze_normalisation_factor();
        let mut pos = ndv;
        for c in self.constraints {
            c.set_values(&mut ws.kk, &mut ws.rr, &state.u1, pos, t, dt, ws.a);
            pos += c.n_multipliers();
        }
    }

    /// Solves K δu = R
    fn solve_linear_system(&mut self) -> Result<(), StrError> {
        let n = self.ws.rr.dim();
        for i in 0..n {
            self.ws.du[i] = self.ws.rr[i];
            for j in 0..n {
                self.ws.kk_lu.set(i, j, self.ws.kk.get(i, j));
            }
        }
        solve_lin_sys(&mut self.ws.du, &mut self.ws.kk_lu)
    }

    /// Returns the list of unmet convergence criteria
    fn failed_criteria(&self, state: &CurrentState, iteration: usize, ne: f64, nr: f64, t: f64, dt: f64) -> Vec<String> {
        let (eeps, seps) = (self.control.eeps, self.control.seps);
        let mut failed = Vec::new();
        if !(ne < eeps) {
            failed.push(format!(
                "test on driving variables (error : {:e}, criterion value : {:e})",
                ne, eeps
            ));
        }
        if !(nr < seps) {
            failed.push(format!(
                "test on thermodynamic forces (error : {:e}, criterion value : {:e})",
                nr, seps
            ));
        }
        for c in self.constraints {
            if !c.check_convergence(&state.u1, &state.s1, eeps, seps, t, dt) {
                failed.push(c.failed_criteria_diagnostic(&state.u1, &state.s1, eeps, seps, t, dt));
            }
        }
        if failed.is_empty() && iteration < 2 {
            failed.push("at least two iterations are required without prediction".to_string());
        }
        failed
    }
}

/// Returns the maximum absolute value of the first n components
fn max_abs(v: &Vector, n: usize) -> f64 {
    let mut res: f64 = 0.0;
    for i in 0..n {
        let a = f64::abs(v[i]);
        if a.is_nan() {
            return f64::NAN;
        }
        res = f64::max(res, a);
    }
    res
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
