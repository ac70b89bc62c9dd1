use crate::base::{BehaviourKind, Error, Evolution, Hypothesis};
use crate::material::Behaviour;
use russell_lab::{Matrix, Vector};
use std::f64::consts::SQRT_2;

/// Defines a constraint imposed through a Lagrange multiplier
///
/// Each variant holds the index of the constrained component, the evolution of the imposed
/// value and a scaling factor applied to that value (`√2` for the off-diagonal components of
/// symmetric tensors stored in Mandel representation).
///
/// With `a` the normalisation factor of the multipliers, `λ` the multiplier stored at `pos` and
/// `v = scale · ev(t + dt)`:
///
/// ```text
/// ImposedDrivingVariable:     K[pos][c] = K[c][pos] = a
///                             R[pos] = a (u[c] - v)
///                             R[c]  += a λ
///
/// ImposedThermodynamicForce:  K[row][pos] = -a, K[pos][pos] = a
///                             R[row] -= a λ
///                             R[pos] = a λ - v
/// ```
#[derive(Clone, Debug)]
pub enum Constraint {
    /// Imposes the value of a driving variable
    ImposedDrivingVariable {
        name: String,
        component: usize,
        evolution: Evolution,
        scale: f64,
    },

    /// Imposes the value of a thermodynamic force
    ///
    /// The `rows` are the equations receiving the force; for finite strain behaviours, an
    /// off-diagonal stress component appears in the rows of both associated components of the
    /// deformation gradient.
    ImposedThermodynamicForce {
        name: String,
        component: usize,
        rows: Vec<usize>,
        evolution: Evolution,
        scale: f64,
    },
}

impl Constraint {
    /// Imposes a driving variable given by name
    pub fn imposed_driving_variable(
        behaviour: &dyn Behaviour,
        hypothesis: Hypothesis,
        name: &str,
        evolution: Evolution,
    ) -> Result<Self, Error> {
        let names = behaviour.driving_variable_names(hypothesis);
        let component = find_component(&names, name)?;
        Ok(Constraint::ImposedDrivingVariable {
            name: name.to_string(),
            component,
            evolution,
            scale: 1.0,
        })
    }

    /// Imposes a thermodynamic force given by name
    pub fn imposed_thermodynamic_force(
        behaviour: &dyn Behaviour,
        hypothesis: Hypothesis,
        name: &str,
        evolution: Evolution,
    ) -> Result<Self, Error> {
        let names = behaviour.thermodynamic_force_names(hypothesis);
        let component = find_component(&names, name)?;
        let rows = if behaviour.kind() == BehaviourKind::FiniteStrain && component >= 3 {
            vec![2 * component - 3, 2 * component - 2]
        } else {
            vec![component]
        };
        Ok(Constraint::ImposedThermodynamicForce {
            name: name.to_string(),
            component,
            rows,
            evolution,
            scale: 1.0,
        })
    }

    /// Imposes a component of the strain (small strain behaviours)
    ///
    /// The value of an off-diagonal component is the tensorial shear strain (e.g. εxy).
    pub fn imposed_strain(
        behaviour: &dyn Behaviour,
        hypothesis: Hypothesis,
        name: &str,
        evolution: Evolution,
    ) -> Result<Self, Error> {
        require_kind(behaviour, &[BehaviourKind::SmallStrain], "imposed strain", name)?;
        let mut constraint = Constraint::imposed_driving_variable(behaviour, hypothesis, name, evolution)?;
        constraint.apply_mandel_scale();
        Ok(constraint)
    }

    /// Imposes a component of the stress (small and finite strain behaviours)
    pub fn imposed_stress(
        behaviour: &dyn Behaviour,
        hypothesis: Hypothesis,
        name: &str,
        evolution: Evolution,
    ) -> Result<Self, Error> {
        require_kind(
            behaviour,
            &[BehaviourKind::SmallStrain, BehaviourKind::FiniteStrain],
            "imposed stress",
            name,
        )?;
        let mut constraint = Constraint::imposed_thermodynamic_force(behaviour, hypothesis, name, evolution)?;
        constraint.apply_mandel_scale();
        Ok(constraint)
    }

    /// Imposes a component of the deformation gradient (finite strain behaviours)
    pub fn imposed_deformation_gradient(
        behaviour: &dyn Behaviour,
        hypothesis: Hypothesis,
        name: &str,
        evolution: Evolution,
    ) -> Result<Self, Error> {
        require_kind(
            behaviour,
            &[BehaviourKind::FiniteStrain],
            "imposed deformation gradient",
            name,
        )?;
        Constraint::imposed_driving_variable(behaviour, hypothesis, name, evolution)
    }

    /// Imposes a component of the opening displacement (cohesive zone models)
    pub fn imposed_opening_displacement(
        behaviour: &dyn Behaviour,
        hypothesis: Hypothesis,
        name: &str,
        evolution: Evolution,
    ) -> Result<Self, Error> {
        require_kind(
            behaviour,
            &[BehaviourKind::CohesiveZone],
            "imposed opening displacement",
            name,
        )?;
        Constraint::imposed_driving_variable(behaviour, hypothesis, name, evolution)
    }

    /// Imposes a component of the cohesive force (cohesive zone models)
    pub fn imposed_cohesive_force(
        behaviour: &dyn Behaviour,
        hypothesis: Hypothesis,
        name: &str,
        evolution: Evolution,
    ) -> Result<Self, Error> {
        require_kind(behaviour, &[BehaviourKind::CohesiveZone], "imposed cohesive force", name)?;
        Constraint::imposed_thermodynamic_force(behaviour, hypothesis, name, evolution)
    }

    /// Returns the constraints implied by the modelling hypothesis
    ///
    /// * PlaneStrain: `EZZ = 0` (small strain) or `FZZ = 1` (finite strain)
    /// * PlaneStress: `SZZ = 0` (small and finite strain)
    pub fn from_hypothesis(behaviour: &dyn Behaviour, hypothesis: Hypothesis) -> Result<Vec<Self>, Error> {
        let kind = behaviour.kind();
        let mut constraints = Vec::new();
        match (hypothesis, kind) {
            (Hypothesis::PlaneStrain, BehaviourKind::SmallStrain) => {
                constraints.push(Constraint::imposed_strain(
                    behaviour,
                    hypothesis,
                    "EZZ",
                    Evolution::constant(0.0),
                )?);
            }
            (Hypothesis::PlaneStrain, BehaviourKind::FiniteStrain) => {
                constraints.push(Constraint::imposed_deformation_gradient(
                    behaviour,
                    hypothesis,
                    "FZZ",
                    Evolution::constant(1.0),
                )?);
            }
            (Hypothesis::PlaneStress, BehaviourKind::SmallStrain | BehaviourKind::FiniteStrain) => {
                constraints.push(Constraint::imposed_stress(
                    behaviour,
                    hypothesis,
                    "SZZ",
                    Evolution::constant(0.0),
                )?);
            }
            _ => (),
        }
        Ok(constraints)
    }

    /// Returns the name of the constrained component
    pub fn name(&self) -> &str {
        match self {
            Constraint::ImposedDrivingVariable { name, .. } => name,
            Constraint::ImposedThermodynamicForce { name, .. } => name,
        }
    }

    /// Returns the number of Lagrange multipliers
    pub fn n_multipliers(&self) -> usize {
        1
    }

    /// Returns the imposed value at time t (scaled)
    pub fn target(&self, t: f64) -> f64 {
        match self {
            Constraint::ImposedDrivingVariable { evolution, scale, .. } => scale * evolution.value(t),
            Constraint::ImposedThermodynamicForce { evolution, scale, .. } => scale * evolution.value(t),
        }
    }

    /// Adds the contributions of the constraint to the Jacobian matrix and the residual vector
    ///
    /// # Input
    ///
    /// * `kk` -- the global Jacobian matrix
    /// * `rr` -- the global residual vector
    /// * `u1` -- driving variables and Lagrange multipliers at the end of the step
    /// * `pos` -- the position of the (first) Lagrange multiplier
    /// * `t`, `dt` -- the time at the beginning of the step and the time increment
    /// * `a` -- the normalisation factor
    pub fn set_values(&self, kk: &mut Matrix, rr: &mut Vector, u1: &Vector, pos: usize, t: f64, dt: f64, a: f64) {
        let v = self.target(t + dt);
        match self {
            Constraint::ImposedDrivingVariable { component, .. } => {
                let c = *component;
                kk.set(pos, c, a);
                kk.set(c, pos, a);
                rr[pos] = a * (u1[c] - v);
                rr[c] += a * u1[pos];
            }
            Constraint::ImposedThermodynamicForce { rows, .. } => {
                for row in rows {
                    kk.set(*row, pos, -a);
                    rr[*row] -= a * u1[pos];
                }
                kk.set(pos, pos, a);
                rr[pos] = a * u1[pos] - v;
            }
        }
    }

    /// Returns the error of the constraint (absolute difference to the imposed value)
    pub fn error(&self, u1: &Vector, s1: &Vector, t: f64, dt: f64) -> f64 {
        let v = self.target(t + dt);
        match self {
            Constraint::ImposedDrivingVariable { component, .. } => f64::abs(u1[*component] - v),
            Constraint::ImposedThermodynamicForce { component, .. } => f64::abs(s1[*component] - v),
        }
    }

    /// Checks whether the constraint is satisfied
    pub fn check_convergence(&self, u1: &Vector, s1: &Vector, eeps: f64, seps: f64, t: f64, dt: f64) -> bool {
        let err = self.error(u1, s1, t, dt);
        match self {
            Constraint::ImposedDrivingVariable { .. } => err < eeps,
            Constraint::ImposedThermodynamicForce { .. } => err < seps,
        }
    }

    /// Returns a message describing the unmet criterion
    pub fn failed_criteria_diagnostic(&self, u1: &Vector, s1: &Vector, eeps: f64, seps: f64, t: f64, dt: f64) -> String {
        let err = self.error(u1, s1, t, dt);
        match self {
            Constraint::ImposedDrivingVariable { name, .. } => format!(
                "imposed driving variable {} not reached (error : {:e}, criterion value : {:e})",
                name, err, eeps
            ),
            Constraint::ImposedThermodynamicForce { name, .. } => format!(
                "imposed thermodynamic force {} not reached (error : {:e}, criterion value : {:e})",
                name, err, seps
            ),
        }
    }

    /// Validates the data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        let (name, evolution, scale) = match self {
            Constraint::ImposedDrivingVariable {
                name, evolution, scale, ..
            } => (name, evolution, scale),
            Constraint::ImposedThermodynamicForce {
                name, evolution, scale, ..
            } => (name, evolution, scale),
        };
        if !scale.is_finite() || *scale == 0.0 {
            return Some(format!("scale = {:?} of constraint {} is incorrect; it must be ≠ 0.0", scale, name));
        }
        evolution.validate().map(|msg| format!("constraint {}: {}", name, msg))
    }

    /// Indicates that both constraints impose the same quantity
    pub(crate) fn conflicts_with(&self, other: &Constraint) -> bool {
        match (self, other) {
            (
                Constraint::ImposedDrivingVariable { component: a, .. },
                Constraint::ImposedDrivingVariable { component: b, .. },
            ) => a == b,
            (
                Constraint::ImposedThermodynamicForce { component: a, .. },
                Constraint::ImposedThermodynamicForce { component: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    /// Multiplies the imposed value of an off-diagonal symmetric tensor component by √2
    fn apply_mandel_scale(&mut self) {
        match self {
            Constraint::ImposedDrivingVariable { component, scale, .. }
            | Constraint::ImposedThermodynamicForce { component, scale, .. } => {
                if *component >= 3 {
                    *scale = SQRT_2;
                }
            }
        }
    }
}

/// Returns the index of a component or an incompatibility error
fn find_component(names: &[String], name: &str) -> Result<usize, Error> {
    names.iter().position(|n| n == name).ok_or_else(|| {
        Error::IncompatibleConstraint(format!(
            "component {} is not available (the components are {})",
            name,
            names.join(", ")
        ))
    })
}

/// Checks the kind of behaviour
fn require_kind(behaviour: &dyn Behaviour, kinds: &[BehaviourKind], what: &str, name: &str) -> Result<(), Error> {
    let kind = behaviour.kind();
    if kinds.contains(&kind) {
        Ok(())
    } else {
        Err(Error::IncompatibleConstraint(format!(
            "{} {} cannot be used with a behaviour of kind {:?}",
            what, name, kind
        )))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
