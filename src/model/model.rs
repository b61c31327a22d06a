//! Geometry model definition.

use super::constraints::{Constraint, ConstraintFamily};
use super::variables::{BoolVar, BoolVarId, IntVar, IntVarId};
use crate::error::FloorplanError;
use crate::instance::Circuit;

/// Decision variables belonging to one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitVars {
    /// Left edge.
    pub x: IntVarId,
    /// Bottom edge.
    pub y: IntVarId,
    /// Present iff rotation is allowed.
    pub rotated: Option<BoolVarId>,
}

/// The constraint model of one strip-packing instance.
///
/// Holds the per-circuit coordinate variables, the optional rotation
/// variables, the `height` objective variable and the constraint families.
/// The objective is always to minimize [`GeometryModel::height`].
///
/// Built by [`encode`](super::encode); backends only ever see `&GeometryModel`.
///
/// # Examples
///
/// ```
/// use u_floorplan::instance::Instance;
/// use u_floorplan::model::{encode, ConstraintFamily, PackingConfig};
///
/// let instance = Instance::from_dims(8, &[(4, 4), (4, 4)]).unwrap();
/// let model = encode(&instance, &PackingConfig::default()).unwrap();
/// assert_eq!(model.circuit_count(), 2);
/// assert_eq!(model.constraints_in(ConstraintFamily::NonOverlap).count(), 1);
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GeometryModel {
    /// Model name.
    pub name: String,
    plate_width: i64,
    circuits: Vec<Circuit>,
    circuit_vars: Vec<CircuitVars>,
    int_vars: Vec<IntVar>,
    bool_vars: Vec<BoolVar>,
    height: IntVarId,
    constraints: Vec<Constraint>,
}

impl GeometryModel {
    /// Creates a model with the `height` variable and no circuits.
    pub fn new(
        name: impl Into<String>,
        plate_width: i64,
        lower_height_bound: i64,
        upper_height_bound: i64,
    ) -> Self {
        Self {
            name: name.into(),
            plate_width,
            circuits: Vec::new(),
            circuit_vars: Vec::new(),
            int_vars: vec![IntVar::new("height", lower_height_bound, upper_height_bound)],
            bool_vars: Vec::new(),
            height: IntVarId(0),
            constraints: Vec::new(),
        }
    }

    /// Adds an integer variable.
    pub fn add_int_var(&mut self, var: IntVar) -> IntVarId {
        self.int_vars.push(var);
        IntVarId(self.int_vars.len() - 1)
    }

    /// Adds a boolean variable.
    pub fn add_bool_var(&mut self, var: BoolVar) -> BoolVarId {
        self.bool_vars.push(var);
        BoolVarId(self.bool_vars.len() - 1)
    }

    /// Registers a circuit with its variables and returns its index.
    pub fn add_circuit(&mut self, circuit: Circuit, vars: CircuitVars) -> usize {
        self.circuits.push(circuit);
        self.circuit_vars.push(vars);
        self.circuits.len() - 1
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn plate_width(&self) -> i64 {
        self.plate_width
    }

    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }

    /// Original (unrotated) dimensions of circuit `i`.
    pub fn circuit(&self, i: usize) -> &Circuit {
        &self.circuits[i]
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    pub fn circuit_vars(&self, i: usize) -> &CircuitVars {
        &self.circuit_vars[i]
    }

    pub fn int_vars(&self) -> &[IntVar] {
        &self.int_vars
    }

    pub fn bool_vars(&self) -> &[BoolVar] {
        &self.bool_vars
    }

    pub fn int_var(&self, id: IntVarId) -> &IntVar {
        &self.int_vars[id.0]
    }

    pub fn bool_var(&self, id: BoolVarId) -> &BoolVar {
        &self.bool_vars[id.0]
    }

    /// The objective variable.
    pub fn height(&self) -> IntVarId {
        self.height
    }

    pub fn lower_height_bound(&self) -> i64 {
        self.int_vars[self.height.0].min
    }

    pub fn upper_height_bound(&self) -> i64 {
        self.int_vars[self.height.0].max
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Constraints of one family, in insertion order.
    pub fn constraints_in(&self, family: ConstraintFamily) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| c.family() == family)
    }

    pub fn has_family(&self, family: ConstraintFamily) -> bool {
        self.constraints_in(family).next().is_some()
    }

    /// Orientations circuit `i` may take: `false` is upright.
    pub fn orientations(&self, i: usize) -> &'static [bool] {
        match self.circuit_vars[i].rotated {
            Some(id) => self.bool_vars[id.0].values(),
            None => &[false],
        }
    }

    /// Effective `(width, height)` of circuit `i` in an orientation.
    pub fn effective_dims(&self, i: usize, rotated: bool) -> (i64, i64) {
        self.circuits[i].dims(rotated)
    }

    /// Smallest effective width and height over the allowed orientations.
    pub fn min_dims(&self, i: usize) -> (i64, i64) {
        self.orientations(i)
            .iter()
            .map(|&r| self.effective_dims(i, r))
            .fold((i64::MAX, i64::MAX), |(w, h), (ew, eh)| (w.min(ew), h.min(eh)))
    }

    /// The `(first, second)` pair ordered by the symmetry-breaking family.
    pub fn symmetry_pair(&self) -> Option<(usize, usize)> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::LexicographicOrder { first, second } => Some((*first, *second)),
            _ => None,
        })
    }

    /// Circuit confined to the lower-left quadrant, if any.
    pub fn quadrant_circuit(&self) -> Option<usize> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::LowerLeftQuadrant { circuit } => Some(*circuit),
            _ => None,
        })
    }

    /// Whether the redundant cumulative family is present.
    pub fn cumulative_capacity(&self) -> Option<i64> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Cumulative { capacity, .. } => Some(*capacity),
            _ => None,
        })
    }

    /// Validates the model for consistency.
    ///
    /// Checks that every referenced circuit and variable exists and that
    /// every domain is non-empty.
    pub fn validate(&self) -> Result<(), FloorplanError> {
        let n = self.circuits.len();
        if n == 0 {
            return Err(FloorplanError::Encoding("model has no circuits".into()));
        }
        for var in &self.int_vars {
            if var.domain_size() == 0 {
                return Err(FloorplanError::Encoding(format!(
                    "empty domain for {}: [{}, {}]",
                    var.name, var.min, var.max
                )));
            }
        }
        for vars in &self.circuit_vars {
            for id in [vars.x, vars.y] {
                if id.0 >= self.int_vars.len() {
                    return Err(FloorplanError::Encoding(format!(
                        "undefined integer variable #{}",
                        id.0
                    )));
                }
            }
            if let Some(r) = vars.rotated {
                if r.0 >= self.bool_vars.len() {
                    return Err(FloorplanError::Encoding(format!(
                        "undefined boolean variable #{}",
                        r.0
                    )));
                }
            }
        }
        for constraint in &self.constraints {
            if let Some(&bad) = constraint.circuits().iter().find(|&&i| i >= n) {
                return Err(FloorplanError::Encoding(format!(
                    "{} constraint references undefined circuit {bad}",
                    constraint.family()
                )));
            }
            match constraint {
                Constraint::NonOverlap { first, second }
                | Constraint::LexicographicOrder { first, second }
                    if first == second =>
                {
                    return Err(FloorplanError::Encoding(format!(
                        "{} constraint relates circuit {first} to itself",
                        constraint.family()
                    )));
                }
                Constraint::RotationConsistency { circuit, rotated }
                    if self.circuit_vars[*circuit].rotated != Some(*rotated) =>
                {
                    return Err(FloorplanError::Encoding(format!(
                        "rotation constraint of circuit {circuit} names a foreign variable"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
