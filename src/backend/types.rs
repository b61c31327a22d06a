//! Solve outcomes and variable assignments.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::model::GeometryModel;

/// Status of a backend after a bounded solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolveStatus {
    /// Proven minimum height.
    Optimal,
    /// A solution, with optimality not proven (early stop requested).
    Feasible,
    /// Budget exhausted before any solution was found.
    TimeoutNoSolution,
    /// Budget exhausted; the incumbent is returned.
    TimeoutWithSolution,
    /// Proven that no placement satisfies the model.
    Infeasible,
}

impl SolveStatus {
    /// Whether an assignment accompanies this status.
    pub fn has_solution(self) -> bool {
        matches!(
            self,
            Self::Optimal | Self::Feasible | Self::TimeoutWithSolution
        )
    }

    pub fn is_timeout(self) -> bool {
        matches!(self, Self::TimeoutNoSolution | Self::TimeoutWithSolution)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Feasible => write!(f, "feasible"),
            Self::TimeoutNoSolution => write!(f, "timed out without a solution"),
            Self::TimeoutWithSolution => write!(f, "timed out with an incumbent"),
            Self::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Why an engine stopped searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    /// The engine proved its answer.
    Exhausted,
    TimedOut,
    /// `stop_after_first` cut the search short.
    StoppedEarly,
}

impl Termination {
    pub fn status(self, has_solution: bool) -> SolveStatus {
        match (self, has_solution) {
            (Self::Exhausted, true) => SolveStatus::Optimal,
            (Self::Exhausted, false) => SolveStatus::Infeasible,
            (Self::TimedOut, true) => SolveStatus::TimeoutWithSolution,
            (Self::TimedOut, false) => SolveStatus::TimeoutNoSolution,
            (Self::StoppedEarly, true) => SolveStatus::Feasible,
            (Self::StoppedEarly, false) => SolveStatus::Infeasible,
        }
    }
}

/// Search telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchStats {
    /// Solutions handed back by the engine.
    pub solutions: u64,
    /// Calls into the engine (`check`, `optimise` or `solve`).
    pub solver_calls: u64,
}

/// Values for the model's variables, indexed by variable id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    pub ints: Vec<Option<i64>>,
    pub bools: Vec<Option<bool>>,
}

impl Assignment {
    /// An empty assignment shaped after `model`.
    pub fn new(model: &GeometryModel) -> Self {
        Self {
            ints: vec![None; model.int_vars().len()],
            bools: vec![None; model.bool_vars().len()],
        }
    }

    /// Builds an assignment from per-circuit `(x, y, rotated)` and a height.
    pub fn from_layout(model: &GeometryModel, layout: &[(i64, i64, bool)], height: i64) -> Self {
        let mut a = Self::new(model);
        a.ints[model.height().0] = Some(height);
        for (i, &(x, y, rotated)) in layout.iter().enumerate() {
            let vars = model.circuit_vars(i);
            a.ints[vars.x.0] = Some(x);
            a.ints[vars.y.0] = Some(y);
            if let Some(r) = vars.rotated {
                a.bools[r.0] = Some(rotated);
            }
        }
        a
    }

    pub fn int(&self, id: crate::model::IntVarId) -> Option<i64> {
        self.ints.get(id.0).copied().flatten()
    }

    pub fn bool(&self, id: crate::model::BoolVarId) -> Option<bool> {
        self.bools.get(id.0).copied().flatten()
    }

    /// Whether every variable has a value.
    pub fn is_complete(&self) -> bool {
        self.ints.iter().all(Option::is_some) && self.bools.iter().all(Option::is_some)
    }
}

/// What a backend returns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Present iff `status.has_solution()`.
    pub assignment: Option<Assignment>,
    pub elapsed: Duration,
    pub stats: SearchStats,
}

impl SolveOutcome {
    /// Objective value of the assignment, if any.
    pub fn height(&self, model: &GeometryModel) -> Option<i64> {
        self.assignment.as_ref().and_then(|a| a.int(model.height()))
    }
}
