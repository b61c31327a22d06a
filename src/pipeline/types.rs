//! Attempt states and per-instance reports.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backend::SearchStats;
use crate::decode::Placement;
use crate::error::InputError;

/// Lifecycle of one packing attempt.
///
/// `Building → Submitted → {Solved, TimedOutWithSolution,
/// TimedOutNoSolution, Infeasible}`; the last four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttemptState {
    /// Encoding the model.
    Building,
    /// The backend is running.
    Submitted,
    /// Solved within the time budget.
    Solved,
    TimedOutWithSolution,
    TimedOutNoSolution,
    /// Proven infeasible under the symmetry-breaking constraints.
    Infeasible,
}

impl AttemptState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Building | Self::Submitted)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_move_to(self, next: AttemptState) -> bool {
        match self {
            Self::Building => next == Self::Submitted,
            Self::Submitted => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Submitted => write!(f, "submitted"),
            Self::Solved => write!(f, "solved"),
            Self::TimedOutWithSolution => write!(f, "time exceeded (incumbent kept)"),
            Self::TimedOutNoSolution => write!(f, "time exceeded"),
            Self::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Outcome of one instance, as handed to the result sink.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceReport {
    pub instance_id: usize,
    pub status: AttemptState,
    /// Wall time of the backend call.
    pub elapsed: Duration,
    /// Height of the placement, when one exists.
    pub achieved_height: Option<i64>,
    pub placement: Option<Placement>,
    pub stats: SearchStats,
}

impl InstanceReport {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// An instance skipped because of bad input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RejectedInstance {
    pub instance_id: usize,
    pub error: InputError,
}

/// Everything a batch produced, in instance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchReport {
    pub reports: Vec<InstanceReport>,
    pub rejected: Vec<RejectedInstance>,
}

impl BatchReport {
    pub fn report(&self, instance_id: usize) -> Option<&InstanceReport> {
        self.reports.iter().find(|r| r.instance_id == instance_id)
    }

    /// Number of instances solved within the budget.
    pub fn solved_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status == AttemptState::Solved)
            .count()
    }
}
