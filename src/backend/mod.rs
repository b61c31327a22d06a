//! Solver backends.
//!
//! A backend takes a [`GeometryModel`] and a wall-clock budget and returns a
//! [`SolveOutcome`]. Three interchangeable adapters are provided, each over
//! an external engine compiled in by a cargo feature:
//!
//! - [`CpBackend`] (`cp`, on by default): the disjunctive
//!   [`SmtFormula`](crate::lowering::SmtFormula) posted to the pumpkin
//!   lazy-clause-generation solver, with a global `cumulative` when every
//!   orientation is fixed
//! - [`MipBackend`] (`milp`): the big-M
//!   [`LinearModel`](crate::lowering::LinearModel) built as `good_lp`
//!   expressions and solved by HiGHS
//! - [`SmtBackend`] (`smt`): the disjunctive formula as z3 terms, minimized
//!   with `Optimize`
//!
//! Every adapter starts its [`Deadline`] before lowering and checks it while
//! building the engine's model; the engine gets what is left of the budget.
//! On expiry the incumbent (if any) comes back with a timeout status.
//! Without its feature a backend fails with
//! [`InputError::BackendUnavailable`](crate::InputError::BackendUnavailable).
//!
//! # References
//!
//! - Schutt, Feydy, Stuckey & Wallace (2011), "Explaining the cumulative propagator"
//! - Huangfu & Hall (2018), "Parallelizing the dual revised simplex method" (HiGHS)
//! - Bjørner, Phan & Fleckenstein (2015), "νZ - an optimizing SMT solver"

mod config;
mod cp;
mod deadline;
mod mip;
mod smt;
mod types;

pub use config::{BackendChoice, SolverConfig};
pub use cp::CpBackend;
pub use mip::MipBackend;
pub use smt::SmtBackend;
pub use types::{Assignment, SearchStats, SolveOutcome, SolveStatus};

pub(crate) use deadline::Deadline;
pub(crate) use types::Termination;

#[cfg(not(all(feature = "cp", feature = "milp", feature = "smt")))]
use crate::error::{FloorplanError, InputError};
use crate::error::Result;
use crate::lowering::NonOverlapEncoding;
use crate::model::GeometryModel;

/// Trait for solver backends.
///
/// Implementations must return within `config.time_limit` (plus the
/// engine's own overrun), must give every model variable a value whenever
/// the status carries a solution, and may report
/// [`SolveStatus::Infeasible`] only with a proof.
pub trait SolverBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// How this backend expresses non-overlap.
    fn encoding(&self) -> NonOverlapEncoding;

    /// Solves the model, minimizing its height variable.
    fn solve(&self, model: &GeometryModel, config: &SolverConfig) -> Result<SolveOutcome>;
}

impl BackendChoice {
    /// Creates the backend for this choice.
    pub fn backend(self) -> Box<dyn SolverBackend> {
        match self {
            Self::Cp => Box::new(CpBackend::new()),
            Self::Mip => Box::new(MipBackend::new()),
            Self::Smt => Box::new(SmtBackend::new()),
        }
    }
}

/// Builds the outcome from the incumbent and how the search ended.
pub(crate) fn finish(
    backend: &str,
    model: &GeometryModel,
    incumbent: Option<(Vec<(i64, i64, bool)>, i64)>,
    termination: Termination,
    deadline: &Deadline,
    stats: SearchStats,
) -> SolveOutcome {
    let status = termination.status(incumbent.is_some());
    let assignment = incumbent
        .map(|(layout, height)| Assignment::from_layout(model, &layout, height));
    let elapsed = deadline.elapsed();
    log::info!(
        "{backend} finished {}: {status} after {:.3}s ({} solutions)",
        model.name,
        elapsed.as_secs_f64(),
        stats.solutions
    );
    SolveOutcome {
        status,
        assignment,
        elapsed,
        stats,
    }
}

/// Outcome when the deadline fired before the engine produced anything.
pub(crate) fn timed_out(backend: &str, model: &GeometryModel, deadline: &Deadline) -> SolveOutcome {
    log::warn!("{backend} spent the budget for {} before solving", model.name);
    finish(backend, model, None, Termination::TimedOut, deadline, SearchStats::default())
}

/// Error for a backend whose feature is off.
#[cfg(not(all(feature = "cp", feature = "milp", feature = "smt")))]
pub(crate) fn unavailable(choice: BackendChoice) -> FloorplanError {
    log::warn!(
        "{choice} backend not available (compile with '{}' feature)",
        choice.feature()
    );
    InputError::BackendUnavailable {
        backend: choice.to_string(),
        feature: choice.feature().to_string(),
    }
    .into()
}
