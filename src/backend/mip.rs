//! Mixed-integer backend: the big-M model solved by HiGHS through `good_lp`.
//!
//! Every [`LinearModel`] column becomes a bounded integer (or binary)
//! variable and every row a `<=` constraint. HiGHS gets what is left of the
//! budget as its time limit. The values it returns are rounded and checked
//! against the rows before they are trusted, so a solution cut short by the
//! time limit is kept only when it is feasible.

use super::{Deadline, SolveOutcome, SolverBackend, SolverConfig};
use crate::error::Result;
use crate::lowering::NonOverlapEncoding;
use crate::model::GeometryModel;

#[cfg(feature = "milp")]
use super::{finish, timed_out, SearchStats, Termination};
#[cfg(not(feature = "milp"))]
use super::{unavailable, BackendChoice};
#[cfg(feature = "milp")]
use crate::error::FloorplanError;
#[cfg(feature = "milp")]
use crate::lowering::{ColumnKind, LinearModel};

#[cfg(feature = "milp")]
use good_lp::solvers::highs::highs;
#[cfg(feature = "milp")]
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};

#[cfg(feature = "milp")]
const NAME: &str = "mip";

/// Big-M model handed to HiGHS.
#[derive(Debug, Clone, Copy, Default)]
pub struct MipBackend;

impl MipBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for MipBackend {
    fn name(&self) -> &str {
        "mip"
    }

    fn encoding(&self) -> NonOverlapEncoding {
        NonOverlapEncoding::BigM
    }

    fn solve(&self, model: &GeometryModel, config: &SolverConfig) -> Result<SolveOutcome> {
        let mut deadline = Deadline::new(config.time_limit);
        solve_with_highs(model, config, &mut deadline)
    }
}

#[cfg(feature = "milp")]
fn solve_with_highs(
    model: &GeometryModel,
    config: &SolverConfig,
    deadline: &mut Deadline,
) -> Result<SolveOutcome> {
    let Some(lm) = LinearModel::lower_within(model, deadline)? else {
        return Ok(timed_out(NAME, model, deadline));
    };

    let mut vars = ProblemVariables::new();
    let columns: Vec<Variable> = lm
        .columns
        .iter()
        .map(|c| {
            let def = match c.kind {
                ColumnKind::Integer => variable().integer(),
                ColumnKind::Binary => variable().binary(),
            };
            vars.add(def.min(c.lower as f64).max(c.upper as f64).name(c.name.clone()))
        })
        .collect();

    let mut problem = vars
        .minimise(columns[lm.objective])
        .using(highs)
        .set_verbose(false);
    if config.stop_after_first {
        problem = problem.set_option("mip_max_improving_sols", 1);
    }
    for row in &lm.rows {
        if deadline.step() {
            return Ok(timed_out(NAME, model, deadline));
        }
        let lhs: Expression = row
            .terms
            .iter()
            .map(|&(c, a)| a as f64 * columns[c])
            .sum();
        let rhs = row.rhs as f64;
        problem = problem.with(constraint!(lhs <= rhs));
    }

    let remaining = deadline.remaining();
    if remaining.is_zero() {
        return Ok(timed_out(NAME, model, deadline));
    }
    log::debug!(
        "HiGHS model for {}: {} columns, {} rows, {:.3}s left",
        model.name,
        columns.len(),
        lm.rows.len(),
        remaining.as_secs_f64()
    );

    let (incumbent, termination) = match problem.set_time_limit(remaining.as_secs_f64()).solve() {
        Ok(solution) => {
            let values: Vec<i64> = columns
                .iter()
                .map(|&v| solution.value(v).round() as i64)
                .collect();
            let violated = lm.first_violated(&values);
            let over = deadline.is_spent();
            match (violated, over) {
                (None, false) if config.stop_after_first => {
                    (Some(lm.layout(&values)), Termination::StoppedEarly)
                }
                (None, false) => (Some(lm.layout(&values)), Termination::Exhausted),
                (None, true) => (Some(lm.layout(&values)), Termination::TimedOut),
                (Some(_), true) => (None, Termination::TimedOut),
                (Some(r), false) => {
                    return Err(FloorplanError::Encoding(format!(
                        "HiGHS solution for {} violates row {}",
                        model.name, lm.row_names[r]
                    )))
                }
            }
        }
        Err(ResolutionError::Infeasible) if !deadline.is_spent() => (None, Termination::Exhausted),
        Err(err) if deadline.is_spent() => {
            log::debug!("HiGHS stopped on {}: {err}", model.name);
            (None, Termination::TimedOut)
        }
        Err(err) => {
            return Err(FloorplanError::Encoding(format!(
                "HiGHS failed on {}: {err}",
                model.name
            )))
        }
    };
    if termination == Termination::TimedOut {
        log::warn!("mip search on {} hit the time limit", model.name);
    }

    let stats = SearchStats {
        solutions: u64::from(incumbent.is_some()),
        solver_calls: 1,
    };
    Ok(finish(NAME, model, incumbent, termination, deadline, stats))
}

/// Stub without the `milp` feature.
#[cfg(not(feature = "milp"))]
fn solve_with_highs(
    _model: &GeometryModel,
    _config: &SolverConfig,
    _deadline: &mut Deadline,
) -> Result<SolveOutcome> {
    Err(unavailable(BackendChoice::Mip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::model::{encode, PackingConfig};
    #[cfg(feature = "milp")]
    use crate::backend::SolveStatus;
    #[cfg(feature = "milp")]
    use std::time::Duration;

    #[cfg(feature = "milp")]
    fn solve(dims: &[(i64, i64)], width: i64, packing: &PackingConfig) -> (GeometryModel, SolveOutcome) {
        let inst = Instance::from_dims(width, dims).unwrap();
        let model = encode(&inst, packing).unwrap();
        let config = SolverConfig::default().with_time_limit(Duration::from_secs(20));
        let outcome = MipBackend::new().solve(&model, &config).unwrap();
        (model, outcome)
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_two_squares() {
        let (model, outcome) = solve(&[(4, 4), (4, 4)], 8, &PackingConfig::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(4));
        assert_eq!(outcome.stats.solver_calls, 1);
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_optimum_above_area_bound() {
        let (model, outcome) = solve(&[(3, 3), (3, 3)], 5, &PackingConfig::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(6));
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_rotation_and_symmetry() {
        let packing = PackingConfig::default()
            .with_rotation(true)
            .with_symmetry_breaking(true);
        let (model, outcome) = solve(&[(1, 4), (1, 4), (2, 2)], 6, &packing);
        // turned bars stack beside the square: height 2
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(2));
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_single_circuit_fixed_orientation() {
        let packing = PackingConfig::default().with_rotation(true);
        let (model, outcome) = solve(&[(3, 5)], 4, &packing);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(5));
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_zero_budget() {
        let inst = Instance::from_dims(5, &[(3, 3), (3, 1), (2, 2)]).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        let config = SolverConfig::default().with_time_limit(Duration::ZERO);
        let outcome = MipBackend::new().solve(&model, &config).unwrap();
        assert_eq!(outcome.status, SolveStatus::TimeoutNoSolution);
        assert_eq!(outcome.stats.solver_calls, 0);
    }

    #[test]
    #[cfg(not(feature = "milp"))]
    fn test_mip_stub() {
        let inst = Instance::from_dims(8, &[(4, 4), (4, 4)]).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        let err = MipBackend::new()
            .solve(&model, &SolverConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("'milp' feature"));
    }
}
