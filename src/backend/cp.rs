//! Constraint programming backend over the pumpkin solver.
//!
//! The disjunctive [`SmtFormula`] is posted as is. Columns become bounded
//! integer variables (rotation columns with domain `{0, 1}`) and hard rows
//! become linear `<=` constraints. Each clause gets one literal per cube,
//! each literal implying the rows of its cube, and a clause over those
//! literals. When every circuit has a single orientation, the cumulative
//! relaxation over the y starts is posted as the global `cumulative`.
//!
//! Optimization is pumpkin's linear SAT-UNSAT search on the height column.

use super::{Deadline, SolveOutcome, SolverBackend, SolverConfig};
use crate::error::Result;
use crate::lowering::NonOverlapEncoding;
use crate::model::GeometryModel;

#[cfg(feature = "cp")]
use super::{finish, timed_out, SearchStats, Termination};
#[cfg(not(feature = "cp"))]
use super::{unavailable, BackendChoice};
#[cfg(feature = "cp")]
use crate::error::{FloorplanError, InputError};
#[cfg(feature = "cp")]
use crate::lowering::{Row, SmtFormula};

#[cfg(feature = "cp")]
use pumpkin_solver::constraints;
#[cfg(feature = "cp")]
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
#[cfg(feature = "cp")]
use pumpkin_solver::optimisation::OptimisationDirection;
#[cfg(feature = "cp")]
use pumpkin_solver::results::{
    OptimisationResult, ProblemSolution, SatisfactionResult, SolutionReference,
};
#[cfg(feature = "cp")]
use pumpkin_solver::termination::TimeBudget;
#[cfg(feature = "cp")]
use pumpkin_solver::variables::{DomainId, TransformableVariable};
#[cfg(feature = "cp")]
use pumpkin_solver::{DefaultBrancher, Solver};

#[cfg(feature = "cp")]
const NAME: &str = "cp";

/// Lazy clause generation over the disjunctive formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpBackend;

impl CpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for CpBackend {
    fn name(&self) -> &str {
        "cp"
    }

    fn encoding(&self) -> NonOverlapEncoding {
        NonOverlapEncoding::Disjunctive
    }

    fn solve(&self, model: &GeometryModel, config: &SolverConfig) -> Result<SolveOutcome> {
        let mut deadline = Deadline::new(config.time_limit);
        solve_with_pumpkin(model, config, &mut deadline)
    }
}

#[cfg(feature = "cp")]
fn solve_with_pumpkin(
    model: &GeometryModel,
    config: &SolverConfig,
    deadline: &mut Deadline,
) -> Result<SolveOutcome> {
    let Some(formula) = SmtFormula::lower_within(model, deadline)? else {
        return Ok(timed_out(NAME, model, deadline));
    };

    let mut solver = Solver::default();
    let columns = match post(&mut solver, model, &formula, deadline)? {
        Posting::Posted(columns) => columns,
        Posting::Conflict => {
            log::debug!("root propagation refutes {}", model.name);
            return Ok(finish(
                NAME,
                model,
                None,
                Termination::Exhausted,
                deadline,
                SearchStats::default(),
            ));
        }
        Posting::OutOfTime => return Ok(timed_out(NAME, model, deadline)),
    };
    let remaining = deadline.remaining();
    if remaining.is_zero() {
        return Ok(timed_out(NAME, model, deadline));
    }
    log::debug!(
        "pumpkin model for {}: {} variables, {} clauses",
        model.name,
        columns.len(),
        formula.clauses.len()
    );

    let mut brancher = solver.default_brancher();
    let mut termination = TimeBudget::starting_now(remaining);
    let (values, termination) = if config.stop_after_first {
        match solver.satisfy(&mut brancher, &mut termination) {
            SatisfactionResult::Satisfiable(satisfiable) => (
                Some(read_values(&satisfiable.solution(), &columns)),
                Termination::StoppedEarly,
            ),
            SatisfactionResult::Unsatisfiable { .. } => (None, Termination::Exhausted),
            SatisfactionResult::Unknown { .. } => (None, Termination::TimedOut),
        }
    } else {
        let callback: fn(&Solver, SolutionReference, &DefaultBrancher) = |_, _, _| {};
        let procedure = LinearSatUnsat::new(
            OptimisationDirection::Minimise,
            columns[formula.objective],
            callback,
        );
        match solver.optimise(&mut brancher, &mut termination, procedure) {
            OptimisationResult::Optimal(solution) => {
                (Some(read_values(&solution, &columns)), Termination::Exhausted)
            }
            OptimisationResult::Satisfiable(solution) => {
                (Some(read_values(&solution, &columns)), Termination::TimedOut)
            }
            OptimisationResult::Unsatisfiable { .. } => (None, Termination::Exhausted),
            OptimisationResult::Unknown { .. } => (None, Termination::TimedOut),
        }
    };
    if termination == Termination::TimedOut {
        log::warn!("cp search on {} hit the time limit", model.name);
    }

    let incumbent = match values {
        Some(values) if formula.is_satisfied(&values) => Some(formula.layout(&values)),
        Some(_) => {
            return Err(FloorplanError::Encoding(format!(
                "pumpkin solution for {} violates the disjunctive formula",
                model.name
            )))
        }
        None => None,
    };
    let stats = SearchStats {
        solutions: u64::from(incumbent.is_some()),
        solver_calls: 1,
    };
    Ok(finish(NAME, model, incumbent, termination, deadline, stats))
}

/// Stub without the `cp` feature.
#[cfg(not(feature = "cp"))]
fn solve_with_pumpkin(
    _model: &GeometryModel,
    _config: &SolverConfig,
    _deadline: &mut Deadline,
) -> Result<SolveOutcome> {
    Err(unavailable(BackendChoice::Cp))
}

#[cfg(feature = "cp")]
enum Posting {
    /// One variable per formula column.
    Posted(Vec<DomainId>),
    /// Root propagation emptied a domain.
    Conflict,
    OutOfTime,
}

#[cfg(feature = "cp")]
fn post(
    solver: &mut Solver,
    model: &GeometryModel,
    f: &SmtFormula,
    deadline: &mut Deadline,
) -> Result<Posting> {
    let tag = solver.new_constraint_tag();
    let mut columns = Vec::with_capacity(f.columns.len());
    for c in &f.columns {
        columns.push(solver.new_bounded_integer(narrow(c.lower)?, narrow(c.upper)?));
    }
    let linear = |row: &Row| -> Result<_> {
        let terms = row
            .terms
            .iter()
            .map(|&(c, a)| Ok(columns[c].scaled(narrow(a)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(constraints::less_than_or_equals(terms, narrow(row.rhs)?, tag))
    };

    for &r in &f.hard {
        if deadline.step() {
            return Ok(Posting::OutOfTime);
        }
        if solver.add_constraint(linear(&f.rows[r])?).post().is_err() {
            return Ok(Posting::Conflict);
        }
    }

    for clause in &f.clauses {
        if deadline.step() {
            return Ok(Posting::OutOfTime);
        }
        let mut literals = Vec::with_capacity(clause.cubes.len());
        for cube in &clause.cubes {
            let literal = solver.new_literal();
            for &r in cube {
                if solver
                    .add_constraint(linear(&f.rows[r])?)
                    .implied_by(literal)
                    .is_err()
                {
                    return Ok(Posting::Conflict);
                }
            }
            literals.push(literal);
        }
        if solver
            .add_constraint(constraints::clause(literals, tag))
            .post()
            .is_err()
        {
            return Ok(Posting::Conflict);
        }
    }

    if let Some(capacity) = model.cumulative_capacity() {
        let n = model.circuit_count();
        if (0..n).all(|i| model.orientations(i).len() == 1) {
            let mut durations = Vec::with_capacity(n);
            let mut demands = Vec::with_capacity(n);
            for i in 0..n {
                let (w, h) = model.effective_dims(i, model.orientations(i)[0]);
                durations.push(narrow(h)?);
                demands.push(narrow(w)?);
            }
            let starts: Vec<DomainId> = f.y.iter().map(|&c| columns[c]).collect();
            let cumulative =
                constraints::cumulative(starts, durations, demands, narrow(capacity)?, tag);
            if solver.add_constraint(cumulative).post().is_err() {
                return Ok(Posting::Conflict);
            }
        } else {
            log::debug!("free rotations on {}: cumulative left to non-overlap", model.name);
        }
    }

    Ok(Posting::Posted(columns))
}

#[cfg(feature = "cp")]
fn read_values(solution: &impl ProblemSolution, columns: &[DomainId]) -> Vec<i64> {
    columns
        .iter()
        .map(|&d| i64::from(solution.get_integer_value(d)))
        .collect()
}

/// Pumpkin domains are 32-bit.
#[cfg(feature = "cp")]
fn narrow(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        FloorplanError::from(InputError::InvalidConfig(format!(
            "value {value} exceeds the 32-bit domains of the cp backend"
        )))
    })
}

#[cfg(test)]
#[cfg(feature = "cp")]
mod tests {
    use super::*;
    use crate::backend::{Assignment, SolveStatus};
    use crate::instance::Instance;
    use crate::model::PackingConfig;
    use std::time::Duration;

    fn solve(dims: &[(i64, i64)], width: i64, packing: &PackingConfig) -> (GeometryModel, SolveOutcome) {
        let inst = Instance::from_dims(width, dims).unwrap();
        let model = crate::model::encode(&inst, packing).unwrap();
        let config = SolverConfig::default().with_time_limit(Duration::from_secs(20));
        let outcome = CpBackend::new().solve(&model, &config).unwrap();
        (model, outcome)
    }

    #[test]
    fn test_two_squares_side_by_side() {
        let (model, outcome) = solve(&[(4, 4), (4, 4)], 8, &PackingConfig::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(4));
    }

    #[test]
    fn test_rotation_lowers_height() {
        // upright the 1x4 bars stack to 8; turned they fit two per row
        let packing = PackingConfig::default().with_rotation(true);
        let (model, outcome) = solve(&[(1, 4), (1, 4), (1, 4), (1, 4)], 8, &packing);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(2));

        let (model, outcome) = solve(&[(1, 4), (1, 4), (1, 4), (1, 4)], 8, &PackingConfig::default());
        assert_eq!(outcome.height(&model), Some(4));
    }

    #[test]
    fn test_optimum_above_area_bound() {
        // two 3x3 on width 5 cannot share a row: area bound 4, optimum 6
        let (model, outcome) = solve(&[(3, 3), (3, 3)], 5, &PackingConfig::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(6));
        assert_eq!(outcome.stats.solutions, 1);
    }

    #[test]
    fn test_with_and_without_cumulative() {
        let dims = [(3, 3), (3, 1), (2, 2), (1, 2)];
        for cumulative in [true, false] {
            let packing = PackingConfig::default().with_cumulative(cumulative);
            let (model, outcome) = solve(&dims, 5, &packing);
            assert_eq!(outcome.status, SolveStatus::Optimal, "cumulative {cumulative}");
            assert_eq!(outcome.height(&model), Some(4), "cumulative {cumulative}");
        }
    }

    #[test]
    fn test_symmetry_breaking_keeps_optimum() {
        let packing = PackingConfig::default().with_symmetry_breaking(true);
        let (model, outcome) = solve(&[(3, 3), (3, 1), (2, 2), (1, 2)], 5, &packing);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(4));
        let a = outcome.assignment.unwrap();
        let x0 = a.int(model.circuit_vars(0).x).unwrap();
        assert!(2 * x0 < 5);
    }

    #[test]
    fn test_large_dimensions_stay_cheap() {
        let squares = [(1_000_000, 1_000_000), (1_000_000, 1_000_000)];
        let (model, outcome) = solve(&squares, 2_000_000, &PackingConfig::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(1_000_000));
        assert!(outcome.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_dimensions_beyond_i32_are_rejected() {
        let inst = Instance::from_dims(3_000_000_000, &[(1, 1)]).unwrap();
        let model = crate::model::encode(&inst, &PackingConfig::default()).unwrap();
        let err = CpBackend::new().solve(&model, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, FloorplanError::Input(InputError::InvalidConfig(_))));
    }

    #[test]
    fn test_stop_after_first() {
        let inst = Instance::from_dims(5, &[(3, 3), (3, 1), (2, 2), (1, 2)]).unwrap();
        let model = crate::model::encode(&inst, &PackingConfig::default()).unwrap();
        let config = SolverConfig::default().with_stop_after_first(true);
        let outcome = CpBackend::new().solve(&model, &config).unwrap();
        assert_eq!(outcome.status, SolveStatus::Feasible);
        assert_eq!(outcome.stats.solutions, 1);
        assert!(outcome.assignment.as_ref().is_some_and(Assignment::is_complete));
    }

    #[test]
    fn test_zero_budget_times_out() {
        let inst = Instance::from_dims(5, &[(3, 3), (3, 1), (2, 2), (1, 2)]).unwrap();
        let model = crate::model::encode(&inst, &PackingConfig::default()).unwrap();
        let config = SolverConfig::default().with_time_limit(Duration::ZERO);
        let outcome = CpBackend::new().solve(&model, &config).unwrap();
        assert_eq!(outcome.status, SolveStatus::TimeoutNoSolution);
        assert!(outcome.assignment.is_none());
        assert_eq!(outcome.stats.solver_calls, 0);
    }
}
