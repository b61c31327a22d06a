//! SMT backend: the disjunctive formula minimized by z3's `Optimize`.
//!
//! Integer columns become `Int` constants and rotation columns `Bool`
//! constants, read as `(ite r 1 0)` inside linear terms. Hard rows and
//! clauses are asserted as is, and the height column is minimized under
//! z3's `timeout` parameter set to what is left of the budget. On `unknown`
//! the best model z3 kept, if any, is checked against the formula and
//! returned as the incumbent.

use super::{Deadline, SolveOutcome, SolverBackend, SolverConfig};
use crate::error::Result;
use crate::lowering::NonOverlapEncoding;
use crate::model::GeometryModel;

#[cfg(feature = "smt")]
use super::{finish, timed_out, SearchStats, Termination};
#[cfg(not(feature = "smt"))]
use super::{unavailable, BackendChoice};
#[cfg(feature = "smt")]
use crate::error::FloorplanError;
#[cfg(feature = "smt")]
use crate::lowering::{ColumnKind, Row, SmtFormula};

#[cfg(feature = "smt")]
use z3::ast::{Ast, Bool, Int};
#[cfg(feature = "smt")]
use z3::{Config, Context, Model, Optimize, Params, SatResult};

#[cfg(feature = "smt")]
const NAME: &str = "smt";

/// Optimization modulo linear integer arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtBackend;

impl SmtBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for SmtBackend {
    fn name(&self) -> &str {
        "smt"
    }

    fn encoding(&self) -> NonOverlapEncoding {
        NonOverlapEncoding::Disjunctive
    }

    fn solve(&self, model: &GeometryModel, config: &SolverConfig) -> Result<SolveOutcome> {
        let mut deadline = Deadline::new(config.time_limit);
        solve_with_z3(model, config, &mut deadline)
    }
}

/// One z3 term per formula column.
#[cfg(feature = "smt")]
struct Terms<'ctx> {
    ctx: &'ctx Context,
    /// Integer view of every column.
    ints: Vec<Int<'ctx>>,
    /// The `Bool` behind each binary column.
    bools: Vec<Option<Bool<'ctx>>>,
}

#[cfg(feature = "smt")]
impl<'ctx> Terms<'ctx> {
    fn declare(ctx: &'ctx Context, opt: &Optimize<'ctx>, f: &SmtFormula) -> Self {
        let one = Int::from_i64(ctx, 1);
        let zero = Int::from_i64(ctx, 0);
        let mut ints = Vec::with_capacity(f.columns.len());
        let mut bools = Vec::with_capacity(f.columns.len());
        for c in &f.columns {
            match c.kind {
                ColumnKind::Integer => {
                    let v = Int::new_const(ctx, c.name.as_str());
                    opt.assert(&v.ge(&Int::from_i64(ctx, c.lower)));
                    opt.assert(&v.le(&Int::from_i64(ctx, c.upper)));
                    ints.push(v);
                    bools.push(None);
                }
                ColumnKind::Binary => {
                    let b = Bool::new_const(ctx, c.name.as_str());
                    if c.lower == c.upper {
                        opt.assert(&b._eq(&Bool::from_bool(ctx, c.lower == 1)));
                    }
                    ints.push(b.ite(&one, &zero));
                    bools.push(Some(b));
                }
            }
        }
        Self { ctx, ints, bools }
    }

    fn row(&self, row: &Row) -> Bool<'ctx> {
        let terms: Vec<Int<'ctx>> = row
            .terms
            .iter()
            .map(|&(c, a)| match a {
                1 => self.ints[c].clone(),
                _ => Int::mul(self.ctx, &[&Int::from_i64(self.ctx, a), &self.ints[c]]),
            })
            .collect();
        let refs: Vec<&Int<'ctx>> = terms.iter().collect();
        Int::add(self.ctx, &refs).le(&Int::from_i64(self.ctx, row.rhs))
    }

    /// Column values under `model`; `None` if any is missing.
    fn read(&self, model: &Model<'ctx>) -> Option<Vec<i64>> {
        self.ints
            .iter()
            .zip(&self.bools)
            .map(|(int, b)| match b {
                Some(b) => model.eval(b, true).and_then(|v| v.as_bool()).map(i64::from),
                None => model.eval(int, true).and_then(|v| v.as_i64()),
            })
            .collect()
    }
}

#[cfg(feature = "smt")]
fn solve_with_z3(
    model: &GeometryModel,
    config: &SolverConfig,
    deadline: &mut Deadline,
) -> Result<SolveOutcome> {
    let Some(formula) = SmtFormula::lower_within(model, deadline)? else {
        return Ok(timed_out(NAME, model, deadline));
    };

    let ctx = Context::new(&Config::new());
    let opt = Optimize::new(&ctx);
    let terms = Terms::declare(&ctx, &opt, &formula);
    for &r in &formula.hard {
        if deadline.step() {
            return Ok(timed_out(NAME, model, deadline));
        }
        opt.assert(&terms.row(&formula.rows[r]));
    }
    for clause in &formula.clauses {
        if deadline.step() {
            return Ok(timed_out(NAME, model, deadline));
        }
        let cubes: Vec<Bool> = clause
            .cubes
            .iter()
            .map(|cube| {
                let rows: Vec<Bool> = cube.iter().map(|&r| terms.row(&formula.rows[r])).collect();
                let refs: Vec<&Bool> = rows.iter().collect();
                Bool::and(&ctx, &refs)
            })
            .collect();
        let refs: Vec<&Bool> = cubes.iter().collect();
        opt.assert(&Bool::or(&ctx, &refs));
    }
    if !config.stop_after_first {
        opt.minimize(&terms.ints[formula.objective]);
    }

    let remaining = deadline.remaining();
    if remaining.is_zero() {
        return Ok(timed_out(NAME, model, deadline));
    }
    let mut params = Params::new(&ctx);
    params.set_u32("timeout", timeout_millis(remaining));
    opt.set_params(&params);
    log::debug!(
        "z3 formula for {}: {} hard rows, {} clauses, {}ms",
        model.name,
        formula.hard.len(),
        formula.clauses.len(),
        timeout_millis(remaining)
    );

    let (values, termination) = match opt.check(&[]) {
        SatResult::Sat => {
            let values = opt.get_model().and_then(|m| terms.read(&m));
            let Some(values) = values else {
                return Err(FloorplanError::Encoding(format!(
                    "z3 reported sat on {} without a complete model",
                    model.name
                )));
            };
            if !formula.is_satisfied(&values) {
                return Err(FloorplanError::Encoding(format!(
                    "z3 model for {} violates the disjunctive formula",
                    model.name
                )));
            }
            let termination = if config.stop_after_first {
                Termination::StoppedEarly
            } else {
                Termination::Exhausted
            };
            (Some(values), termination)
        }
        SatResult::Unsat => (None, Termination::Exhausted),
        SatResult::Unknown => {
            log::warn!(
                "smt search on {} hit the time limit ({})",
                model.name,
                opt.get_reason_unknown().unwrap_or_default()
            );
            let best = opt
                .get_model()
                .and_then(|m| terms.read(&m))
                .filter(|values| formula.is_satisfied(values));
            (best, Termination::TimedOut)
        }
    };

    let incumbent = values.map(|values| formula.layout(&values));
    let stats = SearchStats {
        solutions: u64::from(incumbent.is_some()),
        solver_calls: 1,
    };
    Ok(finish(NAME, model, incumbent, termination, deadline, stats))
}

/// z3 reads a zero timeout as "none", so at least one millisecond.
#[cfg(feature = "smt")]
fn timeout_millis(remaining: std::time::Duration) -> u32 {
    u32::try_from(remaining.as_millis()).unwrap_or(u32::MAX).max(1)
}

/// Stub without the `smt` feature.
#[cfg(not(feature = "smt"))]
fn solve_with_z3(
    _model: &GeometryModel,
    _config: &SolverConfig,
    _deadline: &mut Deadline,
) -> Result<SolveOutcome> {
    Err(unavailable(BackendChoice::Smt))
}

#[cfg(test)]
#[cfg(feature = "smt")]
mod tests {
    use super::*;
    use crate::backend::SolveStatus;
    use crate::instance::Instance;
    use crate::model::{encode, PackingConfig};
    use std::time::Duration;

    fn solve(dims: &[(i64, i64)], width: i64, packing: &PackingConfig) -> (GeometryModel, SolveOutcome) {
        let inst = Instance::from_dims(width, dims).unwrap();
        let model = encode(&inst, packing).unwrap();
        let config = SolverConfig::default().with_time_limit(Duration::from_secs(20));
        let outcome = SmtBackend::new().solve(&model, &config).unwrap();
        (model, outcome)
    }

    #[test]
    fn test_timeout_millis() {
        assert_eq!(timeout_millis(Duration::ZERO), 1);
        assert_eq!(timeout_millis(Duration::from_millis(250)), 250);
        assert_eq!(timeout_millis(Duration::from_secs(10_000_000)), u32::MAX);
    }

    #[test]
    fn test_two_squares() {
        let (model, outcome) = solve(&[(4, 4), (4, 4)], 8, &PackingConfig::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(4));
        assert_eq!(outcome.stats.solver_calls, 1);
    }

    #[test]
    fn test_optimum_above_area_bound() {
        let (model, outcome) = solve(&[(3, 3), (3, 3)], 5, &PackingConfig::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(6));
    }

    #[test]
    fn test_rotation() {
        let packing = PackingConfig::default().with_rotation(true);
        let (model, outcome) = solve(&[(1, 4), (1, 4), (1, 4), (1, 4)], 8, &packing);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(2));
    }

    #[test]
    fn test_symmetry_breaking() {
        let packing = PackingConfig::default().with_symmetry_breaking(true);
        let (model, outcome) = solve(&[(3, 3), (3, 1), (2, 2), (1, 2)], 5, &packing);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.height(&model), Some(4));
    }

    #[test]
    fn test_stop_after_first() {
        let inst = Instance::from_dims(5, &[(3, 3), (3, 1), (2, 2), (1, 2)]).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        let config = SolverConfig::default().with_stop_after_first(true);
        let outcome = SmtBackend::new().solve(&model, &config).unwrap();
        assert_eq!(outcome.status, SolveStatus::Feasible);
        assert!(outcome.height(&model).is_some_and(|h| h >= 4));
    }

    #[test]
    fn test_zero_budget() {
        let inst = Instance::from_dims(5, &[(3, 3), (3, 1)]).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        let config = SolverConfig::default().with_time_limit(Duration::ZERO);
        let outcome = SmtBackend::new().solve(&model, &config).unwrap();
        assert_eq!(outcome.status, SolveStatus::TimeoutNoSolution);
        assert_eq!(outcome.stats.solver_calls, 0);
    }
}
