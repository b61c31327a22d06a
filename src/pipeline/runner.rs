//! Encode → solve → decode, per instance and per batch.

use std::time::Instant;

use rayon::prelude::*;

use super::config::BatchConfig;
use super::types::{AttemptState, BatchReport, InstanceReport, RejectedInstance};
use crate::backend::{SolveStatus, SolverBackend, SolverConfig};
use crate::decode::decode;
use crate::error::{FloorplanError, Result};
use crate::instance::Instance;
use crate::model::{encode, ConstraintFamily, PackingConfig};

/// Supplies instances by id. Loading and parsing is the caller's business.
pub trait InstanceSource: Sync {
    fn load(&self, instance_id: usize) -> Result<Instance>;
}

impl<F> InstanceSource for F
where
    F: Fn(usize) -> Result<Instance> + Sync,
{
    fn load(&self, instance_id: usize) -> Result<Instance> {
        self(instance_id)
    }
}

/// One backend under one packing configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_floorplan::backend::BackendChoice;
/// use u_floorplan::instance::Instance;
/// use u_floorplan::model::PackingConfig;
/// use u_floorplan::pipeline::{AttemptState, Pipeline};
///
/// let config = PackingConfig::default().with_time_budget(Duration::from_secs(10));
/// let pipeline = Pipeline::new(config, BackendChoice::Cp.backend());
/// let instance = Instance::from_dims(8, &[(4, 4), (4, 4)]).unwrap();
/// let report = pipeline.solve_instance(1, &instance).unwrap();
/// assert_eq!(report.status, AttemptState::Solved);
/// assert_eq!(report.achieved_height, Some(4));
/// ```
pub struct Pipeline {
    config: PackingConfig,
    solver: SolverConfig,
    backend: Box<dyn SolverBackend>,
}

impl Pipeline {
    pub fn new(config: PackingConfig, backend: Box<dyn SolverBackend>) -> Self {
        Self {
            config,
            solver: SolverConfig::default(),
            backend,
        }
    }

    /// Engine settings; the time limit is always overridden by
    /// [`PackingConfig::solver_time_limit`].
    pub fn with_solver_config(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn from_batch(batch: &BatchConfig) -> Self {
        Self::new(batch.packing.clone(), batch.backend.backend())
            .with_solver_config(batch.solver.clone())
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn SolverBackend {
        self.backend.as_ref()
    }

    /// Runs one attempt.
    ///
    /// Results arriving after `time_budget` are classified as timed out even
    /// when the backend finished. Input errors are returned before any
    /// solving starts.
    pub fn solve_instance(&self, instance_id: usize, instance: &Instance) -> Result<InstanceReport> {
        let mut state = AttemptState::Building;
        log::debug!("instance {instance_id}: {state}");
        let model = encode(instance, &self.config)?;

        let solver = self
            .solver
            .clone()
            .with_time_limit(self.config.solver_time_limit());
        state = advance(state, AttemptState::Submitted);
        log::debug!(
            "instance {instance_id}: {state} to {} ({} encoding)",
            self.backend.name(),
            self.backend.encoding()
        );
        let started = Instant::now();
        let outcome = self.backend.solve(&model, &solver)?;
        let elapsed = started.elapsed();
        let over_budget = elapsed > self.config.time_budget;

        let terminal = match outcome.status {
            SolveStatus::Optimal | SolveStatus::Feasible if !over_budget => AttemptState::Solved,
            SolveStatus::Optimal | SolveStatus::Feasible | SolveStatus::TimeoutWithSolution => {
                AttemptState::TimedOutWithSolution
            }
            SolveStatus::TimeoutNoSolution => AttemptState::TimedOutNoSolution,
            SolveStatus::Infeasible if over_budget => AttemptState::TimedOutNoSolution,
            SolveStatus::Infeasible => {
                if !model.has_family(ConstraintFamily::SymmetryBreaking) {
                    return Err(FloorplanError::Encoding(format!(
                        "{} reported instance {instance_id} infeasible without symmetry breaking",
                        self.backend.name()
                    )));
                }
                AttemptState::Infeasible
            }
        };
        state = advance(state, terminal);

        let placement = if outcome.status.has_solution() {
            Some(decode(&model, &outcome)?)
        } else {
            None
        };
        let achieved_height = placement.as_ref().map(|p| p.plate_height);

        match state {
            AttemptState::Solved => log::info!(
                "instance {instance_id}: {state} by {} in {:.3}s, height {}",
                self.backend.name(),
                elapsed.as_secs_f64(),
                achieved_height.unwrap_or_default()
            ),
            AttemptState::TimedOutWithSolution => log::warn!(
                "instance {instance_id}: {state} after {:.3}s, height {}",
                elapsed.as_secs_f64(),
                achieved_height.unwrap_or_default()
            ),
            AttemptState::Infeasible => log::warn!(
                "instance {instance_id}: {state} under symmetry breaking"
            ),
            _ => log::warn!(
                "instance {instance_id}: {state} after {:.3}s",
                elapsed.as_secs_f64()
            ),
        }

        Ok(InstanceReport {
            instance_id,
            status: state,
            elapsed,
            achieved_height,
            placement,
            stats: outcome.stats,
        })
    }

    fn attempt(&self, instance_id: usize, source: &impl InstanceSource) -> Result<Entry> {
        let attempt = source
            .load(instance_id)
            .and_then(|instance| self.solve_instance(instance_id, &instance));
        match attempt {
            Ok(report) => Ok(Entry::Report(report)),
            Err(FloorplanError::Input(error)) => {
                log::warn!("instance {instance_id} rejected: {error}");
                Ok(Entry::Rejected(RejectedInstance { instance_id, error }))
            }
            Err(err) => Err(err),
        }
    }
}

fn advance(from: AttemptState, to: AttemptState) -> AttemptState {
    debug_assert!(from.can_move_to(to), "illegal transition {from} -> {to}");
    to
}

enum Entry {
    Report(InstanceReport),
    Rejected(RejectedInstance),
}

/// Solves instances `batch.first..=batch.last`.
///
/// Rejected instances are recorded and the batch continues; an encoding or
/// validation failure aborts the batch with that error, and no further
/// instances are started.
pub fn solve_batch(batch: &BatchConfig, source: &impl InstanceSource) -> Result<BatchReport> {
    batch.validate()?;
    run_batch(&Pipeline::from_batch(batch), batch, source)
}

fn run_batch(
    pipeline: &Pipeline,
    batch: &BatchConfig,
    source: &impl InstanceSource,
) -> Result<BatchReport> {
    log::info!(
        "solving instances {}..={} with {}{}",
        batch.first,
        batch.last,
        pipeline.backend().name(),
        if batch.parallel { " in parallel" } else { "" }
    );

    let entries: Vec<Entry> = if batch.parallel {
        batch
            .instance_ids()
            .into_par_iter()
            .map(|id| pipeline.attempt(id, source))
            .collect::<Result<_>>()?
    } else {
        batch
            .instance_ids()
            .map(|id| pipeline.attempt(id, source))
            .collect::<Result<_>>()?
    };

    let mut report = BatchReport::default();
    for entry in entries {
        match entry {
            Entry::Report(r) => report.reports.push(r),
            Entry::Rejected(r) => report.rejected.push(r),
        }
    }
    log::info!(
        "batch done: {} solved, {} reported, {} rejected",
        report.solved_count(),
        report.reports.len(),
        report.rejected.len()
    );
    Ok(report)
}
