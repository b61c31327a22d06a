//! Attempt pipeline: encode, solve under a budget, decode and report.
//!
//! # Key Components
//!
//! - [`Pipeline`]: one backend and one packing configuration; runs a single
//!   instance through `Building → Submitted → terminal state`
//! - [`solve_batch`]: runs an instance range, sequentially or on the rayon
//!   pool, skipping instances rejected for bad input
//! - [`InstanceSource`]: where instances come from
//!
//! Instances never share mutable state, so parallel batches need no
//! synchronization beyond collecting the reports.

mod config;
mod runner;
mod types;

pub use config::BatchConfig;
pub use runner::{solve_batch, InstanceSource, Pipeline};
pub use types::{AttemptState, BatchReport, InstanceReport, RejectedInstance};
