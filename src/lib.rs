//! Strip packing (VLSI floor-planning) with interchangeable exact backends.
//!
//! Given a plate of fixed width and a set of rectangular circuits, find
//! non-overlapping placements that minimize the plate height, optionally
//! allowing 90° rotation. The same geometry model is solved by three
//! formulation strategies so they can be compared on equal terms:
//!
//! - **Constraint programming** ([`backend::CpBackend`], feature `cp`, on by
//!   default): the disjunctive formula posted to the Pumpkin solver, with an
//!   optional cumulative constraint on the vertical axis.
//! - **Mixed-integer programming** ([`backend::MipBackend`], feature `milp`):
//!   big-M indicators solved by HiGHS through `good_lp`.
//! - **Satisfiability modulo theories** ([`backend::SmtBackend`], feature
//!   `smt`): the disjunctive formula minimized by z3's optimizer.
//!
//! Choosing a backend whose feature is off yields
//! [`InputError::BackendUnavailable`].
//!
//! # Architecture
//!
//! ```text
//! Instance ──encode──▶ GeometryModel ──SolverBackend::solve──▶ SolveOutcome ──decode──▶ Placement
//!                          │
//!                          └── lowering: LinearModel (big-M) / SmtFormula (disjunctive)
//! ```
//!
//! [`pipeline`] ties the steps together under a time budget and classifies
//! each attempt. Parsing instance files and rendering results are left to
//! the caller.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use u_floorplan::backend::BackendChoice;
//! use u_floorplan::instance::Instance;
//! use u_floorplan::model::PackingConfig;
//! use u_floorplan::pipeline::Pipeline;
//!
//! let instance = Instance::from_dims(4, &[(3, 5)]).unwrap();
//! let config = PackingConfig::default()
//!     .with_rotation(true)
//!     .with_time_budget(Duration::from_secs(5));
//! let report = Pipeline::new(config, BackendChoice::Cp.backend())
//!     .solve_instance(1, &instance)
//!     .unwrap();
//! assert_eq!(report.achieved_height, Some(5));
//! ```

pub mod backend;
pub mod decode;
pub mod error;
pub mod instance;
pub mod lowering;
pub mod model;
pub mod pipeline;

pub use error::{FloorplanError, InputError, Result, ValidationError};
