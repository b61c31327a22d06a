//! Geometry model of the strip-packing problem.
//!
//! Translates an [`Instance`](crate::instance::Instance) into a
//! solver-independent constraint model.
//!
//! # Key Components
//!
//! - **Variables**: [`IntVar`], [`BoolVar`] — coordinates, height, rotation
//! - **Constraints**: [`Constraint`] — boundary, non-overlap, cumulative,
//!   rotation consistency and symmetry breaking, grouped by
//!   [`ConstraintFamily`]
//! - **Model**: [`GeometryModel`] — container for variables and constraints;
//!   the objective is always to minimize the plate height
//! - **Encoder**: [`encode`] — builds the model from an instance and a
//!   [`PackingConfig`]
//!
//! # Design
//!
//! Non-overlap is kept as an abstract four-way disjunction. How it is
//! lowered (native disjunction or big-M indicators) is the backend's choice;
//! see [`lowering`](crate::lowering).
//!
//! # References
//!
//! - Martello, Monaci & Vigo (2003), "An Exact Approach to the Strip-Packing Problem"
//! - Aggoun & Beldiceanu (1993), "Extending CHIP in order to solve complex
//!   scheduling and placement problems" (cumulative as a packing relaxation)

mod config;
mod constraints;
mod encoder;
#[allow(clippy::module_inception)]
mod model;
mod variables;

pub use config::PackingConfig;
pub use constraints::{cumulative_holds, Constraint, ConstraintFamily, Rect, Separation};
pub use encoder::{encode, largest_pair};
pub use model::{CircuitVars, GeometryModel};
pub use variables::{BoolVar, BoolVarId, IntVar, IntVarId};
