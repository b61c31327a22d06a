//! Solution decoding.
//!
//! Turns a backend's [`SolveOutcome`](crate::backend::SolveOutcome) into a
//! [`Placement`] and re-validates it against the packing invariants.

mod decoder;
mod types;

pub use decoder::decode;
pub use types::{OutputRecord, PlacedCircuit, Placement};
