//! Packing instances.
//!
//! An [`Instance`] is the immutable description of one strip-packing
//! problem: a plate of fixed width and an ordered list of [`Circuit`]s.
//! Parsing instance files is left to the caller; [`InstanceRecord`] is the
//! shape such a loader hands over.

mod types;

pub use types::{Circuit, Instance, InstanceRecord};

