//! Error types.
//!
//! Timeouts are not errors: they are reported through
//! [`SolveStatus`](crate::backend::SolveStatus).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FloorplanError>;

/// Top-level error of a packing attempt.
#[derive(Debug, Error)]
pub enum FloorplanError {
    /// Instance or configuration data is malformed. Aborts only the
    /// affected instance.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// The model could not be built or lowered. Always a programming error.
    #[error("encoding defect: {0}")]
    Encoding(String),

    /// A decoded placement violates the packing invariants.
    #[error("placement failed validation: {0}")]
    Validation(#[from] ValidationError),
}

impl FloorplanError {
    /// Whether the error is confined to a single instance.
    ///
    /// Encoding and validation failures point at a defect in the encoder or a
    /// backend and stop batch processing.
    pub fn is_per_instance(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

/// Malformed or inconsistent instance/configuration data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputError {
    #[error("instance has no circuits")]
    EmptyInstance,

    #[error("plate width must be positive, got {0}")]
    NonPositivePlateWidth(i64),

    #[error("circuit {index} has non-positive dimensions {width}x{height}")]
    NonPositiveCircuit { index: usize, width: i64, height: i64 },

    #[error("declared circuit count {declared} does not match the {actual} circuits given")]
    CircuitCountMismatch { declared: usize, actual: usize },

    #[error(
        "circuit {index} ({width}x{height}) does not fit plate width {plate_width} \
         (rotation allowed: {rotation})"
    )]
    CircuitTooWide {
        index: usize,
        width: i64,
        height: i64,
        plate_width: i64,
        rotation: bool,
    },

    #[error("invalid instance range [{first}, {last}]")]
    InvalidRange { first: usize, last: usize },

    #[error("instance {0} could not be loaded: {1}")]
    Unavailable(usize, String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown backend '{0}' (expected cp, mip or smt)")]
    UnknownBackend(String),

    #[error("backend {backend} is not compiled in (enable the '{feature}' feature)")]
    BackendUnavailable { backend: String, feature: String },
}

/// A decoded placement that breaks an invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("solve outcome carries no assignment")]
    MissingAssignment,

    #[error("assignment has no value for variable '{0}'")]
    MissingValue(String),

    #[error("plate height {height} is below the area lower bound {lower_bound}")]
    BelowLowerBound { height: i64, lower_bound: i64 },

    #[error(
        "circuit {circuit} at ({x}, {y}) with extent {width}x{height} leaves the \
         {plate_width}x{plate_height} plate"
    )]
    OutOfBounds {
        circuit: usize,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        plate_width: i64,
        plate_height: i64,
    },

    #[error("circuits {first} and {second} overlap")]
    Overlap { first: usize, second: usize },

    #[error("circuit {circuit} is rotated but the model forbids its rotation")]
    ForbiddenRotation { circuit: usize },

    #[error("{family} constraint violated by circuits {circuits:?}")]
    ConstraintViolated {
        family: crate::model::ConstraintFamily,
        circuits: Vec<usize>,
    },
}
