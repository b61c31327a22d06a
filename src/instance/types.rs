//! Instance data: plate width and circuit dimensions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A rectangular circuit as given in the input, before any rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Circuit {
    /// Horizontal extent.
    pub width: i64,
    /// Vertical extent.
    pub height: i64,
}

impl Circuit {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    /// Rotating a square circuit has no effect.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Effective `(width, height)` in the given orientation.
    pub fn dims(&self, rotated: bool) -> (i64, i64) {
        if rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Whether the circuit fits a plate of the given width in this orientation.
    pub fn fits(&self, plate_width: i64, rotated: bool) -> bool {
        self.dims(rotated).0 <= plate_width
    }
}

/// Raw instance record as produced by the instance-loading collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceRecord {
    pub plate_width: i64,
    pub circuit_count: usize,
    /// `(width, height)` per circuit.
    pub circuits: Vec<(i64, i64)>,
}

/// One strip-packing problem.
///
/// Immutable once constructed: circuits are addressed by their index in
/// `0..len()` for the lifetime of the instance.
///
/// # Examples
///
/// ```
/// use u_floorplan::instance::Instance;
///
/// let instance = Instance::from_dims(8, &[(4, 4), (4, 4)]).unwrap();
/// assert_eq!(instance.len(), 2);
/// assert_eq!(instance.area_lower_bound(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instance {
    plate_width: i64,
    circuits: Vec<Circuit>,
}

impl Instance {
    /// Creates an instance, rejecting empty circuit lists and
    /// non-positive dimensions.
    pub fn new(plate_width: i64, circuits: Vec<Circuit>) -> Result<Self, InputError> {
        if plate_width <= 0 {
            return Err(InputError::NonPositivePlateWidth(plate_width));
        }
        if circuits.is_empty() {
            return Err(InputError::EmptyInstance);
        }
        if let Some((index, c)) = circuits
            .iter()
            .enumerate()
            .find(|(_, c)| c.width <= 0 || c.height <= 0)
        {
            return Err(InputError::NonPositiveCircuit {
                index,
                width: c.width,
                height: c.height,
            });
        }
        Ok(Self {
            plate_width,
            circuits,
        })
    }

    /// Creates an instance from `(width, height)` pairs.
    pub fn from_dims(plate_width: i64, dims: &[(i64, i64)]) -> Result<Self, InputError> {
        Self::new(
            plate_width,
            dims.iter().map(|&(w, h)| Circuit::new(w, h)).collect(),
        )
    }

    /// Creates an instance from an input record, checking the declared count.
    pub fn from_record(record: &InstanceRecord) -> Result<Self, InputError> {
        if record.circuit_count != record.circuits.len() {
            return Err(InputError::CircuitCountMismatch {
                declared: record.circuit_count,
                actual: record.circuits.len(),
            });
        }
        Self::from_dims(record.plate_width, &record.circuits)
    }

    pub fn plate_width(&self) -> i64 {
        self.plate_width
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    pub fn circuit(&self, index: usize) -> Option<&Circuit> {
        self.circuits.get(index)
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    /// Always false for a constructed instance; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Sum of circuit areas.
    pub fn total_area(&self) -> i64 {
        self.circuits.iter().map(Circuit::area).sum()
    }

    /// `ceil(total_area / plate_width)`: no packing can be lower.
    pub fn area_lower_bound(&self) -> i64 {
        ceil_div(self.total_area(), self.plate_width)
    }

    /// Height of stacking every circuit on top of each other.
    ///
    /// With rotation the longer side is counted, which is valid whatever
    /// orientation each circuit ends up in.
    pub fn stacking_upper_bound(&self, allow_rotation: bool) -> i64 {
        self.circuits
            .iter()
            .map(|c| {
                if allow_rotation {
                    c.width.max(c.height)
                } else {
                    c.height
                }
            })
            .sum()
    }

    /// Index of the first circuit that fits the plate in no allowed orientation.
    pub fn first_unplaceable(&self, allow_rotation: bool) -> Option<usize> {
        self.circuits.iter().position(|c| {
            let upright = c.fits(self.plate_width, false);
            let turned = allow_rotation && c.fits(self.plate_width, true);
            !upright && !turned
        })
    }

    /// The input record this instance corresponds to.
    pub fn to_record(&self) -> InstanceRecord {
        InstanceRecord {
            plate_width: self.plate_width,
            circuit_count: self.circuits.len(),
            circuits: self.circuits.iter().map(|c| (c.width, c.height)).collect(),
        }
    }
}

/// Ceiling division for a positive divisor.
fn ceil_div(numerator: i64, divisor: i64) -> i64 {
    let q = numerator.div_euclid(divisor);
    if numerator.rem_euclid(divisor) != 0 {
        q + 1
    } else {
        q
    }
}
