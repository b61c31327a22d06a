//! Validated placements and the output record.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::Rect;

/// A circuit's final position and effective extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacedCircuit {
    pub effective_width: i64,
    pub effective_height: i64,
    pub x: i64,
    pub y: i64,
    pub rotated: bool,
}

impl PlacedCircuit {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.effective_width, self.effective_height)
    }
}

/// A complete packing: plate dimensions and one entry per circuit, in
/// instance order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    pub plate_width: i64,
    pub plate_height: i64,
    pub circuits: Vec<PlacedCircuit>,
}

impl Placement {
    pub fn rects(&self) -> Vec<Rect> {
        self.circuits.iter().map(PlacedCircuit::rect).collect()
    }

    /// Top edge of the highest circuit.
    pub fn used_height(&self) -> i64 {
        self.circuits
            .iter()
            .map(|c| c.y + c.effective_height)
            .max()
            .unwrap_or(0)
    }

    /// Checks containment in the plate and pairwise non-overlap.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (i, c) in self.circuits.iter().enumerate() {
            if !c.rect().inside(self.plate_width, self.plate_height) {
                return Err(ValidationError::OutOfBounds {
                    circuit: i,
                    x: c.x,
                    y: c.y,
                    width: c.effective_width,
                    height: c.effective_height,
                    plate_width: self.plate_width,
                    plate_height: self.plate_height,
                });
            }
        }
        let rects = self.rects();
        for first in 0..rects.len() {
            for second in (first + 1)..rects.len() {
                if rects[first].overlaps(&rects[second]) {
                    return Err(ValidationError::Overlap { first, second });
                }
            }
        }
        Ok(())
    }

    pub fn to_output_record(&self) -> OutputRecord {
        OutputRecord {
            plate_width: self.plate_width,
            achieved_height: self.plate_height,
            circuit_count: self.circuits.len(),
            circuits: self
                .circuits
                .iter()
                .map(|c| (c.effective_width, c.effective_height, c.x, c.y))
                .collect(),
        }
    }
}

/// Result record handed to the result sink.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputRecord {
    pub plate_width: i64,
    pub achieved_height: i64,
    pub circuit_count: usize,
    /// `(effective_width, effective_height, x, y)` per circuit.
    pub circuits: Vec<(i64, i64, i64, i64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(w: i64, h: i64, x: i64, y: i64) -> PlacedCircuit {
        PlacedCircuit {
            effective_width: w,
            effective_height: h,
            x,
            y,
            rotated: false,
        }
    }

    #[test]
    fn test_valid_placement() {
        let p = Placement {
            plate_width: 8,
            plate_height: 4,
            circuits: vec![placed(4, 4, 0, 0), placed(4, 4, 4, 0)],
        };
        assert!(p.validate().is_ok());
        assert_eq!(p.used_height(), 4);

        let record = p.to_output_record();
        assert_eq!(record.achieved_height, 4);
        assert_eq!(record.circuit_count, 2);
        assert_eq!(record.circuits[1], (4, 4, 4, 0));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let p = Placement {
            plate_width: 4,
            plate_height: 4,
            circuits: vec![placed(2, 2, 0, 0), placed(2, 2, 2, 2), placed(2, 2, 0, 2)],
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_overlap_names_pair() {
        let p = Placement {
            plate_width: 8,
            plate_height: 4,
            circuits: vec![placed(2, 2, 0, 0), placed(4, 4, 4, 0), placed(4, 4, 3, 0)],
        };
        assert_eq!(
            p.validate(),
            Err(ValidationError::Overlap { first: 1, second: 2 })
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let p = Placement {
            plate_width: 8,
            plate_height: 4,
            circuits: vec![placed(4, 4, 5, 0)],
        };
        assert!(matches!(
            p.validate(),
            Err(ValidationError::OutOfBounds { circuit: 0, .. })
        ));
    }
}
