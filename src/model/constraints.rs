//! Constraint families of the geometry model.
//!
//! Constraints are stated over circuits rather than over raw variables: the
//! effective width and height of a circuit depend on its rotation variable,
//! and each backend lowers that dependency its own way.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::variables::BoolVarId;

/// The named collection a constraint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintFamily {
    Boundary,
    NonOverlap,
    Cumulative,
    SymmetryBreaking,
    RotationConsistency,
}

impl std::fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boundary => write!(f, "boundary"),
            Self::NonOverlap => write!(f, "non-overlap"),
            Self::Cumulative => write!(f, "cumulative"),
            Self::SymmetryBreaking => write!(f, "symmetry-breaking"),
            Self::RotationConsistency => write!(f, "rotation-consistency"),
        }
    }
}

/// One of the four ways two circuits can be kept apart.
///
/// Read as "`first` is `<direction>` `second`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separation {
    /// `x_first + ew_first <= x_second`
    LeftOf,
    /// `x_second + ew_second <= x_first`
    RightOf,
    /// `y_first + eh_first <= y_second`
    Below,
    /// `y_second + eh_second <= y_first`
    Above,
}

impl Separation {
    /// All directions, in the order the big-M indicators are numbered.
    pub const ALL: [Separation; 4] = [
        Separation::LeftOf,
        Separation::Below,
        Separation::RightOf,
        Separation::Above,
    ];

    pub fn holds(self, first: &Rect, second: &Rect) -> bool {
        match self {
            Separation::LeftOf => first.x + first.width <= second.x,
            Separation::RightOf => second.x + second.width <= first.x,
            Separation::Below => first.y + first.height <= second.y,
            Separation::Above => second.y + second.height <= first.y,
        }
    }

    /// Whether the direction constrains the horizontal axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Separation::LeftOf | Separation::RightOf)
    }

    /// Short tag used in variable and row names.
    pub fn tag(self) -> &'static str {
        match self {
            Separation::LeftOf => "left",
            Separation::RightOf => "right",
            Separation::Below => "below",
            Separation::Above => "above",
        }
    }
}

/// An axis-aligned rectangle with half-open extents
/// `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open rectangles overlap iff they intersect on both axes.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Whether the rectangle lies inside `[0, width) × [0, height)`.
    pub fn inside(&self, width: i64, height: i64) -> bool {
        self.x >= 0 && self.y >= 0 && self.x + self.width <= width && self.y + self.height <= height
    }

    /// Whether the vertical extent covers `u`.
    pub fn covers_row(&self, u: i64) -> bool {
        self.y <= u && u < self.y + self.height
    }
}

/// A constraint in the geometry model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `x >= 0`, `y >= 0`, `x + ew <= plate_width`, `y + eh <= height`.
    Boundary { circuit: usize },

    /// At least one [`Separation`] holds between the two circuits.
    ///
    /// Stated as a disjunction; backends choose how to lower it.
    NonOverlap { first: usize, second: usize },

    /// Along the vertical axis each circuit is a task of duration `eh` and
    /// demand `ew`; the demand of tasks covering any row is at most
    /// `capacity`.
    Cumulative { circuits: Vec<usize>, capacity: i64 },

    /// `(ew, eh)` of `circuit` are swapped when `rotated` is true.
    RotationConsistency { circuit: usize, rotated: BoolVarId },

    /// `x_first < x_second`, or `x_first == x_second` and `y_first <= y_second`.
    LexicographicOrder { first: usize, second: usize },

    /// `2 * x < plate_width` and `2 * y < height`.
    LowerLeftQuadrant { circuit: usize },
}

impl Constraint {
    pub fn family(&self) -> ConstraintFamily {
        match self {
            Constraint::Boundary { .. } => ConstraintFamily::Boundary,
            Constraint::NonOverlap { .. } => ConstraintFamily::NonOverlap,
            Constraint::Cumulative { .. } => ConstraintFamily::Cumulative,
            Constraint::RotationConsistency { .. } => ConstraintFamily::RotationConsistency,
            Constraint::LexicographicOrder { .. } | Constraint::LowerLeftQuadrant { .. } => {
                ConstraintFamily::SymmetryBreaking
            }
        }
    }

    /// Circuits the constraint mentions.
    pub fn circuits(&self) -> Vec<usize> {
        match self {
            Constraint::Boundary { circuit }
            | Constraint::RotationConsistency { circuit, .. }
            | Constraint::LowerLeftQuadrant { circuit } => vec![*circuit],
            Constraint::NonOverlap { first, second }
            | Constraint::LexicographicOrder { first, second } => vec![*first, *second],
            Constraint::Cumulative { circuits, .. } => circuits.clone(),
        }
    }

    /// Evaluates the constraint on concrete rectangles.
    ///
    /// `rects[i]` carries circuit `i`'s position and effective extent, which
    /// already reflects its rotation; rotation consistency is therefore
    /// checked by the decoder, not here.
    pub fn holds(&self, rects: &[Rect], plate_width: i64, height: i64) -> bool {
        match self {
            Constraint::Boundary { circuit } => rects[*circuit].inside(plate_width, height),
            Constraint::NonOverlap { first, second } => {
                let (a, b) = (&rects[*first], &rects[*second]);
                Separation::ALL.iter().any(|s| s.holds(a, b))
            }
            Constraint::Cumulative {
                circuits,
                capacity,
            } => cumulative_holds(circuits.iter().map(|&i| &rects[i]), *capacity),
            Constraint::RotationConsistency { .. } => true,
            Constraint::LexicographicOrder { first, second } => {
                let (a, b) = (&rects[*first], &rects[*second]);
                a.x < b.x || (a.x == b.x && a.y <= b.y)
            }
            Constraint::LowerLeftQuadrant { circuit } => {
                let r = &rects[*circuit];
                2 * r.x < plate_width && 2 * r.y < height
            }
        }
    }
}

/// Time-table check: at every row where some task starts, the summed widths
/// of the tasks covering that row stay within `capacity`.
///
/// Checking start rows suffices because the load only increases there.
pub fn cumulative_holds<'a>(tasks: impl Iterator<Item = &'a Rect> + Clone, capacity: i64) -> bool {
    tasks.clone().all(|start| {
        let load: i64 = tasks
            .clone()
            .filter(|t| t.covers_row(start.y))
            .map(|t| t.width)
            .sum();
        load <= capacity
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_overlap_half_open() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 0, 4, 4);
        let c = Rect::new(3, 3, 2, 2);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_separation_directions() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(2, 5, 2, 2);
        assert!(Separation::LeftOf.holds(&a, &b));
        assert!(Separation::Below.holds(&a, &b));
        assert!(!Separation::RightOf.holds(&a, &b));
        assert!(Separation::Above.holds(&b, &a));
    }

    #[test]
    fn test_constraint_families() {
        assert_eq!(
            Constraint::Boundary { circuit: 0 }.family(),
            ConstraintFamily::Boundary
        );
        assert_eq!(
            Constraint::LowerLeftQuadrant { circuit: 0 }.family(),
            ConstraintFamily::SymmetryBreaking
        );
        assert_eq!(
            Constraint::LexicographicOrder { first: 0, second: 1 }.circuits(),
            vec![0, 1]
        );
    }

    #[test]
    fn test_cumulative_profile() {
        // Two 3-wide tasks stacked in the same rows exceed capacity 5.
        let rects = [Rect::new(0, 0, 3, 2), Rect::new(3, 1, 3, 2)];
        assert!(!cumulative_holds(rects.iter(), 5));
        assert!(cumulative_holds(rects.iter(), 6));

        let stacked = [Rect::new(0, 0, 3, 2), Rect::new(0, 2, 3, 2)];
        assert!(cumulative_holds(stacked.iter(), 3));
    }

    #[test]
    fn test_holds_on_layout() {
        let rects = [Rect::new(0, 0, 4, 4), Rect::new(4, 0, 4, 4)];
        assert!(Constraint::NonOverlap { first: 0, second: 1 }.holds(&rects, 8, 4));
        assert!(Constraint::Boundary { circuit: 1 }.holds(&rects, 8, 4));
        assert!(!Constraint::Boundary { circuit: 1 }.holds(&rects, 7, 4));
        assert!(Constraint::LexicographicOrder { first: 0, second: 1 }.holds(&rects, 8, 4));
        assert!(!Constraint::LexicographicOrder { first: 1, second: 0 }.holds(&rects, 8, 4));
        assert!(Constraint::LowerLeftQuadrant { circuit: 0 }.holds(&rects, 8, 4));
        assert!(!Constraint::LowerLeftQuadrant { circuit: 1 }.holds(&rects, 8, 4));
    }
}
