//! Big-M lowering of the geometry model to a mixed-integer linear model.
//!
//! # Formulation
//!
//! Columns: `x_i`, `y_i`, `height` (integer), `rotated_i` (binary, when
//! rotation is allowed), four indicators `s_ij_k` per pair (binary, `1`
//! relaxes direction `k`) and one tie indicator for the lexicographic
//! symmetry constraint.
//!
//! With `ew_i = w_i + (h_i - w_i) * rotated_i` and `eh_i = h_i + (w_i - h_i) * rotated_i`:
//!
//! ```text
//! x_i + ew_i <= W                      y_i + eh_i - height <= 0
//! x_i + ew_i - x_j - W  * s_ij_left  <= 0
//! y_i + eh_i - y_j - UB * s_ij_below <= 0
//! x_j + ew_j - x_i - W  * s_ij_right <= 0
//! y_j + eh_j - y_i - UB * s_ij_above <= 0
//! s_ij_left + s_ij_below + s_ij_right + s_ij_above <= 3
//! ```
//!
//! The cumulative family has no linear counterpart here and is dropped; it
//! is implied by non-overlap.

use std::fmt::Write;

use std::time::Duration;

use super::rows::{Row, RowBuilder};
use crate::backend::Deadline;
use crate::error::{FloorplanError, Result};
use crate::model::{Constraint, GeometryModel, Separation};

/// Column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Binary,
}

/// A bounded column of the linear model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub lower: i64,
    pub upper: i64,
}

/// The four direction indicators of one circuit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairIndicators {
    pub first: usize,
    pub second: usize,
    /// Columns in [`Separation::ALL`] order.
    pub columns: [usize; 4],
}

/// A big-M mixed-integer linear model: minimize `objective` subject to
/// `rows`, every row of the form `Σ a * column <= rhs`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub row_names: Vec<String>,
    /// Minimized column (the height).
    pub objective: usize,
    pub x: Vec<usize>,
    pub y: Vec<usize>,
    pub rotated: Vec<Option<usize>>,
    pub indicators: Vec<PairIndicators>,
    pub tie: Option<usize>,
}

impl LinearModel {
    /// Lowers `model` with big-M constants `plate_width` (horizontal) and
    /// the upper height bound (vertical).
    pub fn lower(model: &GeometryModel) -> Result<Self> {
        let mut unbounded = Deadline::new(Duration::MAX);
        Self::lower_within(model, &mut unbounded)?.ok_or_else(|| {
            FloorplanError::Encoding("unbounded big-M lowering reported a timeout".into())
        })
    }

    /// Like [`LinearModel::lower`], but returns `Ok(None)` once `deadline`
    /// is spent.
    pub(crate) fn lower_within(model: &GeometryModel, deadline: &mut Deadline) -> Result<Option<Self>> {
        model.validate()?;

        let n = model.circuit_count();
        let width = model.plate_width();
        let upper = model.upper_height_bound();
        let mut lm = LinearModel {
            columns: Vec::new(),
            rows: Vec::new(),
            row_names: Vec::new(),
            objective: 0,
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            rotated: Vec::with_capacity(n),
            indicators: Vec::new(),
            tie: None,
        };

        let height_var = model.int_var(model.height());
        lm.objective = lm.add_column(&height_var.name, ColumnKind::Integer, height_var.min, height_var.max);

        for i in 0..n {
            if deadline.step() {
                return Ok(None);
            }
            let vars = model.circuit_vars(i);
            let x = model.int_var(vars.x);
            let y = model.int_var(vars.y);
            let xc = lm.add_column(&x.name, ColumnKind::Integer, x.min, x.max);
            let yc = lm.add_column(&y.name, ColumnKind::Integer, y.min, y.max);
            lm.x.push(xc);
            lm.y.push(yc);
            let rc = vars.rotated.map(|id| {
                let var = model.bool_var(id);
                let (lo, hi) = match var.fixed {
                    Some(v) => (v as i64, v as i64),
                    None => (0, 1),
                };
                lm.add_column(&var.name, ColumnKind::Binary, lo, hi)
            });
            lm.rotated.push(rc);
        }

        for constraint in model.constraints() {
            if deadline.step() {
                log::debug!("big-M lowering of {} stopped at the deadline", model.name);
                return Ok(None);
            }
            match constraint {
                Constraint::Boundary { circuit } => lm.lower_boundary(model, *circuit),
                Constraint::NonOverlap { first, second } => {
                    lm.lower_non_overlap(model, *first, *second)
                }
                Constraint::LexicographicOrder { first, second } => {
                    lm.lower_lex(model, *first, *second)
                }
                Constraint::LowerLeftQuadrant { circuit } => {
                    let row = RowBuilder::new().term(lm.x[*circuit], 2).le(width - 1);
                    lm.push_row(format!("quadrant_x_{circuit}"), row);
                    let row = RowBuilder::new()
                        .term(lm.y[*circuit], 2)
                        .term(lm.objective, -1)
                        .le(-1);
                    lm.push_row(format!("quadrant_y_{circuit}"), row);
                }
                // Folded into the extent terms of every row.
                Constraint::RotationConsistency { .. } => {}
                Constraint::Cumulative { .. } => {
                    log::debug!("big-M lowering drops the redundant cumulative constraint");
                }
            }
        }

        if lm.rows.is_empty() {
            return Err(FloorplanError::Encoding(
                "big-M lowering produced no rows".into(),
            ));
        }
        log::debug!(
            "big-M model: {} columns ({} binary), {} rows, M = ({width}, {upper})",
            lm.columns.len(),
            lm.binary_columns().count(),
            lm.rows.len()
        );
        Ok(Some(lm))
    }

    fn add_column(&mut self, name: &str, kind: ColumnKind, lower: i64, upper: i64) -> usize {
        self.columns.push(Column {
            name: name.to_string(),
            kind,
            lower,
            upper,
        });
        self.columns.len() - 1
    }

    fn push_row(&mut self, name: String, row: Row) {
        self.rows.push(row);
        self.row_names.push(name);
    }

    /// Adds `coef * ew_i` (horizontal) or `coef * eh_i` to `b`.
    fn extent(&self, model: &GeometryModel, b: RowBuilder, i: usize, horizontal: bool, coef: i64) -> RowBuilder {
        let c = model.circuit(i);
        let (base, turned) = if horizontal {
            (c.width, c.height)
        } else {
            (c.height, c.width)
        };
        let b = b.constant(coef * base);
        match self.rotated[i] {
            Some(r) => b.term(r, coef * (turned - base)),
            None => b,
        }
    }

    fn lower_boundary(&mut self, model: &GeometryModel, i: usize) {
        let b = RowBuilder::new().term(self.x[i], 1);
        let row = self.extent(model, b, i, true, 1).le(model.plate_width());
        self.push_row(format!("inside_plate_x_{i}"), row);

        let b = RowBuilder::new().term(self.y[i], 1).term(self.objective, -1);
        let row = self.extent(model, b, i, false, 1).le(0);
        self.push_row(format!("inside_plate_y_{i}"), row);
    }

    fn lower_non_overlap(&mut self, model: &GeometryModel, i: usize, j: usize) {
        let big_x = model.plate_width();
        let big_y = model.upper_height_bound();
        let mut columns = [0usize; 4];
        for (k, dir) in Separation::ALL.into_iter().enumerate() {
            let s = self.add_column(&format!("s_{i}_{j}_{}", dir.tag()), ColumnKind::Binary, 0, 1);
            columns[k] = s;
            let (from, to) = match dir {
                Separation::LeftOf | Separation::Below => (i, j),
                Separation::RightOf | Separation::Above => (j, i),
            };
            let (pos, big) = if dir.is_horizontal() {
                (&self.x, big_x)
            } else {
                (&self.y, big_y)
            };
            let b = RowBuilder::new()
                .term(pos[from], 1)
                .term(pos[to], -1)
                .term(s, -big);
            let row = self.extent(model, b, from, dir.is_horizontal(), 1).le(0);
            self.push_row(format!("no_overlap_{i}_{j}_{}", dir.tag()), row);
        }
        let row = columns
            .iter()
            .fold(RowBuilder::new(), |b, &s| b.term(s, 1))
            .le(3);
        self.push_row(format!("no_overlap_{i}_{j}"), row);
        self.indicators.push(PairIndicators {
            first: i,
            second: j,
            columns,
        });
    }

    /// `t = 0`: `x_a + 1 <= x_b`; `t = 1`: `x_a = x_b` and `y_a <= y_b`.
    fn lower_lex(&mut self, model: &GeometryModel, a: usize, b: usize) {
        let big_x = model.plate_width();
        let big_y = model.upper_height_bound();
        let t = self.add_column(&format!("tie_{a}_{b}"), ColumnKind::Binary, 0, 1);
        self.tie = Some(t);
        let (xa, xb, ya, yb) = (self.x[a], self.x[b], self.y[a], self.y[b]);

        let row = RowBuilder::new().term(xa, 1).term(xb, -1).le(0);
        self.push_row(format!("lex_x_{a}_{b}"), row);
        let row = RowBuilder::new()
            .term(xa, 1)
            .term(xb, -1)
            .term(t, -big_x)
            .le(-1);
        self.push_row(format!("lex_strict_{a}_{b}"), row);
        let row = RowBuilder::new()
            .term(xb, 1)
            .term(xa, -1)
            .term(t, big_x)
            .le(big_x);
        self.push_row(format!("lex_tie_x_{a}_{b}"), row);
        let row = RowBuilder::new()
            .term(ya, 1)
            .term(yb, -1)
            .term(t, big_y)
            .le(big_y);
        self.push_row(format!("lex_tie_y_{a}_{b}"), row);
    }

    /// Indices of binary columns.
    pub fn binary_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == ColumnKind::Binary)
            .map(|(i, _)| i)
    }

    /// Index of the first row violated by `values`.
    pub fn first_violated(&self, values: &[i64]) -> Option<usize> {
        self.rows.iter().position(|r| !r.holds(values))
    }

    /// Per-circuit `(x, y, rotated)` and the height read from column values.
    pub fn layout(&self, values: &[i64]) -> (Vec<(i64, i64, bool)>, i64) {
        let layout = (0..self.x.len())
            .map(|i| {
                (
                    values[self.x[i]],
                    values[self.y[i]],
                    self.rotated[i].is_some_and(|c| values[c] == 1),
                )
            })
            .collect();
        (layout, values[self.objective])
    }

    /// Renders the model in CPLEX LP format.
    pub fn to_lp_format(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\\ strip packing, big-M formulation");
        let _ = writeln!(out, "Minimize");
        let _ = writeln!(out, " obj: {}", self.columns[self.objective].name);
        let _ = writeln!(out, "Subject To");
        for (row, name) in self.rows.iter().zip(&self.row_names) {
            let _ = writeln!(out, " {name}: {} <= {}", self.render_terms(row), row.rhs);
        }
        let _ = writeln!(out, "Bounds");
        for c in self.columns.iter().filter(|c| c.kind == ColumnKind::Integer) {
            let _ = writeln!(out, " {} <= {} <= {}", c.lower, c.name, c.upper);
        }
        for c in self
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Binary && c.lower == c.upper)
        {
            let _ = writeln!(out, " {} = {}", c.name, c.lower);
        }
        let _ = writeln!(out, "General");
        for c in self.columns.iter().filter(|c| c.kind == ColumnKind::Integer) {
            let _ = writeln!(out, " {}", c.name);
        }
        let _ = writeln!(out, "Binary");
        for c in self.columns.iter().filter(|c| c.kind == ColumnKind::Binary) {
            let _ = writeln!(out, " {}", c.name);
        }
        let _ = writeln!(out, "End");
        out
    }

    fn render_terms(&self, row: &Row) -> String {
        let mut s = String::new();
        for (k, &(c, a)) in row.terms.iter().enumerate() {
            let name = &self.columns[c].name;
            let sign = if a < 0 { "-" } else if k > 0 { "+" } else { "" };
            let sep = if k > 0 { " " } else { "" };
            if a.abs() == 1 {
                let _ = write!(s, "{sep}{sign} {name}");
            } else {
                let _ = write!(s, "{sep}{sign} {} {name}", a.abs());
            }
        }
        s.trim_start().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::model::{encode, PackingConfig};

    fn lowered(dims: &[(i64, i64)], width: i64, config: &PackingConfig) -> LinearModel {
        let inst = Instance::from_dims(width, dims).unwrap();
        LinearModel::lower(&encode(&inst, config).unwrap()).unwrap()
    }

    #[test]
    fn test_column_and_row_counts() {
        let lm = lowered(&[(2, 2), (3, 1), (1, 4)], 5, &PackingConfig::default());
        // height + 3 * (x, y) + 3 pairs * 4 indicators
        assert_eq!(lm.columns.len(), 1 + 6 + 12);
        // 3 * 2 boundary + 3 pairs * 5
        assert_eq!(lm.rows.len(), 6 + 15);
        assert_eq!(lm.indicators.len(), 3);
    }

    #[test]
    fn test_side_by_side_assignment_satisfies_rows() {
        let lm = lowered(&[(4, 4), (4, 4)], 8, &PackingConfig::default());
        let mut values = vec![0i64; lm.columns.len()];
        values[lm.objective] = 4;
        values[lm.x[1]] = 4;
        // circuit 0 left of circuit 1: relax the other three directions
        let ind = lm.indicators[0];
        for (k, &c) in ind.columns.iter().enumerate() {
            values[c] = if Separation::ALL[k] == Separation::LeftOf { 0 } else { 1 };
        }
        assert_eq!(lm.first_violated(&values), None);

        // overlapping positions violate whichever direction is active
        values[lm.x[1]] = 2;
        assert!(lm.first_violated(&values).is_some());

        values[lm.x[1]] = 4;
        let (layout, height) = lm.layout(&values);
        assert_eq!(layout, vec![(0, 0, false), (4, 0, false)]);
        assert_eq!(height, 4);
    }

    #[test]
    fn test_spent_deadline_stops_lowering() {
        let dims: Vec<(i64, i64)> = (0..60).map(|i| (1 + i % 5, 1 + i % 3)).collect();
        let inst = Instance::from_dims(10, &dims).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        let mut deadline = Deadline::new(Duration::ZERO);
        assert!(LinearModel::lower_within(&model, &mut deadline).unwrap().is_none());
    }

    #[test]
    fn test_rotation_terms() {
        let config = PackingConfig::default().with_rotation(true);
        let lm = lowered(&[(1, 3), (2, 2)], 4, &config);
        let r0 = lm.rotated[0].unwrap();
        assert_eq!(lm.columns[r0].lower, 0);
        assert_eq!(lm.columns[r0].upper, 1);
        // square circuit is fixed upright
        let r1 = lm.rotated[1].unwrap();
        assert_eq!((lm.columns[r1].lower, lm.columns[r1].upper), (0, 0));

        // x_0 + 1 + 2 * rotated_0 <= 4
        let row = &lm.rows[0];
        assert_eq!(row.terms, vec![(lm.x[0], 1), (r0, 2)]);
        assert_eq!(row.rhs, 3);
    }

    #[test]
    fn test_symmetry_rows() {
        let config = PackingConfig::default().with_symmetry_breaking(true);
        let lm = lowered(&[(2, 2), (3, 3), (1, 1)], 6, &config);
        assert!(lm.tie.is_some());
        assert!(lm.row_names.iter().any(|n| n == "quadrant_x_1"));
        assert!(lm.row_names.iter().any(|n| n == "lex_strict_1_0"));
    }

    #[test]
    fn test_lp_format() {
        let lm = lowered(&[(4, 4), (4, 4)], 8, &PackingConfig::default());
        let lp = lm.to_lp_format();
        assert!(lp.starts_with("\\ strip packing"));
        assert!(lp.contains("Minimize\n obj: height\n"));
        assert!(lp.contains(" inside_plate_x_0: x_0 <= 4\n"));
        assert!(lp.contains(" no_overlap_0_1_left: x_0 - x_1 - 8 s_0_1_left <= -4\n"));
        assert!(lp.contains("Binary\n s_0_1_left\n"));
        assert!(lp.trim_end().ends_with("End"));
    }
}
