//! Disjunctive lowering of the geometry model for the CP and SMT engines.
//!
//! Non-overlap stays a native disjunction: each pair contributes one clause
//! of four single-row cubes. Rows are linear over integer columns; a rotation
//! column is a 0/1 column whose coefficient carries the extent difference,
//! so `x_i + ew_i <= x_j` reads `x_i + (h_i - w_i) * rotated_i - x_j <= -w_i`.

use std::fmt::Write;
use std::time::Duration;

use super::linear::{Column, ColumnKind};
use super::rows::{Row, RowBuilder};
use crate::backend::Deadline;
use crate::error::{FloorplanError, Result};
use crate::model::{Constraint, GeometryModel, Separation};

/// A disjunction of cubes; each cube is a conjunction of rows, given as
/// indices into [`SmtFormula::rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub name: String,
    pub cubes: Vec<Vec<usize>>,
}

/// Hard rows plus disjunctive clauses, minimizing one column.
#[derive(Debug, Clone)]
pub struct SmtFormula {
    pub columns: Vec<Column>,
    /// Every row: hard rows and the rows of all cubes.
    pub rows: Vec<Row>,
    pub hard: Vec<usize>,
    pub clauses: Vec<Clause>,
    pub objective: usize,
    pub x: Vec<usize>,
    pub y: Vec<usize>,
    pub rotated: Vec<Option<usize>>,
    cumulative: Option<i64>,
    circuits: Vec<(i64, i64)>,
    plate_width: i64,
}

impl SmtFormula {
    pub fn lower(model: &GeometryModel) -> Result<Self> {
        let mut unbounded = Deadline::new(Duration::MAX);
        Self::lower_within(model, &mut unbounded)?.ok_or_else(|| {
            FloorplanError::Encoding("unbounded disjunctive lowering reported a timeout".into())
        })
    }

    /// Like [`SmtFormula::lower`], but returns `Ok(None)` once `deadline` is
    /// spent.
    pub(crate) fn lower_within(model: &GeometryModel, deadline: &mut Deadline) -> Result<Option<Self>> {
        model.validate()?;

        let n = model.circuit_count();
        let mut f = SmtFormula {
            columns: Vec::new(),
            rows: Vec::new(),
            hard: Vec::new(),
            clauses: Vec::new(),
            objective: 0,
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            rotated: Vec::with_capacity(n),
            cumulative: model.cumulative_capacity(),
            circuits: model.circuits().iter().map(|c| (c.width, c.height)).collect(),
            plate_width: model.plate_width(),
        };

        let h = model.int_var(model.height());
        f.objective = f.add_column(&h.name, ColumnKind::Integer, h.min, h.max);
        for i in 0..n {
            if deadline.step() {
                return Ok(None);
            }
            let vars = model.circuit_vars(i);
            let x = model.int_var(vars.x);
            let y = model.int_var(vars.y);
            let xc = f.add_column(&x.name, ColumnKind::Integer, x.min, x.max);
            let yc = f.add_column(&y.name, ColumnKind::Integer, y.min, y.max);
            f.x.push(xc);
            f.y.push(yc);
            let rc = vars.rotated.map(|id| {
                let var = model.bool_var(id);
                let (lo, hi) = var.fixed.map_or((0, 1), |v| (v as i64, v as i64));
                f.add_column(&var.name, ColumnKind::Binary, lo, hi)
            });
            f.rotated.push(rc);
        }

        for constraint in model.constraints() {
            if deadline.step() {
                log::debug!("disjunctive lowering of {} stopped at the deadline", model.name);
                return Ok(None);
            }
            match constraint {
                Constraint::Boundary { circuit } => {
                    let i = *circuit;
                    let b = RowBuilder::new().term(f.x[i], 1);
                    let row = f.extent(b, i, true).le(f.plate_width);
                    f.push_hard(row);
                    let b = RowBuilder::new().term(f.y[i], 1).term(f.objective, -1);
                    let row = f.extent(b, i, false).le(0);
                    f.push_hard(row);
                }
                Constraint::NonOverlap { first, second } => {
                    let (i, j) = (*first, *second);
                    let cubes = Separation::ALL
                        .into_iter()
                        .map(|dir| {
                            let (from, to) = match dir {
                                Separation::LeftOf | Separation::Below => (i, j),
                                Separation::RightOf | Separation::Above => (j, i),
                            };
                            let pos = if dir.is_horizontal() { &f.x } else { &f.y };
                            let b = RowBuilder::new().term(pos[from], 1).term(pos[to], -1);
                            let row = f.extent(b, from, dir.is_horizontal()).le(0);
                            vec![f.push_row(row)]
                        })
                        .collect();
                    f.clauses.push(Clause {
                        name: format!("no_overlap_{i}_{j}"),
                        cubes,
                    });
                }
                Constraint::LexicographicOrder { first, second } => {
                    let (a, b) = (*first, *second);
                    let strict = RowBuilder::new().term(f.x[a], 1).term(f.x[b], -1).le(-1);
                    let tie_x = RowBuilder::new().term(f.x[b], 1).term(f.x[a], -1).le(0);
                    let tie_y = RowBuilder::new().term(f.y[a], 1).term(f.y[b], -1).le(0);
                    let weak = RowBuilder::new().term(f.x[a], 1).term(f.x[b], -1).le(0);
                    f.push_hard(weak);
                    let cubes = vec![
                        vec![f.push_row(strict)],
                        vec![f.push_row(tie_x), f.push_row(tie_y)],
                    ];
                    f.clauses.push(Clause {
                        name: format!("lex_{a}_{b}"),
                        cubes,
                    });
                }
                Constraint::LowerLeftQuadrant { circuit } => {
                    let row = RowBuilder::new().term(f.x[*circuit], 2).le(f.plate_width - 1);
                    f.push_hard(row);
                    let row = RowBuilder::new()
                        .term(f.y[*circuit], 2)
                        .term(f.objective, -1)
                        .le(-1);
                    f.push_hard(row);
                }
                Constraint::RotationConsistency { .. } | Constraint::Cumulative { .. } => {}
            }
        }

        if f.hard.is_empty() {
            return Err(FloorplanError::Encoding(
                "disjunctive lowering produced no rows".into(),
            ));
        }
        log::debug!(
            "disjunctive formula: {} columns, {} hard rows, {} clauses",
            f.columns.len(),
            f.hard.len(),
            f.clauses.len()
        );
        Ok(Some(f))
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

    fn push_row(&mut self, row: Row) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    fn push_hard(&mut self, row: Row) {
        let r = self.push_row(row);
        self.hard.push(r);
    }

    fn extent(&self, b: RowBuilder, i: usize, horizontal: bool) -> RowBuilder {
        let (w, h) = self.circuits[i];
        let (base, turned) = if horizontal { (w, h) } else { (h, w) };
        let b = b.constant(base);
        match self.rotated[i] {
            Some(r) => b.term(r, turned - base),
            None => b,
        }
    }

    /// Index of the first cube of `clause` that holds under `values`.
    pub fn satisfied_cube(&self, clause: &Clause, values: &[i64]) -> Option<usize> {
        clause
            .cubes
            .iter()
            .position(|cube| cube.iter().all(|&r| self.rows[r].holds(values)))
    }

    /// Whether `values` satisfies every hard row and every clause.
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        self.hard.iter().all(|&r| self.rows[r].holds(values))
            && self
                .clauses
                .iter()
                .all(|c| self.satisfied_cube(c, values).is_some())
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

    /// Renders the formula as an SMT-LIB 2 optimization script.
    pub fn to_smtlib(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "; strip packing, disjunctive formulation");
        let _ = writeln!(out, "(set-logic QF_LIA)");
        for c in &self.columns {
            match c.kind {
                ColumnKind::Integer => {
                    let _ = writeln!(out, "(declare-fun {} () Int)", c.name);
                    let _ = writeln!(out, "(assert (<= {} {} {}))", c.lower, c.name, c.upper);
                }
                ColumnKind::Binary => {
                    let _ = writeln!(out, "(declare-fun {} () Bool)", c.name);
                    if c.lower == c.upper {
                        let value = if c.lower == 1 { "true" } else { "false" };
                        let _ = writeln!(out, "(assert (= {} {value}))", c.name);
                    }
                }
            }
        }
        for &r in &self.hard {
            let _ = writeln!(out, "(assert {})", self.render_row(&self.rows[r]));
        }
        for clause in &self.clauses {
            let cubes: Vec<String> = clause
                .cubes
                .iter()
                .map(|cube| match cube.as_slice() {
                    [single] => self.render_row(&self.rows[*single]),
                    rows => {
                        let parts: Vec<String> =
                            rows.iter().map(|&r| self.render_row(&self.rows[r])).collect();
                        format!("(and {})", parts.join(" "))
                    }
                })
                .collect();
            let _ = writeln!(out, "; {}", clause.name);
            let _ = writeln!(out, "(assert (or {}))", cubes.join(" "));
        }
        if let Some(capacity) = self.cumulative {
            for j in 0..self.x.len() {
                let loads: Vec<String> = (0..self.x.len())
                    .map(|i| {
                        format!(
                            "(ite (and (<= {yi} {yj}) (< {yj} (+ {yi} {eh}))) {ew} 0)",
                            yi = self.columns[self.y[i]].name,
                            yj = self.columns[self.y[j]].name,
                            eh = self.extent_expr(i, false),
                            ew = self.extent_expr(i, true),
                        )
                    })
                    .collect();
                let _ = writeln!(out, "(assert (<= (+ {}) {capacity}))", loads.join(" "));
            }
        }
        let _ = writeln!(out, "(minimize {})", self.columns[self.objective].name);
        let _ = writeln!(out, "(check-sat)");
        let _ = writeln!(out, "(get-model)");
        out
    }

    fn column_expr(&self, c: usize) -> String {
        let col = &self.columns[c];
        match col.kind {
            ColumnKind::Integer => col.name.clone(),
            ColumnKind::Binary => format!("(ite {} 1 0)", col.name),
        }
    }

    fn extent_expr(&self, i: usize, horizontal: bool) -> String {
        let (w, h) = self.circuits[i];
        let (base, turned) = if horizontal { (w, h) } else { (h, w) };
        match self.rotated[i] {
            Some(r) if base != turned => {
                format!("(ite {} {turned} {base})", self.columns[r].name)
            }
            _ => base.to_string(),
        }
    }

    fn render_row(&self, row: &Row) -> String {
        let terms: Vec<String> = row
            .terms
            .iter()
            .map(|&(c, a)| match a {
                1 => self.column_expr(c),
                _ => format!("(* {} {})", lit(a), self.column_expr(c)),
            })
            .collect();
        let lhs = match terms.as_slice() {
            [single] => single.clone(),
            _ => format!("(+ {})", terms.join(" ")),
        };
        format!("(<= {lhs} {})", lit(row.rhs))
    }
}

fn lit(v: i64) -> String {
    if v < 0 {
        format!("(- {})", -v)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::model::{encode, PackingConfig};

    fn formula(dims: &[(i64, i64)], width: i64, config: &PackingConfig) -> SmtFormula {
        let inst = Instance::from_dims(width, dims).unwrap();
        SmtFormula::lower(&encode(&inst, config).unwrap()).unwrap()
    }

    #[test]
    fn test_clause_structure() {
        let f = formula(&[(2, 2), (3, 1), (1, 4)], 5, &PackingConfig::default());
        assert_eq!(f.clauses.len(), 3);
        assert!(f.clauses.iter().all(|c| c.cubes.len() == 4));
        assert_eq!(f.hard.len(), 6);
        assert_eq!(f.columns.len(), 7);
    }

    #[test]
    fn test_satisfaction() {
        let f = formula(&[(4, 4), (4, 4)], 8, &PackingConfig::default());
        let mut values = vec![0i64; f.columns.len()];
        values[f.objective] = 4;
        values[f.x[1]] = 4;
        assert!(f.is_satisfied(&values));
        assert_eq!(f.satisfied_cube(&f.clauses[0], &values), Some(0));

        values[f.x[1]] = 3;
        assert!(!f.is_satisfied(&values));
    }

    #[test]
    fn test_layout_reads_rotation() {
        let config = PackingConfig::default().with_rotation(true);
        let f = formula(&[(1, 3), (2, 2)], 4, &config);
        let mut values = vec![0i64; f.columns.len()];
        // turned bar lies along the bottom, the square sits on it
        values[f.objective] = 3;
        values[f.y[1]] = 1;
        values[f.rotated[0].unwrap()] = 1;
        assert!(f.is_satisfied(&values));
        let (layout, height) = f.layout(&values);
        assert_eq!(layout, vec![(0, 0, true), (0, 1, false)]);
        assert_eq!(height, 3);
    }

    #[test]
    fn test_spent_deadline_stops_lowering() {
        let inst = Instance::from_dims(6, &[(2, 2), (3, 1), (1, 4)]).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        let mut deadline = Deadline::new(Duration::ZERO);
        assert!(SmtFormula::lower_within(&model, &mut deadline).unwrap().is_none());
    }

    #[test]
    fn test_lex_clause() {
        let config = PackingConfig::default().with_symmetry_breaking(true);
        let f = formula(&[(3, 3), (3, 3)], 3, &config);
        let lex = f.clauses.iter().find(|c| c.name == "lex_0_1").unwrap();
        assert_eq!(lex.cubes.len(), 2);
        assert_eq!(lex.cubes[1].len(), 2);

        // stacked at x = 0: only the tie cube holds
        let mut values = vec![0i64; f.columns.len()];
        values[f.objective] = 6;
        values[f.y[1]] = 3;
        assert_eq!(f.satisfied_cube(lex, &values), Some(1));
        assert!(f.is_satisfied(&values));

        // swapped: circuit 0 on top breaks the tie cube and the quadrant
        values[f.y[0]] = 3;
        values[f.y[1]] = 0;
        assert_eq!(f.satisfied_cube(lex, &values), None);
        assert!(!f.is_satisfied(&values));
    }

    #[test]
    fn test_smtlib_rendering() {
        let config = PackingConfig::default().with_rotation(true);
        let f = formula(&[(1, 3), (2, 2)], 4, &config);
        let text = f.to_smtlib();
        assert!(text.contains("(declare-fun height () Int)"));
        assert!(text.contains("(declare-fun rotated_0 () Bool)"));
        assert!(text.contains("(assert (= rotated_1 false))"));
        assert!(text.contains("(assert (<= (+ x_0 (* 2 (ite rotated_0 1 0))) 3))"));
        assert!(text.contains("(ite rotated_0 3 1)"));
        assert!(text.contains("(minimize height)"));
        assert!(text.trim_end().ends_with("(get-model)"));
    }
}
