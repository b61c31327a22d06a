//! Linear `<=` rows over bounded integer columns.
//!
//! Both the big-M and the disjunctive lowering end up as rows
//! `Σ a_k v_k <= rhs`, which every engine adapter posts term by term.

/// `Σ coef * column <= rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub terms: Vec<(usize, i64)>,
    pub rhs: i64,
}

impl Row {
    /// Value of the left-hand side under a full assignment.
    pub fn activity(&self, values: &[i64]) -> i64 {
        self.terms.iter().map(|&(c, a)| a * values[c]).sum()
    }

    pub fn holds(&self, values: &[i64]) -> bool {
        self.activity(values) <= self.rhs
    }
}

/// Accumulates terms and a constant, then moves the constant to the rhs.
#[derive(Debug, Default)]
pub(crate) struct RowBuilder {
    terms: Vec<(usize, i64)>,
    constant: i64,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, column: usize, coef: i64) -> Self {
        if coef == 0 {
            return self;
        }
        match self.terms.iter_mut().find(|(c, _)| *c == column) {
            Some((_, a)) => *a += coef,
            None => self.terms.push((column, coef)),
        }
        self.terms.retain(|&(_, a)| a != 0);
        self
    }

    pub fn constant(mut self, value: i64) -> Self {
        self.constant += value;
        self
    }

    /// `terms + constant <= rhs`.
    pub fn le(self, rhs: i64) -> Row {
        Row {
            terms: self.terms,
            rhs: rhs - self.constant,
        }
    }
}
