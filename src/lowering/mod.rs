//! Backend-specific lowerings of the geometry model.
//!
//! The model states non-overlap as an abstract disjunction. A backend
//! either keeps it native ([`SmtFormula`], read by the CP and SMT adapters)
//! or replaces it with indicator variables and big-M rows ([`LinearModel`],
//! read by the MIP adapter). Both lowerings share the [`Row`] form.
//!
//! Lowering is quadratic in the number of circuits, so the backends lower
//! under their deadline and give up with a timeout when it fires.
//!
//! # References
//!
//! - Williams (2013), "Model Building in Mathematical Programming", ch. 9 (big-M disjunctions)
//! - Nieuwenhuis, Oliveras & Tinelli (2006), "Solving SAT and SAT Modulo Theories"

pub mod linear;
mod rows;
pub mod smt;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use linear::{Column, ColumnKind, LinearModel, PairIndicators};
pub use rows::Row;
pub use smt::{Clause, SmtFormula};

/// How a backend expresses the non-overlap disjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NonOverlapEncoding {
    /// Native disjunction (CP, SMT).
    Disjunctive,
    /// Four binary indicators per pair with big-M rows (MIP).
    BigM,
}

impl fmt::Display for NonOverlapEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disjunctive => write!(f, "disjunctive"),
            Self::BigM => write!(f, "big-M"),
        }
    }
}
