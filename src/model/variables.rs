//! Decision variables of the geometry model.

/// Handle of an integer variable inside a [`GeometryModel`](super::GeometryModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVarId(pub usize);

/// Handle of a boolean variable inside a [`GeometryModel`](super::GeometryModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVarId(pub usize);

/// An integer variable with a domain [min, max].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVar {
    /// Variable name (unique identifier within a model).
    pub name: String,
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Domain size (max - min + 1), zero for an empty domain.
    pub fn domain_size(&self) -> i64 {
        (self.max - self.min + 1).max(0)
    }
}

/// A boolean variable (true/false decision).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolVar {
    /// Variable name.
    pub name: String,
    /// Fixed value, if any.
    pub fixed: Option<bool>,
}

impl BoolVar {
    /// Creates a new boolean variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed: None,
        }
    }

    /// Creates a fixed boolean variable.
    pub fn fixed(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            fixed: Some(value),
        }
    }

    /// Values this variable may take, `false` first.
    pub fn values(&self) -> &'static [bool] {
        match self.fixed {
            Some(false) => &[false],
            Some(true) => &[true],
            None => &[false, true],
        }
    }
}
