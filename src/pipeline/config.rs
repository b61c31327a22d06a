//! Batch configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backend::{BackendChoice, SolverConfig};
use crate::error::InputError;
use crate::model::PackingConfig;

/// Configuration of a batch run over instances `first..=last`.
///
/// # Examples
///
/// ```
/// use u_floorplan::backend::BackendChoice;
/// use u_floorplan::pipeline::BatchConfig;
///
/// let batch = BatchConfig::new(1, 10)
///     .with_backend(BackendChoice::Cp)
///     .with_parallel(true);
/// assert_eq!(batch.instance_ids().count(), 10);
/// assert_eq!(batch.validate().is_ok(), BackendChoice::Cp.is_available());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchConfig {
    /// First instance id (inclusive).
    pub first: usize,
    /// Last instance id (inclusive).
    pub last: usize,
    pub packing: PackingConfig,
    pub backend: BackendChoice,
    /// Engine settings; the time limit is derived from `packing`.
    pub solver: SolverConfig,
    /// Solve instances on the rayon thread pool.
    pub parallel: bool,
}

impl BatchConfig {
    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first,
            last,
            packing: PackingConfig::default(),
            backend: BackendChoice::default(),
            solver: SolverConfig::default(),
            parallel: false,
        }
    }

    pub fn with_packing(mut self, packing: PackingConfig) -> Self {
        self.packing = packing;
        self
    }

    pub fn with_backend(mut self, backend: BackendChoice) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn instance_ids(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }

    /// Validates the range, the packing configuration and that the chosen
    /// backend was compiled in.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.first > self.last {
            return Err(InputError::InvalidRange {
                first: self.first,
                last: self.last,
            });
        }
        self.packing.validate()?;
        self.backend.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let batch = BatchConfig::new(3, 3);
        assert_eq!(batch.backend, BackendChoice::Cp);
        assert!(!batch.parallel);
        assert_eq!(batch.instance_ids().collect::<Vec<_>>(), vec![3]);
        assert_eq!(batch.validate().is_ok(), cfg!(feature = "cp"));
    }

    #[test]
    fn test_inverted_range() {
        let batch = BatchConfig::new(5, 2);
        assert_eq!(
            batch.validate(),
            Err(InputError::InvalidRange { first: 5, last: 2 })
        );
    }

    #[test]
    fn test_nested_validation() {
        let batch = BatchConfig::new(1, 2)
            .with_packing(PackingConfig::default().with_time_budget(Duration::ZERO));
        assert!(matches!(batch.validate(), Err(InputError::InvalidConfig(_))));
    }

    #[test]
    fn test_backend_must_be_compiled_in() {
        for choice in BackendChoice::ALL {
            let batch = BatchConfig::new(1, 1).with_backend(choice);
            match batch.validate() {
                Ok(()) => assert!(choice.is_available()),
                Err(InputError::BackendUnavailable { feature, .. }) => {
                    assert!(!choice.is_available());
                    assert_eq!(feature, choice.feature());
                }
                Err(other) => panic!("unexpected error for {choice}: {other}"),
            }
        }
    }
}
