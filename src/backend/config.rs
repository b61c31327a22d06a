//! Backend configuration and selection.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Solver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Wall-clock budget for one solve call, lowering included.
    pub time_limit: Duration,
    /// Stop after finding the first feasible solution.
    pub stop_after_first: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            stop_after_first: false,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }
}

/// Which solver family attacks the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BackendChoice {
    #[default]
    Cp,
    Mip,
    Smt,
}

impl BackendChoice {
    pub const ALL: [BackendChoice; 3] = [BackendChoice::Cp, BackendChoice::Mip, BackendChoice::Smt];

    /// Cargo feature that compiles this backend's engine in.
    pub fn feature(self) -> &'static str {
        match self {
            Self::Cp => "cp",
            Self::Mip => "milp",
            Self::Smt => "smt",
        }
    }

    /// Whether the engine behind this choice was compiled in.
    pub fn is_available(self) -> bool {
        match self {
            Self::Cp => cfg!(feature = "cp"),
            Self::Mip => cfg!(feature = "milp"),
            Self::Smt => cfg!(feature = "smt"),
        }
    }

    /// Choices whose engines were compiled in.
    pub fn available() -> impl Iterator<Item = BackendChoice> {
        Self::ALL.into_iter().filter(|c| c.is_available())
    }

    /// `Ok` if the engine was compiled in.
    pub fn ensure_available(self) -> Result<(), InputError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(InputError::BackendUnavailable {
                backend: self.to_string(),
                feature: self.feature().to_string(),
            })
        }
    }
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cp => write!(f, "cp"),
            Self::Mip => write!(f, "mip"),
            Self::Smt => write!(f, "smt"),
        }
    }
}

impl FromStr for BackendChoice {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cp" => Ok(Self::Cp),
            "mip" => Ok(Self::Mip),
            "smt" => Ok(Self::Smt),
            _ => Err(InputError::UnknownBackend(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit, Duration::from_secs(60));
        assert!(!config.stop_after_first);
    }

    #[test]
    fn test_builders() {
        let config = SolverConfig::new()
            .with_time_limit(Duration::from_millis(250))
            .with_stop_after_first(true);
        assert_eq!(config.time_limit, Duration::from_millis(250));
        assert!(config.stop_after_first);
    }

    #[test]
    fn test_availability_follows_features() {
        assert_eq!(BackendChoice::Cp.is_available(), cfg!(feature = "cp"));
        assert_eq!(BackendChoice::Mip.is_available(), cfg!(feature = "milp"));
        assert_eq!(BackendChoice::Smt.is_available(), cfg!(feature = "smt"));
        for choice in BackendChoice::ALL {
            assert_eq!(choice.ensure_available().is_ok(), choice.is_available());
        }
        assert!(BackendChoice::available().all(BackendChoice::is_available));
    }

    #[test]
    #[cfg(not(feature = "milp"))]
    fn test_missing_engine_names_its_feature() {
        assert_eq!(
            BackendChoice::Mip.ensure_available(),
            Err(InputError::BackendUnavailable {
                backend: "mip".into(),
                feature: "milp".into(),
            })
        );
    }

    #[test]
    fn test_backend_choice_round_trip() {
        for choice in BackendChoice::ALL {
            assert_eq!(choice.to_string().parse::<BackendChoice>(), Ok(choice));
        }
        assert_eq!(" MIP ".parse::<BackendChoice>(), Ok(BackendChoice::Mip));
        assert_eq!(
            "gurobi".parse::<BackendChoice>(),
            Err(InputError::UnknownBackend("gurobi".into()))
        );
    }
}
