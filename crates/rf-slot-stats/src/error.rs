//! Error types for round statistics

use thiserror::Error;

/// Aggregation error type
///
/// Every variant is fatal for the call that produced it: the aggregate is left
/// in whatever state it reached and the run should be stopped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Two aggregates built from different session configurations were merged
    #[error("Configuration mismatch in {what}: {left} != {right}")]
    ConfigMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// A payout or grid referenced something not configured for the session
    #[error("Unconfigured {what}: {id}")]
    UnconfiguredReference { what: &'static str, id: i64 },

    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl StatsError {
    pub(crate) fn mismatch(what: &'static str, left: usize, right: usize) -> Self {
        Self::ConfigMismatch { what, left, right }
    }

    pub(crate) fn unconfigured(what: &'static str, id: impl Into<i64>) -> Self {
        Self::UnconfiguredReference {
            what,
            id: id.into(),
        }
    }

    /// Fails with a `ConfigMismatch` unless both sides agree
    pub(crate) fn check(what: &'static str, left: usize, right: usize) -> StatsResult<()> {
        if left == right {
            Ok(())
        } else {
            Err(Self::mismatch(what, left, right))
        }
    }
}

/// Result type alias
pub type StatsResult<T> = Result<T, StatsError>;
