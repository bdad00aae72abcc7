//! Error taxonomy of the checking engine.

use crate::levels::LevelsError;
use thiserror::Error;

/// A rate could not be computed this cycle. Expected and recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GetRateError {
    #[error("Initialized: no previous value for {0:?}")]
    Initialized(String),
    #[error("Value overflow for {0:?}")]
    Overflow(String),
}

/// Skip the whole check invocation this cycle.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct IgnoreResultsError(pub String);

impl IgnoreResultsError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Everything a check function may fail with.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Ignore(#[from] IgnoreResultsError),
    #[error(transparent)]
    Rate(#[from] GetRateError),
    #[error(transparent)]
    Levels(#[from] LevelsError),
    /// A genuine bug or crash in a check function.
    #[error("{0}")]
    Plugin(String),
}

impl CheckError {
    pub fn plugin(msg: impl Into<String>) -> Self {
        CheckError::Plugin(msg.into())
    }
}
