//! Error types for availability-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid slot label: {0}")]
    InvalidSlot(String),

    #[error("Date out of range: week starting {0} runs past the last supported date")]
    DateOutOfRange(NaiveDate),

    #[error("Invalid event: {0}")]
    Invalid(ValidationErrors),

    #[error("Repository error: {0}")]
    Repository(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
