//! Error types for CodeAnvil

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse event feed: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid activity window: {0}")]
    InvalidWindow(String),

    #[error("No commits in the requested period")]
    EmptySeries,

    #[error("Insufficient data: need at least {required} active days, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Daily series is not strictly increasing at position {position}: {previous} then {current}")]
    NonIncreasingDates {
        position: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Daily series has a zero commit count on {0}")]
    ZeroCount(NaiveDate),
}
