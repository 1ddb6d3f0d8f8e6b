//! Error types for civil-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CivilError {
    #[error("invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("invalid day: {day} for {year:04}-{month:02}")]
    InvalidDay { year: i64, month: u32, day: u32 },

    #[error("invalid hour: {0} (expected 0-23)")]
    InvalidHour(u32),

    #[error("invalid minute: {0} (expected 0-59)")]
    InvalidMinute(u32),

    #[error("invalid second: {0} (expected 0-59)")]
    InvalidSecond(u32),

    #[error("invalid nanosecond: {0} (expected < 1,000,000,000)")]
    InvalidNanosecond(u32),

    #[error("datetime out of representable range: {0}")]
    OutOfRange(String),

    #[error("ambiguous or nonexistent local time: {0}")]
    AmbiguousLocalTime(String),
}

pub type Result<T> = std::result::Result<T, CivilError>;
