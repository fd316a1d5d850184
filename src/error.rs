use chrono::NaiveDate;
use thiserror::Error;

/// Problems with a run configuration, detected before anything is generated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("start date {start} must be before end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("patient age bounds {min}..={max} are invalid")]
    InvalidAgeRange { min: u32, max: u32 },

    #[error("requested {requested} payers but only {available} payer profiles exist")]
    TooManyPayers { requested: usize, available: usize },

    #[error("denial reason category shares sum to {sum:.4}, expected 1.0")]
    SharesNotNormalized { sum: f64 },

    #[error("{field} = {value} is outside [0, 1]")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    #[error("{field} = {value} must be a finite, non-negative number")]
    InvalidMagnitude { field: &'static str, value: f64 },

    #[error("probability clamp [{min}, {max}] is inverted")]
    InvertedClamp { min: f64, max: f64 },

    #[error("denial reason code `{0}` is not in the reason catalog")]
    UnknownReasonCode(String),

    #[error("timely filing fallback code list is empty")]
    EmptyFallbackCodes,

    #[error("at least one output format is required")]
    NoOutputFormats,

    #[error("invalid sampling weights for {what}: {reason}")]
    InvalidWeights { what: &'static str, reason: String },
}
