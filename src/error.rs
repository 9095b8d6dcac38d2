//! Validation errors raised while loading and classifying customer data

use thiserror::Error;

/// Input errors that abort a segmentation run.
///
/// Row numbers are 1-based and count data rows only (the header is not a row).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RfmError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: malformed date '{value}' (expected DD/MM/YY or DD/MM/YYYY)")]
    MalformedDate { row: usize, value: String },

    #[error("row {row}: missing customer identifier")]
    MissingCustomer { row: usize },

    #[error("row {row}: missing order identifier")]
    MissingOrder { row: usize },

    #[error("row {row}: invalid amount '{value}'")]
    InvalidAmount { row: usize, value: String },

    #[error("quartile score {0} is outside 1..=4")]
    InvalidQuartile(u8),

    #[error("invalid RFM triplet '{0}': expected three digits in 1..=4")]
    InvalidTriplet(String),
}
