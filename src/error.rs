//! Error types for loan and property configuration

use thiserror::Error;

/// Rejected input. Raised before any computation runs; the caller can
/// correct the offending field and try again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} must be a positive finite amount, got {value}")]
    NonPositiveAmount { field: &'static str, value: f64 },

    #[error("{field} must be a non-negative finite amount, got {value}")]
    NegativeAmount { field: &'static str, value: f64 },

    #[error(
        "LTV {:.1}% exceeds maximum {:.0}% allowed for mortgage bonds",
        ltv * 100.0,
        max * 100.0
    )]
    LtvTooHigh { ltv: f64, max: f64 },

    #[error("term_years must be between 1 and {max}, got {term_years}")]
    InvalidTerm { term_years: u32, max: u32 },

    #[error("io_years ({io_years}) must be less than term_years ({term_years})")]
    InvalidInterestOnly { io_years: u32, term_years: u32 },

    #[error("unknown loan product {0:?}")]
    UnknownProduct(String),

    #[error("unknown institution {0:?}")]
    UnknownInstitution(String),

    #[error("market price must be a positive percentage of face value, got {0}")]
    InvalidMarketPrice(f64),

    #[error("{field} must be between 0 and 1, got {value}")]
    InvalidRate { field: &'static str, value: f64 },
}
