//! Engine error kinds.
//!
//! Data shortfalls inside a single indicator are handled by omission and never
//! reach this type. Everything here is a precondition the caller violated.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Zero usable bars, or a symbol/benchmark alignment with no shared dates.
    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    /// Malformed caller-supplied parameter or configuration value.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Stop price equal to the entry price (zero risk per share).
    #[error("invalid stop: stop price equals entry price {price}")]
    InvalidStop { price: f64 },
}

impl AnalysisError {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
