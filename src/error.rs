//! Error types for surface construction and per-tick updates.
//!
//! Construction-time validation fails fast with [`WaterError::InvalidParameter`];
//! nothing is ever silently clamped. Once a surface is built, the only runtime
//! failure is [`WaterError::PreconditionViolated`], raised before any vertex is
//! touched so the previous tick's mesh stays intact.

use thiserror::Error;

/// Errors produced by the water surface core and its configuration loading.
#[derive(Error, Debug)]
pub enum WaterError {
    /// A construction parameter is out of its valid domain.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending field
        name: &'static str,
        /// Human-readable constraint that was violated
        reason: String,
    },

    /// A runtime input (transform, simulated time) is not finite.
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// RON configuration could not be parsed.
    #[error("Config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WaterError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, WaterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message_names_field() {
        let err = WaterError::invalid("length", "must be > 0, got 0");
        let msg = err.to_string();
        assert!(msg.contains("length"));
        assert!(msg.contains("must be > 0"));
    }
}
