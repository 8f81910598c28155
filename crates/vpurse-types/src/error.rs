//! Error types for VPurse
//!
//! Every failure is returned to the controller. Nothing is retried: mint and
//! burn have real effects, so a blind retry could double-apply them.

use std::fmt;

use thiserror::Error;

/// Result type for VPurse operations
pub type Result<T> = std::result::Result<T, VpurseError>;

/// VPurse error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VpurseError {
    /// Undecodable payload, missing or unknown discriminator, missing or invalid field
    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// A ledger call returned an error; the operation sequence was aborted at that step
    #[error("Ledger operation {operation} failed: {reason}")]
    LedgerOperationFailed { operation: String, reason: String },

    /// Serialization of an outbound message failed
    #[error("Encoding failed: {reason}")]
    EncodingFailed { reason: String },

    /// The controller channel rejected an outbound call
    #[error("Controller call failed: {reason}")]
    ControllerCallFailed { reason: String },
}

impl VpurseError {
    /// Create a malformed message error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Create a malformed message error naming the offending field
    pub fn invalid_field(field: &str, reason: impl fmt::Display) -> Self {
        Self::MalformedMessage {
            reason: format!("invalid {}: {}", field, reason),
        }
    }

    /// Create a ledger failure for the named operation
    pub fn ledger(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::LedgerOperationFailed {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an encoding error
    pub fn encoding(reason: impl fmt::Display) -> Self {
        Self::EncodingFailed {
            reason: reason.to_string(),
        }
    }

    /// Create a controller channel error
    pub fn controller(reason: impl Into<String>) -> Self {
        Self::ControllerCallFailed {
            reason: reason.into(),
        }
    }

    /// Whether the caller may blindly retry. Never: ledger mutations are not idempotent.
    pub fn is_retriable(&self) -> bool {
        false
    }

    /// Get an error code for controller-facing responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedMessage { .. } => "MALFORMED_MESSAGE",
            Self::LedgerOperationFailed { .. } => "LEDGER_OPERATION_FAILED",
            Self::EncodingFailed { .. } => "ENCODING_FAILED",
            Self::ControllerCallFailed { .. } => "CONTROLLER_CALL_FAILED",
        }
    }
}
