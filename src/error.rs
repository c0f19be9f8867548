//! Error types for gradient computation

use symgrad_graph::OpId;
use thiserror::Error;

/// Failure raised by an operator's own gradient rule.
///
/// The traversal never inspects or rewraps it beyond attaching the operator
/// that raised it; [`GradError::into_rule_error`] hands the original back.
pub type RuleError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a backward traversal.
#[derive(Debug, Error)]
pub enum GradError {
    /// The rule returned a bare `None` instead of a list of input gradients.
    #[error("Gradient rule `{op_name}` ({op}) returned None instead of a list of input gradients")]
    RetNone { op: OpId, op_name: String },

    /// The rule returned a list whose length differs from the operator's input count.
    #[error(
        "Gradient rule `{op_name}` ({op}) returned {actual} input gradients, expected {expected}"
    )]
    ArityMismatch {
        op: OpId,
        op_name: String,
        expected: usize,
        actual: usize,
    },

    /// The rule itself failed.
    #[error("Gradient rule `{op_name}` ({op}) failed: {source}")]
    Rule {
        op: OpId,
        op_name: String,
        #[source]
        source: RuleError,
    },
}

impl GradError {
    /// The operator whose gradient rule caused the failure.
    pub fn op(&self) -> OpId {
        match self {
            GradError::RetNone { op, .. }
            | GradError::ArityMismatch { op, .. }
            | GradError::Rule { op, .. } => *op,
        }
    }

    /// Recovers the error raised by the rule itself, untouched.
    pub fn into_rule_error(self) -> Option<RuleError> {
        match self {
            GradError::Rule { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for gradient computation.
pub type Result<T> = std::result::Result<T, GradError>;

/// Errors produced while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting was present but could not be parsed.
    #[error("Invalid value {value:?} for {key}: expected one of {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}
