//! Error types for condition parsing and binding.

use thiserror::Error;

/// Condition diagnostics. Never fatal: the gate reports them and treats the
/// affected candidate as unsuitable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// The expression could not be parsed.
    #[error("unparsable condition expression {expression:?}: {reason}")]
    Parse { expression: String, reason: String },

    /// No test is registered under the key.
    #[error("unknown condition test {key:?}")]
    UnknownTest { key: String },
}

/// Result type for condition operations.
pub type ConditionResult<T> = Result<T, ConditionError>;
