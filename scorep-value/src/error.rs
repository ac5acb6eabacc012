use thiserror::Error;

use crate::ValueType;

/// Failure modes for operations on [`crate::Value`].
///
/// Every variant here is `NetworkRecoverable` when it crosses the wire
/// boundary (see the protocol crate's response-code mapping); on the
/// estimator side a mismatch is a programming error and is propagated as a
/// hard `Err`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("value shape mismatch: cannot combine {0:?} with {1:?}")]
    ShapeMismatch(ValueType, ValueType),

    #[error("operation not supported for value type {0:?}")]
    UnsupportedOperation(ValueType),

    #[error("truncated value payload: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("n-doubles/histogram value requires an arity but none was given")]
    MissingArity,
}
