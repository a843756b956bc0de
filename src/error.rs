//! Error types for native built-in operations
//!
//! `JsResult` is the operation result protocol: every operation returns either
//! the produced value or the error it raised. Propagating an error is `?`;
//! swallowing one is discarding the `Err`.

use thiserror::Error;

use crate::value::JsValue;

/// Result of any operation that may raise a script-level exception
pub type JsResult<T> = Result<T, JsError>;

/// A raised script-level exception
#[derive(Debug, Clone, Error)]
pub enum JsError {
    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// A value thrown by script code (a getter, an iterator, a constructor)
    #[error("Uncaught {0:?}")]
    Thrown(JsValue),

    /// A broken runtime invariant, e.g. a reference that outlived its root
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JsError {
    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    /// Wrap a value thrown by script code
    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown(value)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, JsError::TypeError { .. })
    }

    /// Message carried by a TypeError or RangeError
    pub fn message(&self) -> Option<&str> {
        match self {
            JsError::TypeError { message } | JsError::RangeError { message } => Some(message),
            JsError::Thrown(_) | JsError::Internal(_) => None,
        }
    }

    /// The value a script `catch` clause would bind for this error.
    ///
    /// Runtime-raised errors surface as their formatted message string.
    pub fn to_value(&self) -> JsValue {
        match self {
            JsError::Thrown(value) => value.clone(),
            other => JsValue::from(other.to_string()),
        }
    }
}
