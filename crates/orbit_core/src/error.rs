//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the core returns [`SimError`]. The variants
//! map directly onto the kinds a caller needs to distinguish: bad input,
//! missing entity, a state rule that forbids the operation right now, a
//! race with another mutation, malformed static data, or a broken
//! invariant inside the solver itself.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("config error at {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SimError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
