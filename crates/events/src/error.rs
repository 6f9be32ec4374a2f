//! Event pipeline error types.

use serde::Serialize;
use thiserror::Error;

/// Result type for event pipeline operations.
pub type EventResult<T> = Result<T, EventError>;

/// One entry the bus rejected out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    /// Id of the envelope whose entry was rejected.
    pub envelope_id: String,
    /// Transport-level error code.
    pub code: String,
    /// Transport-level error message.
    pub message: String,
}

/// Error type for publishing and delivery.
#[derive(Debug, Error)]
pub enum EventError {
    /// The envelope is not fit for the wire (empty source or type).
    #[error("Invalid envelope: {reason}")]
    InvalidEnvelope { reason: String },

    /// The serialized entry exceeds the transport's per-entry limit.
    ///
    /// Raised before the transport is called; the detail is never truncated.
    #[error("Entry for envelope {envelope_id} is {size} bytes, exceeding the {limit} byte limit")]
    OversizedEntry {
        envelope_id: String,
        size: usize,
        limit: usize,
    },

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The transport call failed as a whole. Safe to retry.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The bus rejected some entries of a batch.
    ///
    /// Accepted siblings stay on the bus; the rejected entries are listed so
    /// the caller can resubmit exactly those.
    #[error("Partial publish failure: {} of {attempted} entries rejected", .failed.len())]
    PartialPublish {
        attempted: usize,
        failed: Vec<FailedEntry>,
    },

    /// A publish wait was cut short by the caller's deadline.
    #[error("Publish timeout")]
    Timeout,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EventError {
    /// Creates an invalid-envelope error.
    pub fn invalid_envelope(reason: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            reason: reason.into(),
        }
    }

    /// Creates an oversized-entry error.
    pub fn oversized(envelope_id: impl Into<String>, size: usize, limit: usize) -> Self {
        Self::OversizedEntry {
            envelope_id: envelope_id.into(),
            size,
            limit,
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a partial-publish error.
    pub fn partial(attempted: usize, failed: Vec<FailedEntry>) -> Self {
        Self::PartialPublish { attempted, failed }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout)
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidEnvelope { .. } => 400,
            Self::OversizedEntry { .. } => 413,
            Self::PartialPublish { .. } => 502,
            Self::Transport { .. } => 503,
            Self::Timeout => 504,
            Self::SerializationError(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::SerializationError(err.to_string())
    }
}
