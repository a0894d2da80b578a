//! Error types and handling for the Pulse library.

use thiserror::Error;

use crate::broadcast::ReadOutcome;

/// Result type alias for Pulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;

/// Main error type for the Pulse library.
#[derive(Error, Debug)]
pub enum PulseError {
    /// I/O errors from the filesystem-facing tooling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration parameter.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// A caller-supplied payload writer or reader reported failure.
    #[error("Payload callback failed: {message}")]
    Payload {
        /// Error message from the callback.
        message: String,
    },

    /// Service lifecycle errors (failed start, failed join).
    #[error("Service error: {message}")]
    Service {
        /// Error message describing the lifecycle issue.
        message: String,
    },

    /// Watchdog registry errors (capacity, duplicate names).
    #[error("Watchdog error: {message}")]
    Watchdog {
        /// Error message describing the registry issue.
        message: String,
    },

    /// Generic error for unexpected conditions that indicate a logic bug.
    #[error("Unexpected error: {message}")]
    Unexpected {
        /// Error message describing the unexpected condition.
        message: String,
    },
}

impl PulseError {
    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new payload callback error.
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    /// Create a new service lifecycle error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Create a new watchdog registry error.
    pub fn watchdog(message: impl Into<String>) -> Self {
        Self::Watchdog {
            message: message.into(),
        }
    }

    /// Create a new unexpected error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable by retrying the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Payload { .. } | Self::Io(_))
    }
}

/// A reader callback failure paired with the tear-detection result.
///
/// `BroadcastRing::read_latest` always computes whether the read window
/// overlapped a write, even when the caller-supplied reader fails. The
/// outcome travels with the error so the caller can still decide whether
/// the bytes the reader saw were trustworthy.
#[derive(Error, Debug)]
#[error("read callback failed ({outcome:?}): {source}")]
pub struct ReadError {
    /// Tear-detection result computed for the failed read.
    pub outcome: ReadOutcome,
    /// The reader callback's own error.
    #[source]
    pub source: PulseError,
}
