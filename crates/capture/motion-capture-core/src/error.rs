//! Error types for pose capture, playback and serialization

use std::num::{ParseFloatError, ParseIntError};

/// Error type shared by every component of the capture pipeline
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PoseError {
    /// Missing or invalid host bindings (no pose handler, non-humanoid avatar, bad config)
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Malformed argument rejected synchronously
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// CSV line could not be decoded
    #[error(transparent)]
    Format(#[from] FormatError),

    /// File could not be read or written
    #[error("IO error: {reason}")]
    Io { reason: String },

    /// JSON (de)serialization failure
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// A background load is already running
    #[error("A load is already in progress")]
    LoadInProgress,

    /// The host capability refused to produce or accept a pose this tick
    #[error("Host unavailable: {reason}")]
    HostUnavailable { reason: String },
}

/// Parse failure of a single CSV pose line.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Fewer fields than the fixed prefix (root, body, muscles, index, time)
    #[error("expected at least {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// One field failed numeric parsing
    #[error("field {position} ('{text}') is not a valid number")]
    Field {
        position: usize,
        text: String,
        #[source]
        source: FieldParseError,
    },
}

/// The original numeric parse error behind a [`FormatError::Field`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FieldParseError {
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    #[error(transparent)]
    Int(#[from] ParseIntError),
}

impl PoseError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn host_unavailable(reason: impl Into<String>) -> Self {
        Self::HostUnavailable {
            reason: reason.into(),
        }
    }

    /// Errors after which the session can keep going (drop the frame or line, retry the save).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::Io { .. } | Self::LoadInProgress | Self::HostUnavailable { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::InvalidArgument { .. } => "validation",
            Self::Format(_) => "format",
            Self::Io { .. } | Self::LoadInProgress => "io",
            Self::Serialization { .. } => "serialization",
            Self::HostUnavailable { .. } => "host",
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PoseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
