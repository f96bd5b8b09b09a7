// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Leadhound.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Leadhound ports and core operations.
#[derive(Debug, Error)]
pub enum LeadhoundError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Message source errors that are not part of the history-paging protocol.
    #[error("source error: {message}")]
    Source {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Classification service errors (API failure, malformed model output).
    #[error("classifier error: {message}")]
    Classifier {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Export sink errors.
    #[error("sink error: {message}")]
    Sink {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LeadhoundError {
    /// Shorthand for a [`LeadhoundError::Storage`] built from a message.
    pub fn storage(message: impl Into<String>) -> Self {
        LeadhoundError::Storage {
            source: message.into().into(),
        }
    }

    /// Shorthand for a [`LeadhoundError::Sink`] without an underlying source.
    pub fn sink(message: impl Into<String>) -> Self {
        LeadhoundError::Sink {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`LeadhoundError::Classifier`] without an underlying source.
    pub fn classifier(message: impl Into<String>) -> Self {
        LeadhoundError::Classifier {
            message: message.into(),
            source: None,
        }
    }
}

/// Errors raised by a [`MessageSource`](crate::traits::MessageSource) while
/// reading channel history.
///
/// These are channel-scoped: the crawler decides per variant whether to back
/// off, abort the channel, or give up, and never lets them escape to sibling
/// channels.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The platform asked us to slow down. Transient.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// The account may not read this channel's history. Fatal for the channel.
    #[error("permission denied for channel {channel_id}")]
    Forbidden { channel_id: u64 },

    /// Any other transport or protocol failure. Fatal for the channel.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SourceError {
    /// Returns true when the request may succeed if repeated later.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }
}

impl From<SourceError> for LeadhoundError {
    fn from(err: SourceError) -> Self {
        LeadhoundError::Source {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
