//! Error types for scheduler and pipeline operations.

use thiserror::Error;

/// Errors produced while admitting, executing or publishing remesh attempts.
///
/// A superseded attempt is not an error; see [`crate::core::AttemptOutcome::Superseded`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemeshError {
    /// Remote retrieval or decompression of the source volume failed.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// The external cache store rejected a read or write.
    #[error("cache store error: {0}")]
    CacheStore(String),
    /// The mesh producer reported an error or produced unusable output.
    #[error("generation failed: {0}")]
    Generation(String),
    /// Writing a mesh blob to durable storage failed.
    #[error("publish failed: {0}")]
    Publish(String),
    /// The completion callback failed.
    #[error("notify failed: {0}")]
    Notify(String),
    /// A submitted request broke a data-model invariant.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Scheduler configuration is unusable.
    #[error("config error: {0}")]
    Config(String),
    /// Queue backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl RemeshError {
    /// Whether an attempt failing with this error puts its request back on the queue.
    #[must_use]
    pub const fn is_requeueable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Generation(_) | Self::Publish(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
