//! Error types for imagegen-dl
//!
//! This module provides the error taxonomy for the whole job lifecycle:
//! - Transport failures at submission and status polling (never retried by the poller)
//! - Terminal job outcomes (failed, not yet succeeded, attempts exhausted, cancelled)
//! - Filesystem failures while materializing downloads
//! - Per-file conversion failures (collected into a report rather than propagated)
//! - Configuration errors (invalid settings, unsupported progress style)

use std::path::PathBuf;
use thiserror::Error;

use crate::types::JobId;

/// Result type alias for imagegen-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for imagegen-dl
///
/// Each variant carries enough context (job id, URL, path) for a caller to retry
/// or resume the operation manually.
#[derive(Debug, Error)]
pub enum Error {
    /// Request could not be sent, returned a non-success status, or returned a body
    /// that could not be understood
    #[error("transport error for {url}: {message}")]
    Transport {
        /// The URL of the failed request
        url: String,
        /// HTTP status code, if a response was received
        status: Option<u16>,
        /// Raw response body for diagnostics (empty if no response was received)
        body: String,
        /// Human-readable description of the failure
        message: String,
    },

    /// The service reported that the job failed
    #[error("job {job_id} failed")]
    JobFailed {
        /// The job that failed
        job_id: JobId,
    },

    /// One-shot status check found the job in a non-succeeded state
    #[error("job {job_id} has not succeeded (status: {status})")]
    JobNotSucceeded {
        /// The job that was checked
        job_id: JobId,
        /// The status string reported by the service
        status: String,
        /// Raw response body for diagnostics
        body: String,
    },

    /// Polling gave up after exhausting its attempts; the job may still finish remotely
    #[error("job {job_id} did not finish after {attempts} attempts (resume via {poll_url})")]
    PollTimeout {
        /// The job that was being polled
        job_id: JobId,
        /// Status URL that can be used to resume polling later
        poll_url: String,
        /// Number of status requests performed
        attempts: u32,
    },

    /// Polling was aborted by a cancellation token
    #[error("polling cancelled for job {job_id}")]
    Cancelled {
        /// The job that was being polled
        job_id: JobId,
    },

    /// Directory or file I/O failed
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path being read, written or created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A downloaded file could not be converted
    #[error("conversion failed for {path}: {reason}")]
    Conversion {
        /// The raw file that failed to convert
        path: PathBuf,
        /// The reason conversion failed
        reason: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "poll.max_attempts")
        key: Option<String>,
    },

    /// The generator was shut down and accepts no new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Network error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a filesystem error for the given path
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Build a configuration error tied to a config key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether the job behind this error can be picked up again later
    ///
    /// True for [`Error::PollTimeout`] and [`Error::Cancelled`]: the job was submitted
    /// and may still complete remotely.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::PollTimeout { .. } | Self::Cancelled { .. })
    }

    /// Job id associated with this error, if any
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::JobFailed { job_id }
            | Self::JobNotSucceeded { job_id, .. }
            | Self::PollTimeout { job_id, .. }
            | Self::Cancelled { job_id } => Some(job_id),
            _ => None,
        }
    }

    /// HTTP status code attached to a transport error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
