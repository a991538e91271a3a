//! Core types for imagegen-dl

use crate::utils::is_plain_stem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Opaque identifier of a remote generation job
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new JobId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job status as seen by the poller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted or still running
    Pending,
    /// Finished with generated assets
    Succeeded,
    /// Finished without assets
    Failed,
}

impl JobStatus {
    /// Map a status string reported by the service
    ///
    /// Anything other than `succeeded` or `failed` means the job is still running.
    pub fn from_remote(status: &str) -> Self {
        match status {
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    /// Whether polling stops at this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A submitted generation job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Remote job id
    pub id: JobId,
    /// Caption the job was submitted with (empty when resumed from a bare id)
    pub prompt: String,
    /// Last observed status
    pub status: JobStatus,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl GenerationJob {
    /// Create a pending job record
    pub fn new(id: JobId, prompt: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            status: JobStatus::Pending,
            created_at,
        }
    }

    /// Record a newly observed status
    ///
    /// Terminal statuses are sticky: once a job has succeeded or failed, later
    /// observations are ignored and `false` is returned.
    pub fn observe(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }
}

/// Handle to a submitted job, consumed by the poll loop
#[derive(Clone, Debug)]
pub struct JobHandle {
    /// The tracked job
    pub job: GenerationJob,
    /// Status URL for this job
    pub poll_url: String,
}

impl JobHandle {
    /// The job id
    pub fn id(&self) -> &JobId {
        &self.job.id
    }
}

/// One generated image reference returned by the service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset id (unique within one result)
    pub id: String,
    /// Remote URL of the generated image
    pub image_url: String,
}

/// Ordered list of assets produced by a succeeded job
///
/// Order is the order returned by the service and is preserved everywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Assets in service order
    pub assets: Vec<Asset>,
}

impl GenerationResult {
    /// Wrap an asset list
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the result holds no assets
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// First asset, if any
    pub fn primary(&self) -> Option<&Asset> {
        self.assets.first()
    }

    /// Remote image URLs in order
    pub fn links(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.image_url.clone()).collect()
    }

    /// First asset id that cannot name a local file or appears more than once
    pub(crate) fn id_problem(&self) -> Option<String> {
        let mut seen = HashSet::with_capacity(self.assets.len());
        self.assets.iter().find_map(|a| {
            if !is_plain_stem(&a.id) {
                Some(format!("asset id {:?} is not a plain file name", a.id))
            } else if !seen.insert(a.id.as_str()) {
                Some(format!("duplicate asset id {}", a.id))
            } else {
                None
            }
        })
    }
}

/// A downloaded and converted asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedFile {
    /// Id of the source asset
    pub asset_id: String,
    /// Final local path
    pub local_path: PathBuf,
    /// Extension the asset was transferred as (e.g. "webp")
    pub source_format: String,
    /// Extension the asset was converted to ("jpg")
    pub dest_format: String,
}

/// A downloaded asset whose conversion failed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedConversion {
    /// Id of the source asset
    pub asset_id: String,
    /// File stem used for the asset
    pub stem: String,
    /// Raw file left in place
    pub raw_path: PathBuf,
    /// Why conversion failed
    pub reason: String,
}

/// Outcome of one materialization call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReport {
    /// Absolute destination directory
    pub directory: PathBuf,
    /// Converted files in input order
    pub files: Vec<DownloadedFile>,
    /// Assets that downloaded but failed to convert, in input order
    pub failed: Vec<FailedConversion>,
}

impl DownloadReport {
    /// Local paths of the converted files
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.local_path.clone()).collect()
    }

    /// Stems of the files that failed to convert
    pub fn failed_stems(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.stem.as_str()).collect()
    }

    /// True if every asset was converted
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Event emitted during the job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted by the service
    Submitted {
        /// Job id
        job_id: JobId,
        /// Caption submitted
        prompt: String,
    },

    /// One status request completed
    PollAttempt {
        /// Job id
        job_id: JobId,
        /// 1-based attempt number
        attempt: u32,
        /// Attempt budget
        max_attempts: u32,
        /// Status observed
        status: JobStatus,
    },

    /// Job finished with assets
    Succeeded {
        /// Job id
        job_id: JobId,
        /// Number of assets produced
        assets: usize,
    },

    /// Job reported as failed by the service
    Failed {
        /// Job id
        job_id: JobId,
    },

    /// Poll attempts exhausted
    TimedOut {
        /// Job id
        job_id: JobId,
        /// Status URL to resume with
        poll_url: String,
    },

    /// Poll loop cancelled
    Cancelled {
        /// Job id
        job_id: JobId,
    },

    /// Raw asset written to disk
    AssetDownloaded {
        /// Asset id
        asset_id: String,
        /// Raw file path
        path: PathBuf,
    },

    /// Asset converted to its final format
    AssetConverted {
        /// Asset id
        asset_id: String,
        /// Converted file path
        path: PathBuf,
    },

    /// Asset conversion failed (raw file kept)
    ConversionFailed {
        /// Asset id
        asset_id: String,
        /// Error message
        error: String,
    },
}
