//! Configuration types for imagegen-dl

use crate::error::{Error, Result};
use crate::progress::ProgressStyle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote service endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the labs API (default: "https://labs.openai.com/api/labs")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Id of the saved collection listed by `list_saved`
    #[serde(default = "default_collection_id")]
    pub collection_id: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection_id: default_collection_id(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Task submission endpoint
    pub fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url.trim_end_matches('/'))
    }

    /// Status endpoint of one task
    pub fn task_url(&self, task_id: &str) -> String {
        format!("{}/tasks/{}", self.base_url.trim_end_matches('/'), task_id)
    }

    /// One page of the saved collection
    pub fn collection_url(&self, page: u32, limit: u32) -> Result<String> {
        let raw = format!(
            "{}/collections/{}/generations",
            self.base_url.trim_end_matches('/'),
            self.collection_id
        );
        let mut url = url::Url::parse(&raw)
            .map_err(|e| Error::config("api.base_url", format!("invalid URL '{raw}': {e}")))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        Ok(url.into())
    }
}

/// Poll loop settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of status requests before giving up (default: 10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait between status requests (default: 3 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval: default_poll_interval(),
        }
    }
}

/// Console progress display settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Print a progress frame on every poll attempt (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Message shown in front of the animation
    #[serde(default = "default_progress_message")]
    pub message: String,

    /// Animation style (default: counter)
    #[serde(default)]
    pub style: ProgressStyle,

    /// How long each frame stays on screen (default: 300 ms)
    #[serde(default = "default_progress_delay", with = "millis_serde")]
    pub delay: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            message: default_progress_message(),
            style: ProgressStyle::default(),
            delay: default_progress_delay(),
        }
    }
}

/// Download and conversion settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Maximum concurrent asset transfers and conversions (default: 6)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Extension of the raw files as served (default: "webp")
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent(),
            source_extension: default_source_extension(),
        }
    }
}

/// Retry configuration for asset transfers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for [`ImageGenerator`](crate::ImageGenerator)
///
/// Every field has a default, so `Config::default()` talks to the public labs API
/// with the original polling cadence (10 attempts, 3 seconds apart).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints and request timeout
    #[serde(default)]
    pub api: ApiConfig,

    /// Images requested per job (default: 6)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Poll loop settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Console progress display
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Download and conversion settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Retry policy for asset transfers (submission and polling are never retried)
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            batch_size: default_batch_size(),
            poll: PollConfig::default(),
            progress: ProgressConfig::default(),
            download: DownloadConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Check settings that would make the generator unusable
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(Error::config(
                "api.base_url",
                format!("'{}' is not a valid URL", self.api.base_url),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size", "must be at least 1"));
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::config("poll.max_attempts", "must be at least 1"));
        }
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "download.max_concurrent_downloads",
                "must be at least 1",
            ));
        }
        let ext = self.download.source_extension.as_str();
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(Error::config(
                "download.source_extension",
                format!("'{ext}' is not a bare file extension"),
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                "must be at least 1.0",
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://labs.openai.com/api/labs".to_string()
}

fn default_collection_id() -> String {
    "collection-9t0G6wj87xFVvgsdNQkjwL6W".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_batch_size() -> u32 {
    6
}

fn default_max_attempts() -> u32 {
    10
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_progress_message() -> String {
    "Generating images".to_string()
}

fn default_progress_delay() -> Duration {
    Duration::from_millis(300)
}

fn default_max_concurrent() -> usize {
    6
}

fn default_source_extension() -> String {
    "webp".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
