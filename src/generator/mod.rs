//! High-level generation facade split into focused submodules.
//!
//! The `ImageGenerator` struct and its methods are organized by domain:
//! - [`generate`] - Submit, poll and optionally download in one call
//! - [`saved`] - Paginated listing of the saved collection
//! - [`lifecycle`] - Shutdown coordination

mod generate;
mod lifecycle;
mod saved;


use crate::config::Config;
use crate::error::Result;
use crate::materializer::Materializer;
use crate::poller::JobPoller;
use crate::transport::{HttpTransport, Transport};
use crate::types::{DownloadReport, Event, GenerationJob, GenerationResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Where and how to save the images of a generation
#[derive(Clone, Debug)]
pub struct DownloadOptions {
    /// Destination directory (relative paths and `~` are resolved)
    pub dir: PathBuf,
    /// Name files `<prefix>1.jpg`, `<prefix>2.jpg`, ... instead of by asset id
    pub name_prefix: Option<String>,
}

impl DownloadOptions {
    /// Save into `dir`, naming files by asset id
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            name_prefix: None,
        }
    }

    /// Name files by position with the given prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }
}

/// Per-call options of [`ImageGenerator::generate`]
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    /// Status requests before giving up (default: `config.poll.max_attempts`)
    pub max_attempts: Option<u32>,
    /// Images to request (default: `config.batch_size`)
    pub batch_size: Option<u32>,
    /// Download and convert the images when set
    pub download: Option<DownloadOptions>,
    /// Return only the image URLs instead of the full asset list
    pub links_only: bool,
}

/// What a generation call hands back
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateOutput {
    /// Full asset list in service order
    Assets(GenerationResult),
    /// Image URLs in service order
    Links(Vec<String>),
}

/// Outcome of a successful [`ImageGenerator::generate`] call
#[derive(Clone, Debug)]
pub struct Generation {
    /// The job, in its terminal state
    pub job: GenerationJob,
    /// Assets or links, depending on [`GenerateOptions::links_only`]
    pub output: GenerateOutput,
    /// Present when a download was requested
    pub download: Option<DownloadReport>,
}

/// Main generator instance (cloneable, clones share the event channel and shutdown token)
#[derive(Clone)]
pub struct ImageGenerator {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Transport used for requests outside the poll loop (saved collection)
    pub(crate) transport: Arc<dyn Transport>,
    /// Submit and poll state machine
    pub(crate) poller: JobPoller,
    /// Download and conversion
    pub(crate) materializer: Materializer,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Parent of every poll loop's cancellation token
    pub(crate) shutdown_token: CancellationToken,
}

impl ImageGenerator {
    /// Create a generator that talks HTTP and authenticates with `token`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for invalid settings, or a
    /// network error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(token, config.api.request_timeout)?;
        Self::with_transport(Arc::new(transport), config)
    }

    /// Create a generator on top of any [`Transport`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for invalid settings.
    pub fn with_transport(transport: Arc<dyn Transport>, config: Config) -> Result<Self> {
        config.validate()?;

        // Buffer size of 1000 events; slow subscribers see `Lagged` rather than blocking
        let (event_tx, _rx) = broadcast::channel(1000);

        let poller = JobPoller::new(transport.clone(), config.api.clone(), event_tx.clone())
            .with_progress(config.progress.clone());
        let materializer = Materializer::new(
            transport.clone(),
            config.download.clone(),
            config.retry.clone(),
            event_tx.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            transport,
            poller,
            materializer,
            event_tx,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Write progress frames to `writer` instead of stdout
    #[must_use]
    pub fn with_console(mut self, writer: impl Write + Send + 'static) -> Self {
        self.poller = self.poller.with_console(writer);
        self
    }

    /// Subscribe to lifecycle events
    ///
    /// Each subscriber receives every event sent after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this generator was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Download and convert the assets of an already available result
    ///
    /// See [`Materializer::download`] for naming and failure semantics.
    pub async fn download(
        &self,
        result: &GenerationResult,
        dir: &Path,
        name_prefix: Option<&str>,
    ) -> Result<DownloadReport> {
        self.materializer.download(result, dir, name_prefix).await
    }
}
