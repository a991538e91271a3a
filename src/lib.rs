//! # imagegen-dl
//!
//! Async runner for remote image-generation jobs.
//!
//! ## Design Philosophy
//!
//! imagegen-dl is designed to be:
//! - **Bounded** - Polling gives up after a fixed number of attempts, and the job id
//!   survives so the job can be resumed later
//! - **Sensible defaults** - Works out of the box with only a bearer token
//! - **Library-first** - No CLI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events instead of scraping console output
//!
//! ## Quick Start
//!
//! ```no_run
//! use imagegen_dl::{Config, DownloadOptions, GenerateOptions, ImageGenerator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = ImageGenerator::new("sess-...", Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = generator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let generation = generator
//!         .generate(
//!             "a peanut butter and jelly sandwich, studio lighting",
//!             GenerateOptions {
//!                 download: Some(DownloadOptions::new("images").with_prefix("pbj")),
//!                 ..Default::default()
//!             },
//!         )
//!         .await?;
//!
//!     if let Some(report) = generation.download {
//!         for path in report.paths() {
//!             println!("saved {}", path.display());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// High-level generation facade
pub mod generator;
/// Asset download and JPEG conversion
pub mod materializer;
/// Job submission and polling
pub mod poller;
/// Console progress frames
pub mod progress;
/// Retry logic with exponential backoff
pub mod retry;
/// HTTP transport seam
pub mod transport;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;
/// Wire format of the remote service
pub mod wire;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use generator::{DownloadOptions, GenerateOptions, GenerateOutput, Generation, ImageGenerator};
pub use progress::{ProgressReporter, ProgressStyle};
pub use transport::{HttpTransport, Transport};
pub use types::{
    Asset, DownloadReport, DownloadedFile, Event, GenerationJob, GenerationResult, JobId,
    JobStatus,
};

/// Helper function to shut a generator down on a termination signal.
///
/// Waits for a termination signal and then calls the generator's `shutdown()` method,
/// which cancels every in-flight poll loop.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use imagegen_dl::{Config, GenerateOptions, ImageGenerator, shutdown_on_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let generator = ImageGenerator::new("sess-...", Config::default())?;
///     tokio::spawn(shutdown_on_signal(generator.clone()));
///
///     generator.generate("a fox", GenerateOptions::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn shutdown_on_signal(generator: ImageGenerator) {
    wait_for_signal().await;
    generator.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
