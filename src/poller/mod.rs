//! Job submission and the bounded poll loop.
//!
//! A job moves `pending → succeeded | failed`. [`JobPoller::poll`] performs at most
//! `max_attempts` status requests, waiting `interval` between them, and gives up with
//! [`Error::PollTimeout`] rather than looping forever. The wait is raced against a
//! [`CancellationToken`] so callers can abort early.


use crate::config::{ApiConfig, ProgressConfig};
use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::transport::{Request, Transport};
use crate::types::{Event, GenerationJob, GenerationResult, JobHandle, JobId, JobStatus};
use crate::wire::{TaskRequest, TaskResponse};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

type Console = Arc<Mutex<Box<dyn Write + Send>>>;

/// Owns the submit → poll → terminal-state state machine
#[derive(Clone)]
pub struct JobPoller {
    transport: Arc<dyn Transport>,
    api: ApiConfig,
    /// None when progress display is disabled
    progress: Option<ProgressConfig>,
    console: Console,
    event_tx: broadcast::Sender<Event>,
}

impl JobPoller {
    /// Create a poller that prints progress frames to stdout
    pub fn new(
        transport: Arc<dyn Transport>,
        api: ApiConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            transport,
            api,
            progress: Some(ProgressConfig::default()),
            console: Arc::new(Mutex::new(Box::new(std::io::stdout()))),
            event_tx,
        }
    }

    /// Replace the progress display settings
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress.enabled.then_some(progress);
        self
    }

    /// Write progress frames to `writer` instead of stdout
    #[must_use]
    pub fn with_console(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console = Arc::new(Mutex::new(Box::new(writer)));
        self
    }

    /// Submit a text-to-image job
    ///
    /// Sends exactly one request; nothing is retried here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] (with the response body attached) for a non-2xx
    /// status or an unparsable response, or [`Error::Network`] if no response arrived.
    pub async fn submit(&self, prompt: &str, batch_size: u32) -> Result<JobHandle> {
        let url = self.api.tasks_url();
        let body = serde_json::to_value(TaskRequest::text_to_image(prompt, batch_size))?;

        tracing::info!(batch_size, "submitting generation job");

        let response = self
            .transport
            .send(Request::post_json(&url, body))
            .await?
            .error_for_status(&url)
            .inspect_err(|e| tracing::error!(url = %url, error = %e, "job submission rejected"))?;
        let task: TaskResponse = response.json(&url)?;

        if task.id.is_empty() {
            return Err(Error::Transport {
                url,
                status: Some(response.status),
                body: response.text(),
                message: "response carried no job id".to_string(),
            });
        }

        let created_at = task
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);
        let mut job = GenerationJob::new(JobId::new(task.id.clone()), prompt, created_at);
        job.observe(task.job_status());

        tracing::info!(job_id = %job.id, prompt = %prompt, "job created");
        self.event_tx
            .send(Event::Submitted {
                job_id: job.id.clone(),
                prompt: prompt.to_string(),
            })
            .ok();

        let poll_url = self.api.task_url(job.id.as_str());
        Ok(JobHandle { job, poll_url })
    }

    /// Rebuild a handle for a job submitted earlier, e.g. after a [`Error::PollTimeout`]
    pub fn handle_for(&self, job_id: &JobId) -> JobHandle {
        JobHandle {
            job: GenerationJob::new(job_id.clone(), "", Utc::now()),
            poll_url: self.api.task_url(job_id.as_str()),
        }
    }

    /// Poll until the job reaches a terminal status or attempts run out
    ///
    /// Each attempt performs one status request and emits one progress frame.
    /// Between attempts the loop waits `interval` unless `cancel` fires first. No
    /// wait follows the final attempt.
    ///
    /// # Errors
    ///
    /// - [`Error::JobFailed`] as soon as the service reports failure
    /// - [`Error::PollTimeout`] after `max_attempts` non-terminal responses
    /// - [`Error::Cancelled`] if `cancel` fires
    /// - [`Error::Transport`] / [`Error::Network`] if a status request fails
    /// - [`Error::Config`] if `max_attempts` is zero
    pub async fn poll(
        &self,
        handle: &mut JobHandle,
        max_attempts: u32,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        if max_attempts == 0 {
            return Err(Error::config("poll.max_attempts", "must be at least 1"));
        }

        let job_id = handle.id().clone();
        let mut reporter = self.progress.as_ref().map(|p| {
            ProgressReporter::with_style(p.message.clone(), p.style).delay(p.delay)
        });

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(self.cancelled(job_id));
            }

            // the frame renders while the request is in flight
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(job_id)),
                (task, ()) = async {
                    tokio::join!(
                        self.fetch_task(&handle.poll_url),
                        self.show_progress(reporter.as_mut()),
                    )
                } => task,
            };
            let task = fetched?;
            let status = task.job_status();
            handle.job.observe(status);

            self.event_tx
                .send(Event::PollAttempt {
                    job_id: job_id.clone(),
                    attempt,
                    max_attempts,
                    status,
                })
                .ok();

            match status {
                JobStatus::Succeeded => {
                    let result = self.result_from(task, &handle.poll_url)?;
                    tracing::info!(job_id = %job_id, attempt, assets = result.len(), "job succeeded");
                    self.event_tx
                        .send(Event::Succeeded {
                            job_id,
                            assets: result.len(),
                        })
                        .ok();
                    return Ok(result);
                }
                JobStatus::Failed => {
                    tracing::warn!(job_id = %job_id, attempt, "image generation failed");
                    self.event_tx
                        .send(Event::Failed {
                            job_id: job_id.clone(),
                        })
                        .ok();
                    return Err(Error::JobFailed { job_id });
                }
                JobStatus::Pending => {
                    tracing::debug!(job_id = %job_id, attempt, max_attempts, raw_status = %task.status, "job still running");
                    if attempt < max_attempts {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(self.cancelled(job_id)),
                            _ = tokio::time::sleep(interval) => {}
                        }
                    }
                }
            }
        }

        tracing::warn!(
            job_id = %job_id,
            poll_url = %handle.poll_url,
            attempts = max_attempts,
            "giving up on job, resume later with its id"
        );
        self.event_tx
            .send(Event::TimedOut {
                job_id: job_id.clone(),
                poll_url: handle.poll_url.clone(),
            })
            .ok();
        Err(Error::PollTimeout {
            job_id,
            poll_url: handle.poll_url.clone(),
            attempts: max_attempts,
        })
    }

    /// One-shot status check for a previously submitted job, no retry
    ///
    /// # Errors
    ///
    /// Returns [`Error::JobNotSucceeded`] (with the raw body) unless the job has
    /// succeeded, or a transport error if the request fails.
    pub async fn get_task_result(&self, job_id: &JobId) -> Result<GenerationResult> {
        let url = self.api.task_url(job_id.as_str());
        let response = self
            .transport
            .send(Request::get(&url))
            .await?
            .error_for_status(&url)?;
        let task: TaskResponse = response.json(&url)?;

        if task.job_status() != JobStatus::Succeeded {
            tracing::warn!(job_id = %job_id, status = %task.status, "could not get image data");
            return Err(Error::JobNotSucceeded {
                job_id: job_id.clone(),
                status: task.status,
                body: response.text(),
            });
        }
        self.result_from(task, &url)
    }

    async fn fetch_task(&self, url: &str) -> Result<TaskResponse> {
        let response = self
            .transport
            .send(Request::get(url))
            .await?
            .error_for_status(url)?;
        response.json(url)
    }

    /// Validate the generations of a succeeded task
    fn result_from(&self, task: TaskResponse, url: &str) -> Result<GenerationResult> {
        if task.generations.is_none() {
            return Err(Error::Transport {
                url: url.to_string(),
                status: None,
                body: String::new(),
                message: format!("task {} succeeded without generations", task.id),
            });
        }
        let result = task.into_result();
        if let Some(problem) = result.id_problem() {
            return Err(Error::Transport {
                url: url.to_string(),
                status: None,
                body: String::new(),
                message: format!("malformed result: {problem}"),
            });
        }
        Ok(result)
    }

    async fn show_progress(&self, reporter: Option<&mut ProgressReporter>) {
        let Some(reporter) = reporter else {
            return;
        };
        let mut console = self.console.lock().await;
        if let Err(e) = reporter.render(&mut *console).await {
            tracing::trace!(error = %e, "progress frame not written");
        }
    }

    fn cancelled(&self, job_id: JobId) -> Error {
        tracing::info!(job_id = %job_id, "polling cancelled");
        self.event_tx
            .send(Event::Cancelled {
                job_id: job_id.clone(),
            })
            .ok();
        Error::Cancelled { job_id }
    }
}
