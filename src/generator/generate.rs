//! Submit, poll and materialize in one call.

use super::{GenerateOptions, GenerateOutput, Generation, ImageGenerator};
use crate::error::{Error, Result};
use crate::types::{GenerationJob, GenerationResult, JobId};
use tokio_util::sync::CancellationToken;

impl ImageGenerator {
    /// Generate images for `prompt` and wait for them
    ///
    /// Submits a job, polls it to a terminal state, then downloads the images if
    /// [`GenerateOptions::download`] is set. Polling stops early if
    /// [`shutdown`](Self::shutdown) is called.
    ///
    /// # Errors
    ///
    /// Any error of [`JobPoller::submit`](crate::poller::JobPoller::submit),
    /// [`JobPoller::poll`](crate::poller::JobPoller::poll) or
    /// [`Materializer::download`](crate::materializer::Materializer::download).
    /// [`Error::PollTimeout`] and [`Error::Cancelled`] carry the job id so the job
    /// can be picked up with [`resume`](Self::resume).
    pub async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<Generation> {
        let cancel = self.shutdown_token.child_token();
        self.generate_with_cancel(prompt, options, &cancel).await
    }

    /// Like [`generate`](Self::generate), with a caller-owned cancellation token
    pub async fn generate_with_cancel(
        &self,
        prompt: &str,
        options: GenerateOptions,
        cancel: &CancellationToken,
    ) -> Result<Generation> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let batch_size = options.batch_size.unwrap_or(self.config.batch_size);
        if batch_size == 0 {
            return Err(Error::config("batch_size", "must be at least 1"));
        }
        let max_attempts = options
            .max_attempts
            .unwrap_or(self.config.poll.max_attempts);

        let mut handle = self.poller.submit(prompt, batch_size).await?;
        let result = self
            .poller
            .poll(&mut handle, max_attempts, self.config.poll.interval, cancel)
            .await?;

        self.finish(handle.job, result, options).await
    }

    /// Poll a job submitted earlier, e.g. after [`Error::PollTimeout`]
    ///
    /// Uses the configured interval and `max_attempts` (or the configured default).
    pub async fn resume(
        &self,
        job_id: &JobId,
        max_attempts: Option<u32>,
    ) -> Result<GenerationResult> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let mut handle = self.poller.handle_for(job_id);
        let max_attempts = max_attempts.unwrap_or(self.config.poll.max_attempts);
        tracing::info!(job_id = %job_id, max_attempts, "resuming job");

        let cancel = self.shutdown_token.child_token();
        self.poller
            .poll(&mut handle, max_attempts, self.config.poll.interval, &cancel)
            .await
    }

    /// One-shot status check of a job submitted earlier, no polling
    ///
    /// # Errors
    ///
    /// Returns [`Error::JobNotSucceeded`] unless the job has succeeded.
    pub async fn get_task_result(&self, job_id: &JobId) -> Result<GenerationResult> {
        self.poller.get_task_result(job_id).await
    }

    async fn finish(
        &self,
        job: GenerationJob,
        result: GenerationResult,
        options: GenerateOptions,
    ) -> Result<Generation> {
        let download = match &options.download {
            Some(target) => Some(
                self.materializer
                    .download(&result, &target.dir, target.name_prefix.as_deref())
                    .await?,
            ),
            None => None,
        };

        let output = if options.links_only {
            GenerateOutput::Links(result.links())
        } else {
            GenerateOutput::Assets(result)
        };

        Ok(Generation {
            job,
            output,
            download,
        })
    }
}
