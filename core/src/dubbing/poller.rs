use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{JobOutcome, JobStatusSource, RemoteStatus};
use crate::config::PollerConfig;
use crate::VoxError;

/// Bounded wait on a remote job.
///
/// Queries are sequential and spaced by the fixed interval. Neither a sleep
/// nor a query is allowed to run past `max_wait`, so the call returns within
/// `max_wait` plus one query timeout.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollerConfig,
}

impl JobPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll with the configured default bound.
    pub async fn wait<S>(
        &self,
        source: &S,
        job_id: &str,
        api_key: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> JobOutcome
    where
        S: JobStatusSource + ?Sized,
    {
        self.wait_for_completion(source, job_id, api_key, self.config.max_wait, cancel)
            .await
    }

    /// Query `job_id` until it reaches a terminal status, `max_wait` elapses,
    /// or `cancel` fires. `api_key` is forwarded to every status query.
    pub async fn wait_for_completion<S>(
        &self,
        source: &S,
        job_id: &str,
        api_key: Option<&str>,
        max_wait: Duration,
        cancel: Option<&CancellationToken>,
    ) -> JobOutcome
    where
        S: JobStatusSource + ?Sized,
    {
        let started = Instant::now();
        let mut queries = 0u32;

        while let Some(remaining) = max_wait.checked_sub(started.elapsed()).filter(|r| !r.is_zero()) {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return cancelled(job_id, queries);
            }

            // a query may not outlive the overall budget
            let limit = self.config.query_timeout.min(remaining);
            queries += 1;
            let result = match timeout(limit, source.query_job_status(job_id, api_key)).await {
                Ok(result) => result,
                Err(_) if limit < self.config.query_timeout => break,
                Err(_) => Err(VoxError::Transport(format!(
                    "status query timed out after {:?}",
                    self.config.query_timeout
                ))),
            };

            let status = match result {
                Ok(status) => status,
                Err(error) => {
                    warn!(target: "dubbing", job_id = %job_id, error = %error, "Status query failed");
                    return JobOutcome::TransportError {
                        job_id: job_id.to_string(),
                        error,
                    };
                }
            };

            debug!(target: "dubbing", job_id = %job_id, status = %status.status, query = queries, "Job status");

            match status.remote_status() {
                RemoteStatus::Processing => {}
                RemoteStatus::Complete => {
                    info!(target: "dubbing", job_id = %job_id, queries, "Job complete");
                    return JobOutcome::Complete {
                        job_id: job_id.to_string(),
                        status: status.status,
                    };
                }
                RemoteStatus::Other(other) => {
                    info!(target: "dubbing", job_id = %job_id, status = %other, "Job ended with unrecognised status");
                    return JobOutcome::Other {
                        job_id: job_id.to_string(),
                        status: other,
                    };
                }
            }

            let pause = self
                .config
                .interval
                .min(max_wait.saturating_sub(started.elapsed()));
            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = sleep(pause) => {}
                        _ = token.cancelled() => return cancelled(job_id, queries),
                    }
                }
                None => sleep(pause).await,
            }
        }

        warn!(target: "dubbing", job_id = %job_id, max_wait_secs = max_wait.as_secs(), queries, "Job did not finish in time");
        JobOutcome::Timeout {
            job_id: job_id.to_string(),
            max_wait,
        }
    }
}

fn cancelled(job_id: &str, queries: u32) -> JobOutcome {
    info!(target: "dubbing", job_id = %job_id, queries, "Wait cancelled");
    JobOutcome::Cancelled {
        job_id: job_id.to_string(),
    }
}
