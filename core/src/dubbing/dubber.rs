use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{DubbingRequest, JobCreator, JobOutcome, JobPoller, JobStatusSource};
use crate::Result;

/// What a dubbing call hands back to the node
#[derive(Debug)]
pub enum DubbingReport {
    /// Job created; the caller chose not to wait
    Pending { job_id: String },
    Finished(JobOutcome),
}

impl DubbingReport {
    pub fn job_id(&self) -> &str {
        match self {
            DubbingReport::Pending { job_id } => job_id,
            DubbingReport::Finished(outcome) => outcome.job_id(),
        }
    }
}

/// Create-then-poll workflow for dubbing jobs
pub struct Dubber<C: ?Sized> {
    api: Arc<C>,
    poller: JobPoller,
}

impl<C> Dubber<C>
where
    C: JobCreator + JobStatusSource + ?Sized,
{
    pub fn new(api: Arc<C>, poller: JobPoller) -> Self {
        Self { api, poller }
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    /// Start a job and, if `wait` is set, poll it with the default bound.
    /// `api_key` overrides the client's key for both creation and polling.
    ///
    /// Validation and creation failures are errors; everything after the job
    /// exists is reported through [`JobOutcome`].
    pub async fn dub(
        &self,
        request: &DubbingRequest,
        api_key: Option<&str>,
        wait: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<DubbingReport> {
        request.validate()?;
        let job_id = self.api.create_job(request, api_key).await?;
        info!(target: "dubbing", job_id = %job_id, target_lang = %request.target_lang, "Dubbing job created");

        if !wait {
            return Ok(DubbingReport::Pending { job_id });
        }
        let outcome = self
            .poller
            .wait(self.api.as_ref(), &job_id, api_key, cancel)
            .await;
        Ok(DubbingReport::Finished(outcome))
    }

    /// Resume waiting on a job created earlier.
    pub async fn resume(
        &self,
        job_id: &str,
        api_key: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> JobOutcome {
        self.poller
            .wait(self.api.as_ref(), job_id, api_key, cancel)
            .await
    }
}
