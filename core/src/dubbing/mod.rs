//! Dubbing jobs
//!
//! Dubbing is asynchronous on the remote side: a job is created from an
//! upload and then reports `dubbing` until it turns `dubbed`. [`JobPoller`]
//! mirrors that state machine locally as a bounded, cancellable wait and
//! always ends in an explicit [`JobOutcome`].

mod dubber;
mod job;
mod poller;

pub use dubber::{Dubber, DubbingReport};
pub use job::{
    upload_meta, DubbingRequest, JobCreator, JobOutcome, JobStatus, JobStatusSource, RemoteStatus,
    COMPLETE_STATUS, MAX_SPEAKERS, PROCESSING_STATUS, TARGET_LANGUAGES,
};
pub use poller::JobPoller;
