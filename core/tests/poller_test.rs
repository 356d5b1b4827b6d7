use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use voxnode_core::{JobOutcome, JobPoller, JobStatus, JobStatusSource, PollerConfig, Result, VoxError};

mock! {
    pub StatusSource {}

    #[async_trait]
    impl JobStatusSource for StatusSource {
        async fn query_job_status<'a, 'b, 'c>(&'a self, job_id: &'b str, api_key: Option<&'c str>) -> Result<JobStatus>;
    }
}

fn poller() -> JobPoller {
    JobPoller::new(PollerConfig {
        interval: Duration::from_secs(10),
        max_wait: Duration::from_secs(300),
        query_timeout: Duration::from_secs(10),
    })
}

fn scripted(statuses: &[&str]) -> MockStatusSource {
    let mut remaining: Vec<JobStatus> = statuses.iter().rev().map(|s| JobStatus::new(*s)).collect();
    let mut source = MockStatusSource::new();
    source
        .expect_query_job_status()
        .withf(|id, _| id == "job-1")
        .times(statuses.len())
        .returning(move |_, _| Ok(remaining.pop().expect("script exhausted")));
    source
}

fn assert_elapsed(start: Instant, expected_secs: u64) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_secs(expected_secs)
            && elapsed < Duration::from_secs(expected_secs + 1),
        "elapsed {:?}, expected ~{}s",
        elapsed,
        expected_secs
    );
}

#[tokio::test(start_paused = true)]
async fn completes_after_two_processing_polls() {
    let source = scripted(&["dubbing", "dubbing", "dubbed"]);
    let start = Instant::now();

    let outcome = poller()
        .wait_for_completion(&source, "job-1", None, Duration::from_secs(300), None)
        .await;

    match outcome {
        JobOutcome::Complete { job_id, status } => {
            assert_eq!(job_id, "job-1");
            assert_eq!(status, "dubbed");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    // three queries, two sleeps
    assert_elapsed(start, 20);
}

#[tokio::test(start_paused = true)]
async fn times_out_before_fourth_query() {
    let source = scripted(&["dubbing", "dubbing", "dubbing"]);
    let start = Instant::now();

    let outcome = poller()
        .wait_for_completion(&source, "job-1", None, Duration::from_secs(25), None)
        .await;

    match outcome {
        JobOutcome::Timeout { job_id, max_wait } => {
            assert_eq!(job_id, "job-1");
            assert_eq!(max_wait, Duration::from_secs(25));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    // last sleep is cut to the 5s left in the budget
    assert_elapsed(start, 25);
}

#[tokio::test(start_paused = true)]
async fn transport_error_stops_polling() {
    let mut source = MockStatusSource::new();
    let mut calls = 0;
    source
        .expect_query_job_status()
        .times(2)
        .returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(JobStatus::new("dubbing"))
            } else {
                Err(VoxError::Http {
                    status: 502,
                    body: "bad gateway".into(),
                })
            }
        });

    let outcome = poller()
        .wait_for_completion(&source, "job-1", None, Duration::from_secs(300), None)
        .await;

    match outcome {
        JobOutcome::TransportError { job_id, error } => {
            assert_eq!(job_id, "job-1");
            assert!(matches!(error, VoxError::Http { status: 502, .. }));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn unknown_status_is_terminal_on_first_query() {
    let source = scripted(&["failed"]);
    let start = Instant::now();

    let outcome = poller()
        .wait_for_completion(&source, "job-1", None, Duration::from_secs(300), None)
        .await;

    assert!(matches!(
        &outcome,
        JobOutcome::Other { status, .. } if status == "failed"
    ));
    assert_eq!(outcome.status(), Some("failed"));
    assert_elapsed(start, 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_sleep() {
    let source = scripted(&["dubbing", "dubbing"]);
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        trigger.cancel();
    });
    let start = Instant::now();

    let outcome = poller()
        .wait_for_completion(&source, "job-1", None, Duration::from_secs(300), Some(&token))
        .await;

    assert!(matches!(outcome, JobOutcome::Cancelled { ref job_id } if job_id == "job-1"));
    assert_elapsed(start, 15);
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_skips_querying() {
    let mut source = MockStatusSource::new();
    source.expect_query_job_status().times(0);
    let token = CancellationToken::new();
    token.cancel();

    let outcome = poller()
        .wait_for_completion(&source, "job-1", None, Duration::from_secs(300), Some(&token))
        .await;

    assert!(matches!(outcome, JobOutcome::Cancelled { .. }));
}

struct HangingSource;

#[async_trait]
impl JobStatusSource for HangingSource {
    async fn query_job_status(&self, _job_id: &str, _api_key: Option<&str>) -> Result<JobStatus> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(JobStatus::new("dubbed"))
    }
}

#[tokio::test(start_paused = true)]
async fn hung_query_is_bounded_by_query_timeout() {
    let start = Instant::now();

    let outcome = poller()
        .wait_for_completion(&HangingSource, "job-1", None, Duration::from_secs(300), None)
        .await;

    match outcome {
        JobOutcome::TransportError { error, .. } => assert!(error.is_transport()),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_elapsed(start, 10);
}

#[tokio::test(start_paused = true)]
async fn wait_uses_configured_bound() {
    let source = scripted(&["dubbing", "dubbing"]);
    let poller = JobPoller::new(PollerConfig {
        interval: Duration::from_secs(10),
        max_wait: Duration::from_secs(15),
        query_timeout: Duration::from_secs(5),
    });

    let outcome = poller.wait(&source, "job-1", None, None).await;

    assert!(matches!(
        outcome,
        JobOutcome::Timeout { max_wait, .. } if max_wait == Duration::from_secs(15)
    ));
}

/// Answers `dubbing` for the first `answered` queries, then never answers.
struct StallingSource {
    answered: u32,
    calls: AtomicU32,
}

impl StallingSource {
    fn after(answered: u32) -> Self {
        Self {
            answered,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl JobStatusSource for StallingSource {
    async fn query_job_status(&self, _job_id: &str, _api_key: Option<&str>) -> Result<JobStatus> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.answered {
            return Ok(JobStatus::new("dubbing"));
        }
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(JobStatus::new("dubbed"))
    }
}

fn assert_within_bound(start: Instant, config: &PollerConfig) {
    let bound = config.max_wait + config.query_timeout;
    assert!(
        start.elapsed() <= bound,
        "returned after {:?}, bound is {:?}",
        start.elapsed(),
        bound
    );
}

#[tokio::test(start_paused = true)]
async fn interval_longer_than_remaining_budget_is_shortened() {
    let config = PollerConfig {
        interval: Duration::from_secs(10),
        max_wait: Duration::from_secs(11),
        query_timeout: Duration::from_secs(1),
    };
    let source = StallingSource::after(u32::MAX);
    let start = Instant::now();

    let outcome = JobPoller::new(config.clone()).wait(&source, "job-1", None, None).await;

    assert!(matches!(outcome, JobOutcome::Timeout { .. }));
    assert_within_bound(start, &config);
    assert_elapsed(start, 11);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn hang_in_last_iteration_stops_at_max_wait() {
    let config = PollerConfig {
        interval: Duration::from_secs(10),
        max_wait: Duration::from_secs(15),
        query_timeout: Duration::from_secs(10),
    };
    let source = StallingSource::after(1);
    let start = Instant::now();

    let outcome = JobPoller::new(config.clone()).wait(&source, "job-1", None, None).await;

    match outcome {
        JobOutcome::Timeout { max_wait, .. } => assert_eq!(max_wait, Duration::from_secs(15)),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_within_bound(start, &config);
    assert_elapsed(start, 15);
}

#[tokio::test(start_paused = true)]
async fn api_key_reaches_every_query() {
    let mut source = MockStatusSource::new();
    let mut calls = 0;
    source
        .expect_query_job_status()
        .withf(|_, key| *key == Some("caller-key"))
        .times(2)
        .returning(move |_, _| {
            calls += 1;
            Ok(JobStatus::new(if calls < 2 { "dubbing" } else { "dubbed" }))
        });

    let outcome = poller()
        .wait_for_completion(&source, "job-1", Some("caller-key"), Duration::from_secs(300), None)
        .await;

    assert!(outcome.is_complete());
}
