use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use voxnode_core::{
    Dubber, DubbingReport, DubbingRequest, JobCreator, JobOutcome, JobPoller, JobStatus,
    JobStatusSource, PollerConfig, Result, VoxError,
};

mock! {
    pub Api {}

    #[async_trait]
    impl JobCreator for Api {
        async fn create_job<'a, 'b, 'c>(&'a self, request: &'b DubbingRequest, api_key: Option<&'c str>) -> Result<String>;
    }

    #[async_trait]
    impl JobStatusSource for Api {
        async fn query_job_status<'a, 'b, 'c>(&'a self, job_id: &'b str, api_key: Option<&'c str>) -> Result<JobStatus>;
    }
}

fn dubber(api: MockApi) -> Dubber<MockApi> {
    Dubber::new(
        Arc::new(api),
        JobPoller::new(PollerConfig {
            interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(300),
            query_timeout: Duration::from_secs(10),
        }),
    )
}

fn request() -> DubbingRequest {
    DubbingRequest::wav(vec![0u8; 64], "fr").num_speakers(2)
}

#[tokio::test]
async fn no_wait_returns_pending_without_polling() {
    let mut api = MockApi::new();
    api.expect_create_job()
        .times(1)
        .returning(|_, _| Ok("dub-42".to_string()));
    api.expect_query_job_status().times(0);

    let report = dubber(api).dub(&request(), None, false, None).await.unwrap();

    assert!(matches!(report, DubbingReport::Pending { ref job_id } if job_id == "dub-42"));
}

#[tokio::test(start_paused = true)]
async fn wait_polls_created_job() {
    let mut api = MockApi::new();
    api.expect_create_job()
        .withf(|req, _| req.target_lang == "fr" && req.num_speakers == 2)
        .times(1)
        .returning(|_, _| Ok("dub-42".to_string()));
    let mut polls = 0;
    api.expect_query_job_status()
        .withf(|id, _| id == "dub-42")
        .times(2)
        .returning(move |_, _| {
            polls += 1;
            Ok(JobStatus::new(if polls < 2 { "dubbing" } else { "dubbed" }))
        });

    let report = dubber(api).dub(&request(), None, true, None).await.unwrap();

    match report {
        DubbingReport::Finished(JobOutcome::Complete { job_id, .. }) => assert_eq!(job_id, "dub-42"),
        other => panic!("unexpected report: {:?}", other),
    }
}

#[tokio::test]
async fn invalid_request_is_rejected_before_upload() {
    let mut api = MockApi::new();
    api.expect_create_job().times(0);

    let err = dubber(api)
        .dub(&DubbingRequest::wav(vec![], "fr"), None, true, None)
        .await
        .unwrap_err();

    assert!(matches!(err, VoxError::InvalidRequest(_)));
}

#[tokio::test]
async fn creation_failure_is_an_error() {
    let mut api = MockApi::new();
    api.expect_create_job()
        .times(1)
        .returning(|_, _| Err(VoxError::MissingField("dubbing_id")));
    api.expect_query_job_status().times(0);

    let err = dubber(api).dub(&request(), None, true, None).await.unwrap_err();

    assert!(matches!(err, VoxError::MissingField("dubbing_id")));
}

#[tokio::test]
async fn resume_reports_unknown_status() {
    let mut api = MockApi::new();
    api.expect_query_job_status()
        .times(1)
        .returning(|_, _| Ok(JobStatus::new("failed")));

    let outcome = dubber(api).resume("dub-7", None, None).await;

    assert_eq!(outcome.job_id(), "dub-7");
    assert_eq!(outcome.status(), Some("failed"));
    assert!(!outcome.is_complete());
}

#[tokio::test]
async fn out_of_range_speakers_are_rejected() {
    let mut api = MockApi::new();
    api.expect_create_job().times(0);

    let err = dubber(api)
        .dub(&request().num_speakers(11), None, false, None)
        .await
        .unwrap_err();

    assert!(matches!(err, VoxError::InvalidRequest(_)));
}

#[tokio::test(start_paused = true)]
async fn caller_key_is_used_for_create_and_poll() {
    let mut api = MockApi::new();
    api.expect_create_job()
        .withf(|_, key| *key == Some("caller-key"))
        .times(1)
        .returning(|_, _| Ok("dub-42".to_string()));
    api.expect_query_job_status()
        .withf(|id, key| id == "dub-42" && *key == Some("caller-key"))
        .times(1)
        .returning(|_, _| Ok(JobStatus::new("dubbed")));

    let report = dubber(api)
        .dub(&request(), Some("caller-key"), true, None)
        .await
        .unwrap();

    assert!(matches!(report, DubbingReport::Finished(JobOutcome::Complete { .. })));
}
