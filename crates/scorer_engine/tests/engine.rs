use std::sync::Arc;
use std::time::{Duration, Instant};

use scorer_core::{
    compose, update, AppState, Msg, Phase, RequestBody, ResumeFile, ScoreReport, SubmissionId,
    SubmissionInput, UploadMode,
};
use scorer_engine::{
    EngineEvent, EngineHandle, EventSink, FailureKind, HealthStatus, StreamSummary, UploadError,
    UploadSettings, Uploader,
};
use tokio_util::sync::CancellationToken;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> scorer_core::RequestBody {
    compose(SubmissionInput {
        jd_text: "Rust".to_string(),
        resume_file: Some(ResumeFile::new("cv.txt", b"Rust".to_vec())),
    })
    .unwrap()
}

fn collect_until_finished(engine: &EngineHandle, submission_id: u64) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Ok(event) = engine.recv_timeout(Duration::from_millis(50)) {
            let done = matches!(
                &event,
                EngineEvent::Finished { submission_id: id, .. } if *id == submission_id
            );
            events.push(event);
            if done {
                return events;
            }
        }
    }
    panic!("submission {submission_id} did not finish: {events:?}");
}

fn fold(state: AppState, events: Vec<EngineEvent>) -> AppState {
    events.into_iter().fold(state, |state, event| {
        let msg = match event {
            EngineEvent::Opened { submission_id } => Msg::StreamOpened { submission_id },
            EngineEvent::Event {
                submission_id,
                event,
            } => Msg::StreamEvent {
                submission_id,
                event,
            },
            EngineEvent::Finished {
                submission_id,
                result: Ok(_),
            } => Msg::StreamClosed { submission_id },
            EngineEvent::Finished {
                submission_id,
                result: Err(err),
            } => Msg::StreamFailed {
                submission_id,
                message: err.message,
            },
        };
        update(state, msg).0
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_streams_submission_into_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload_stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"type\":\"stream_content\",\"content\":\"Good fit\"}\n\ndata: {\"type\":\"end\"}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let uri = server.uri();
    let state = tokio::task::spawn_blocking(move || {
        let engine = EngineHandle::new(UploadSettings::with_base_url(uri)).unwrap();
        let (state, _) = update(AppState::new(), Msg::JdTextChanged("Rust".into()));
        let (state, _) = update(
            state,
            Msg::ResumeSelected(Some(ResumeFile::new("cv.txt", b"Rust".to_vec()))),
        );
        let (state, _) = update(state, Msg::SubmitClicked);
        engine.submit(1, request(), UploadMode::Stream);
        fold(state, collect_until_finished(&engine, 1))
    })
    .await
    .unwrap();

    let view = state.view();
    assert_eq!(view.phase, Phase::Completed);
    assert_eq!(view.final_text.as_deref(), Some("Good fit"));
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_blocking_mode_replays_report_as_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_score": 90,
            "matched_skills": ["rust"],
            "missing_skills": [],
            "suggestions": ["Looks good"],
            "llm_used": true
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let events = tokio::task::spawn_blocking(move || {
        let engine = EngineHandle::new(UploadSettings::with_base_url(uri)).unwrap();
        engine.submit(3, request(), UploadMode::Blocking);
        collect_until_finished(&engine, 3)
    })
    .await
    .unwrap();

    assert_eq!(events[0], EngineEvent::Opened { submission_id: 3 });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Finished { result: Ok(summary), .. }) if summary.saw_end
    ));
    assert_eq!(events.len(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn new_submission_cancels_stale_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload_stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_string("data: {\"type\":\"end\"}\n"),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let events = tokio::task::spawn_blocking(move || {
        let engine = EngineHandle::new(UploadSettings::with_base_url(uri)).unwrap();
        engine.submit(1, request(), UploadMode::Stream);
        std::thread::sleep(Duration::from_millis(100));
        engine.submit(2, request(), UploadMode::Stream);
        collect_until_finished(&engine, 1)
    })
    .await
    .unwrap();

    match events.last() {
        Some(EngineEvent::Finished {
            submission_id: 1,
            result: Err(err),
        }) => assert_eq!(err.kind, FailureKind::Cancelled),
        other => panic!("expected cancelled submission, got {other:?}"),
    }
}

struct PanickingUploader;

#[async_trait::async_trait]
impl Uploader for PanickingUploader {
    async fn upload_stream(
        &self,
        _submission_id: SubmissionId,
        _request: RequestBody,
        _sink: &dyn EventSink,
        _cancel: CancellationToken,
    ) -> Result<StreamSummary, UploadError> {
        panic!("connection pool poisoned");
    }

    async fn upload_blocking(
        &self,
        _request: RequestBody,
        _cancel: CancellationToken,
    ) -> Result<ScoreReport, UploadError> {
        panic!("connection pool poisoned");
    }

    async fn health(&self) -> Result<HealthStatus, UploadError> {
        panic!("connection pool poisoned");
    }
}

#[test]
fn crashed_submission_task_still_finishes() {
    let engine = EngineHandle::with_uploader(Arc::new(PanickingUploader)).unwrap();
    engine.submit(7, request(), UploadMode::Stream);

    let events = collect_until_finished(&engine, 7);
    match events.last() {
        Some(EngineEvent::Finished {
            submission_id: 7,
            result: Err(err),
        }) => {
            assert_eq!(err.kind, FailureKind::Runtime);
            assert_eq!(err.message, "upload stopped unexpectedly");
        }
        other => panic!("expected runtime failure, got {other:?}"),
    }
}
