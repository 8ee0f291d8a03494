use std::sync::Once;

use pretty_assertions::assert_eq;
use scorer_core::{
    classify_payload, update, AccumulatedResult, AppState, BaseInfo, Effect, Msg,
    PayloadOutcome, Phase, ResumeFile, StreamEvent, SubmissionId,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn submitted_state() -> (AppState, SubmissionId) {
    let state = AppState::new();
    let (state, _) = update(state, Msg::JdTextChanged("Rust, Kubernetes".to_string()));
    let (state, _) = update(
        state,
        Msg::ResumeSelected(Some(ResumeFile::new("cv.txt", b"Rust".to_vec()))),
    );
    let (state, effects) = update(state, Msg::SubmitClicked);
    let submission_id = match effects.as_slice() {
        [Effect::Submit { submission_id, .. }] => *submission_id,
        other => panic!("unexpected effects: {other:?}"),
    };
    (state, submission_id)
}

fn event(submission_id: SubmissionId, event: StreamEvent) -> Msg {
    Msg::StreamEvent {
        submission_id,
        event,
    }
}

fn chunk(text: &str) -> StreamEvent {
    StreamEvent::ContentChunk {
        text: text.to_string(),
    }
}

#[test]
fn chunks_concatenate_in_order_and_end_snapshots() {
    let mut result = AccumulatedResult::streaming();
    for text in ["a", "b", "c"] {
        assert!(result.apply(chunk(text)));
    }
    assert_eq!(result.streamed_text, "abc");
    assert_eq!(result.final_text, None);

    result.apply(StreamEvent::End);
    assert_eq!(result.final_text.as_deref(), Some("abc"));
    assert!(!result.is_streaming);
}

#[test]
fn result_is_frozen_after_end() {
    let mut result = AccumulatedResult::streaming();
    result.apply(chunk("done"));
    result.apply(StreamEvent::End);
    let frozen = result.clone();

    assert!(!result.apply(chunk(" more")));
    assert!(!result.apply(StreamEvent::End));
    assert!(!result.fail("late failure"));
    assert_eq!(result, frozen);
}

#[test]
fn base_info_is_replaced_wholesale() {
    let mut result = AccumulatedResult::streaming();
    result.apply(StreamEvent::BaseInfo(BaseInfo {
        total_score: Some(50.0),
        matched_skills: vec!["rust".into()],
        missing_skills: vec!["go".into()],
    }));
    result.apply(StreamEvent::BaseInfo(BaseInfo {
        total_score: None,
        matched_skills: vec![],
        missing_skills: vec![],
    }));
    assert_eq!(result.base_info, Some(BaseInfo::default()));
}

#[test]
fn end_to_end_scenario_reaches_completed() {
    init_logging();
    let (state, id) = submitted_state();
    assert_eq!(state.phase(), Phase::Submitting);
    assert!(state.result().is_streaming);

    let payloads = [
        r#"{"type":"base_info","total_score":88}"#,
        r#"{"type":"stream_content","content":"Hello"}"#,
        r#"{"type":"stream_content","content":" world"}"#,
        r#"{"type":"end"}"#,
    ];
    let (mut state, _) = update(state, Msg::StreamOpened { submission_id: id });
    assert_eq!(state.phase(), Phase::Streaming);
    for payload in payloads {
        let PayloadOutcome::Event(ev) = classify_payload(payload) else {
            panic!("payload should classify: {payload}");
        };
        state = update(state, event(id, ev)).0;
    }

    let view = state.view();
    assert_eq!(view.phase, Phase::Completed);
    assert_eq!(view.base_info.unwrap().total_score, Some(88.0));
    assert_eq!(view.streamed_text, "Hello world");
    assert_eq!(view.final_text.as_deref(), Some("Hello world"));
    assert!(!view.is_streaming);
    assert_eq!(view.error, None);
    assert!(view.can_submit);
}

#[test]
fn transport_failure_keeps_partial_text() {
    init_logging();
    let (state, id) = submitted_state();
    let (state, _) = update(state, event(id, chunk("partial ")));
    let (state, _) = update(state, event(id, chunk("advice")));
    let (state, _) = update(
        state,
        Msg::StreamFailed {
            submission_id: id,
            message: "network error".to_string(),
        },
    );

    let view = state.view();
    assert_eq!(view.phase, Phase::StreamFailed);
    assert_eq!(view.streamed_text, "partial advice");
    assert_eq!(view.final_text, None);
    assert_eq!(view.error.as_deref(), Some("network error"));
    assert!(!view.is_streaming);
}

#[test]
fn close_without_end_completes_without_final_text() {
    init_logging();
    let (state, id) = submitted_state();
    let (state, _) = update(state, event(id, chunk("cut off")));
    let (state, _) = update(state, Msg::StreamClosed { submission_id: id });

    let view = state.view();
    assert_eq!(view.phase, Phase::Completed);
    assert_eq!(view.streamed_text, "cut off");
    assert_eq!(view.final_text, None);
    assert_eq!(view.error, None);
}

#[test]
fn close_after_end_keeps_final_text() {
    let (state, id) = submitted_state();
    let (state, _) = update(state, event(id, chunk("all")));
    let (state, _) = update(state, event(id, StreamEvent::End));
    let before = state.view();
    let (state, _) = update(state, Msg::StreamClosed { submission_id: id });

    assert_eq!(state.view().final_text, before.final_text);
    assert_eq!(state.phase(), Phase::Completed);
}

#[test]
fn suggestions_and_notices_do_not_touch_streamed_text() {
    let (state, id) = submitted_state();
    let (state, _) = update(
        state,
        event(
            id,
            StreamEvent::RuleSuggestion {
                text: "quantify results".into(),
            },
        ),
    );
    let (state, _) = update(
        state,
        event(
            id,
            StreamEvent::Notice {
                message: "model unavailable".into(),
            },
        ),
    );

    let view = state.view();
    assert_eq!(view.streamed_text, "");
    assert_eq!(view.rule_suggestions, vec!["quantify results".to_string()]);
    assert_eq!(view.notices, vec!["model unavailable".to_string()]);
    assert_eq!(view.error, None);
    assert!(view.is_streaming);
}
