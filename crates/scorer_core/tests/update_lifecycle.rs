use std::sync::Once;

use scorer_core::{update, AppState, Effect, Msg, Phase, ResumeFile, StreamEvent, UploadMode};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn filled_form() -> AppState {
    let (state, _) = update(AppState::new(), Msg::JdTextChanged("Backend, Rust".into()));
    let (state, _) = update(
        state,
        Msg::ResumeSelected(Some(ResumeFile::new("cv.pdf", b"%PDF".to_vec()))),
    );
    state
}

#[test]
fn validation_failure_sets_error_and_emits_nothing() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::JdTextChanged("Rust".into()));
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, Phase::ValidationFailed);
    assert!(view.error.unwrap().contains("resume file"));
    assert!(!view.is_streaming);
    assert!(view.can_submit);
}

#[test]
fn submit_emits_effect_with_selected_mode() {
    init_logging();
    let (state, _) = update(filled_form(), Msg::ModeChanged(UploadMode::Blocking));
    let (mut state, effects) = update(state, Msg::SubmitClicked);

    match effects.as_slice() {
        [Effect::Submit {
            submission_id,
            request,
            mode,
        }] => {
            assert_eq!(*submission_id, 1);
            assert_eq!(*mode, UploadMode::Blocking);
            assert_eq!(request.jd_text, "Backend, Rust");
            assert_eq!(request.resume_file_name, "cv.pdf");
            assert_eq!(request.resume_mime, "application/pdf");
        }
        other => panic!("unexpected effects: {other:?}"),
    }
    assert_eq!(state.phase(), Phase::Submitting);
    assert!(!state.view().can_submit);
    assert!(state.consume_dirty());
}

#[test]
fn submit_is_ignored_while_in_flight() {
    let (state, _) = update(filled_form(), Msg::SubmitClicked);
    let (state, _) = update(state, Msg::StreamOpened { submission_id: 1 });
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Streaming);
    assert_eq!(state.active_submission(), Some(1));
}

#[test]
fn resubmit_after_completion_resets_result() {
    init_logging();
    let (state, _) = update(filled_form(), Msg::SubmitClicked);
    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission_id: 1,
            event: StreamEvent::ContentChunk {
                text: "first run".into(),
            },
        },
    );
    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission_id: 1,
            event: StreamEvent::End,
        },
    );
    assert_eq!(state.phase(), Phase::Completed);

    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Submit {
            submission_id: 2,
            ..
        }]
    ));
    let view = state.view();
    assert_eq!(view.streamed_text, "");
    assert_eq!(view.final_text, None);
    assert!(view.is_streaming);
}

#[test]
fn resubmit_after_validation_failure_clears_error() {
    let (state, _) = update(AppState::new(), Msg::SubmitClicked);
    assert_eq!(state.phase(), Phase::ValidationFailed);

    let (state, _) = update(state, Msg::JdTextChanged("Rust".into()));
    let (state, _) = update(
        state,
        Msg::ResumeSelected(Some(ResumeFile::new("cv.txt", b"rust".to_vec()))),
    );
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert_eq!(effects.len(), 1);
    assert_eq!(state.phase(), Phase::Submitting);
    assert_eq!(state.view().error, None);
}

#[test]
fn events_for_stale_submission_are_dropped() {
    init_logging();
    let (state, _) = update(filled_form(), Msg::SubmitClicked);
    let (state, _) = update(
        state,
        Msg::StreamFailed {
            submission_id: 1,
            message: "HTTP 502".into(),
        },
    );
    let (state, _) = update(state, Msg::SubmitClicked);
    assert_eq!(state.active_submission(), Some(2));

    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission_id: 1,
            event: StreamEvent::ContentChunk {
                text: "late".into(),
            },
        },
    );
    let (state, _) = update(state, Msg::StreamClosed { submission_id: 1 });

    let view = state.view();
    assert_eq!(view.phase, Phase::Submitting);
    assert_eq!(view.streamed_text, "");
    assert!(view.is_streaming);
}

#[test]
fn cancel_fails_current_submission_and_emits_effect() {
    init_logging();
    let (state, _) = update(filled_form(), Msg::SubmitClicked);
    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission_id: 1,
            event: StreamEvent::ContentChunk {
                text: "half".into(),
            },
        },
    );
    let (state, effects) = update(state, Msg::CancelClicked);

    assert_eq!(effects, vec![Effect::Cancel { submission_id: 1 }]);
    let view = state.view();
    assert_eq!(view.phase, Phase::StreamFailed);
    assert_eq!(view.error.as_deref(), Some("submission cancelled"));
    assert_eq!(view.streamed_text, "half");
    assert_eq!(view.final_text, None);
}

#[test]
fn cancel_when_idle_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::CancelClicked);
    assert!(effects.is_empty());
    assert_eq!(next, state);
}
