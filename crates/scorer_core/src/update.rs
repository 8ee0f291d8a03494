use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::{compose, AppState, Effect, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::JdTextChanged(text) => {
            state.set_jd_text(text);
            Vec::new()
        }
        Msg::ResumeSelected(file) => {
            state.set_resume(file);
            Vec::new()
        }
        Msg::ModeChanged(mode) => {
            state.set_mode(mode);
            Vec::new()
        }
        Msg::SubmitClicked => {
            // The submit control is disabled while a submission is in flight.
            if !state.phase().accepts_submit() {
                return (state, Vec::new());
            }
            state.begin_validation();
            match compose(state.input().clone()) {
                Ok(request) => {
                    let mode = state.mode();
                    let submission_id = state.dispatch();
                    engine_info!(
                        "Submitting {:?} as submission {} ({:?})",
                        request,
                        submission_id,
                        mode
                    );
                    vec![Effect::Submit {
                        submission_id,
                        request,
                        mode,
                    }]
                }
                Err(err) => {
                    engine_info!("Submission rejected: {}", err);
                    state.reject(err.to_string());
                    Vec::new()
                }
            }
        }
        Msg::CancelClicked => match state.active_submission() {
            Some(submission_id) if state.phase().is_in_flight() => {
                state.fail_stream("submission cancelled".to_string());
                vec![Effect::Cancel { submission_id }]
            }
            _ => Vec::new(),
        },
        Msg::StreamOpened { submission_id } => {
            if state.is_current(submission_id) {
                state.open_stream();
            }
            Vec::new()
        }
        Msg::StreamEvent {
            submission_id,
            event,
        } => {
            if state.is_current(submission_id) {
                state.apply_event(event);
            } else {
                engine_debug!("Ignoring event for stale submission {}", submission_id);
            }
            Vec::new()
        }
        Msg::StreamClosed { submission_id } => {
            if state.is_current(submission_id) {
                engine_warn!(
                    "Stream for submission {} closed without an end event",
                    submission_id
                );
                state.close_stream();
            }
            Vec::new()
        }
        Msg::StreamFailed {
            submission_id,
            message,
        } => {
            if state.is_current(submission_id) {
                engine_warn!("Submission {} failed: {}", submission_id, message);
                state.fail_stream(message);
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    debug_assert!(
        state.phase() != Phase::Validating,
        "validation resolves within a single update"
    );
    (state, effects)
}
