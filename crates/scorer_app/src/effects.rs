use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_error, engine_info, engine_warn};
use scorer_core::{Effect, Msg, SubmissionId};
use scorer_engine::{EngineEvent, EngineHandle, UploadSettings};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: UploadSettings) -> anyhow::Result<Self> {
        let engine = EngineHandle::new(settings).context("failed to start upload engine")?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit {
                    submission_id,
                    request,
                    mode,
                } => {
                    engine_info!(
                        "Submit submission_id={} mode={:?} request={:?}",
                        submission_id,
                        mode,
                        request
                    );
                    self.engine.submit(submission_id, request, mode);
                }
                Effect::Cancel { submission_id } => {
                    self.engine.cancel(submission_id);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event, yielding `Msg::Tick` when none arrives.
    pub fn poll(&self, timeout: Duration, active: Option<SubmissionId>) -> Msg {
        map_received(self.engine.recv_timeout(timeout), active)
    }
}

fn map_received(
    received: Result<EngineEvent, RecvTimeoutError>,
    active: Option<SubmissionId>,
) -> Msg {
    match received {
        Ok(event) => map_event(event),
        Err(RecvTimeoutError::Timeout) => Msg::Tick,
        Err(RecvTimeoutError::Disconnected) => match active {
            Some(submission_id) => {
                engine_error!("Upload engine stopped during submission {}", submission_id);
                Msg::StreamFailed {
                    submission_id,
                    message: "upload engine stopped unexpectedly".to_string(),
                }
            }
            None => Msg::NoOp,
        },
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
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
            result: Ok(summary),
        } => {
            if summary.stats.malformed > 0 {
                engine_warn!(
                    "Submission {} skipped {} malformed event lines",
                    submission_id,
                    summary.stats.malformed
                );
            }
            Msg::StreamClosed { submission_id }
        }
        EngineEvent::Finished {
            submission_id,
            result: Err(err),
        } => Msg::StreamFailed {
            submission_id,
            message: err.message,
        },
    }
}
