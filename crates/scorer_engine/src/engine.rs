use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info};
use scorer_core::{RequestBody, SubmissionId, UploadMode};
use tokio_util::sync::CancellationToken;

use crate::upload::{ChannelEventSink, EventSink, ReqwestUploader, UploadSettings, Uploader};
use crate::{EngineEvent, FailureKind, HealthStatus, StreamSummary, UploadError};

enum EngineCommand {
    Submit {
        submission_id: SubmissionId,
        request: RequestBody,
        mode: UploadMode,
    },
    Cancel {
        submission_id: SubmissionId,
    },
}

/// Handle to the background thread that performs uploads.
///
/// At most one submission is in flight: submitting a new one cancels the
/// read loop of the previous one.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: UploadSettings) -> Result<Self, UploadError> {
        let uploader = ReqwestUploader::new(settings)?;
        Self::with_uploader(Arc::new(uploader))
    }

    pub fn with_uploader(uploader: Arc<dyn Uploader>) -> Result<Self, UploadError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|err| UploadError::new(FailureKind::Runtime, err.to_string()))?;

        thread::spawn(move || {
            let mut in_flight: Option<(SubmissionId, CancellationToken)> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit {
                        submission_id,
                        request,
                        mode,
                    } => {
                        if let Some((previous, token)) = in_flight.take() {
                            engine_debug!("Cancelling stale submission {}", previous);
                            token.cancel();
                        }
                        let token = CancellationToken::new();
                        in_flight = Some((submission_id, token.clone()));
                        let uploader = uploader.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        let task = runtime.spawn(async move {
                            run_submission(
                                uploader.as_ref(),
                                submission_id,
                                request,
                                mode,
                                &sink,
                                token,
                            )
                            .await;
                        });
                        let watcher = ChannelEventSink::new(event_tx.clone());
                        runtime.spawn(async move {
                            if let Err(err) = task.await {
                                engine_error!(
                                    "Submission {} task stopped without finishing: {}",
                                    submission_id,
                                    err
                                );
                                watcher.emit(EngineEvent::Finished {
                                    submission_id,
                                    result: Err(UploadError::new(
                                        FailureKind::Runtime,
                                        "upload stopped unexpectedly",
                                    )),
                                });
                            }
                        });
                    }
                    EngineCommand::Cancel { submission_id } => match &in_flight {
                        Some((current, token)) if *current == submission_id => {
                            engine_info!("Cancelling submission {}", submission_id);
                            token.cancel();
                            in_flight = None;
                        }
                        _ => {}
                    },
                }
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit(&self, submission_id: SubmissionId, request: RequestBody, mode: UploadMode) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            submission_id,
            request,
            mode,
        });
    }

    pub fn cancel(&self, submission_id: SubmissionId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { submission_id });
    }

    /// Waits up to `timeout` for the next event.
    ///
    /// `Disconnected` means the engine thread and every submission task are gone,
    /// so no further events will arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }
}

async fn run_submission(
    uploader: &dyn Uploader,
    submission_id: SubmissionId,
    request: RequestBody,
    mode: UploadMode,
    sink: &dyn EventSink,
    cancel: CancellationToken,
) {
    let result = match mode {
        UploadMode::Stream => {
            uploader
                .upload_stream(submission_id, request, sink, cancel)
                .await
        }
        UploadMode::Blocking => run_blocking(uploader, submission_id, request, sink, cancel).await,
    };
    if let Err(err) = &result {
        engine_error!(
            "Submission {} failed ({}): {}",
            submission_id,
            err.kind,
            err.message
        );
    }
    sink.emit(EngineEvent::Finished {
        submission_id,
        result,
    });
}

async fn run_blocking(
    uploader: &dyn Uploader,
    submission_id: SubmissionId,
    request: RequestBody,
    sink: &dyn EventSink,
    cancel: CancellationToken,
) -> Result<StreamSummary, UploadError> {
    let report = uploader.upload_blocking(request, cancel).await?;
    sink.emit(EngineEvent::Opened { submission_id });
    let events = report.into_events();
    let count = events.len() as u64;
    for event in events {
        sink.emit(EngineEvent::Event {
            submission_id,
            event,
        });
    }
    Ok(StreamSummary {
        bytes_received: 0,
        stats: crate::DecodeStats {
            events: count,
            ..Default::default()
        },
        saw_end: true,
    })
}

/// Queries the service health endpoint on a short-lived runtime.
pub fn probe_health(settings: UploadSettings) -> Result<HealthStatus, UploadError> {
    let uploader = ReqwestUploader::new(settings)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| UploadError::new(FailureKind::Runtime, err.to_string()))?;
    runtime.block_on(uploader.health())
}
