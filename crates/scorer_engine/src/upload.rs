use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use scorer_core::{RequestBody, ScoreReport, SubmissionId};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::decode::StreamDecoder;
use crate::{EngineEvent, FailureKind, HealthStatus, StreamSummary, UploadError};

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub base_url: String,
    pub stream_endpoint: String,
    pub upload_endpoint: String,
    pub health_endpoint: String,
    pub connect_timeout: Duration,
    /// Upper bound for a whole request, body included; generation can be slow.
    pub request_timeout: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            stream_endpoint: "/api/upload_stream".to_string(),
            upload_endpoint: "/api/upload".to_string(),
            health_endpoint: "/healthz".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(600),
        }
    }
}

impl UploadSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<reqwest::Url, UploadError> {
        let joined = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);
        reqwest::Url::parse(&joined)
            .map_err(|err| UploadError::new(FailureKind::InvalidUrl, format!("{joined}: {err}")))
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Posts to the streaming endpoint and emits decoded events as lines complete.
    async fn upload_stream(
        &self,
        submission_id: SubmissionId,
        request: RequestBody,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    ) -> Result<StreamSummary, UploadError>;

    /// Posts to the one-shot endpoint and returns its report.
    async fn upload_blocking(
        &self,
        request: RequestBody,
        cancel: CancellationToken,
    ) -> Result<ScoreReport, UploadError>;

    async fn health(&self) -> Result<HealthStatus, UploadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestUploader {
    settings: UploadSettings,
    client: reqwest::Client,
}

impl ReqwestUploader {
    pub fn new(settings: UploadSettings) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| UploadError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn post(
        &self,
        endpoint: &str,
        request: RequestBody,
    ) -> Result<reqwest::Response, UploadError> {
        let url = self.settings.endpoint_url(endpoint)?;
        let form = build_form(request)?;
        engine_debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(response).await);
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestUploader {
    async fn upload_stream(
        &self,
        submission_id: SubmissionId,
        request: RequestBody,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    ) -> Result<StreamSummary, UploadError> {
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled()),
            response = self.post(&self.settings.stream_endpoint, request) => response?,
        };
        sink.emit(EngineEvent::Opened { submission_id });

        let mut decoder = StreamDecoder::new();
        let mut bytes_received: u64 = 0;
        let mut saw_end = false;
        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(map_reqwest_error)?;
            bytes_received += chunk.len() as u64;
            for event in decoder.feed(&chunk) {
                saw_end |= event == scorer_core::StreamEvent::End;
                sink.emit(EngineEvent::Event {
                    submission_id,
                    event,
                });
            }
        }

        if bytes_received == 0 {
            return Err(UploadError::new(
                FailureKind::EmptyBody,
                "unable to read streaming response",
            ));
        }

        let stats = decoder.finish();
        engine_info!(
            "Stream finished: {} bytes, {} events, {} malformed, {} unrecognized",
            bytes_received,
            stats.events,
            stats.malformed,
            stats.unrecognized
        );
        Ok(StreamSummary {
            bytes_received,
            stats,
            saw_end,
        })
    }

    async fn upload_blocking(
        &self,
        request: RequestBody,
        cancel: CancellationToken,
    ) -> Result<ScoreReport, UploadError> {
        let exchange = async {
            let response = self.post(&self.settings.upload_endpoint, request).await?;
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            serde_json::from_slice::<ScoreReport>(&body)
                .map_err(|err| UploadError::new(FailureKind::InvalidResponse, err.to_string()))
        };
        tokio::select! {
            _ = cancel.cancelled() => Err(cancelled()),
            report = exchange => report,
        }
    }

    async fn health(&self) -> Result<HealthStatus, UploadError> {
        let url = self.settings.endpoint_url(&self.settings.health_endpoint)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice::<HealthStatus>(&body)
            .map_err(|err| UploadError::new(FailureKind::InvalidResponse, err.to_string()))
    }
}

fn build_form(request: RequestBody) -> Result<Form, UploadError> {
    let RequestBody {
        jd_text,
        resume_file_name,
        resume_mime,
        resume_bytes,
    } = request;
    let resume_part = Part::bytes(resume_bytes)
        .file_name(resume_file_name)
        .mime_str(resume_mime)
        .map_err(|err| UploadError::new(FailureKind::InvalidRequest, err.to_string()))?;
    Ok(Form::new()
        .text("jd_text", jd_text)
        .part("resume_file", resume_part))
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Builds the error for a non-success response, preferring the service's own message.
async fn status_error(response: reqwest::Response) -> UploadError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    engine_warn!("Service answered {}: {}", status, message);
    UploadError::new(FailureKind::HttpStatus(status.as_u16()), message)
}

fn cancelled() -> UploadError {
    UploadError::new(FailureKind::Cancelled, "submission cancelled")
}

fn map_reqwest_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        return UploadError::new(FailureKind::Timeout, err.to_string());
    }
    UploadError::new(FailureKind::Network, err.to_string())
}
