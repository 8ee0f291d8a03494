use std::fmt;

use scorer_core::{StreamEvent, SubmissionId};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The service answered with a success status; events follow.
    Opened { submission_id: SubmissionId },
    Event {
        submission_id: SubmissionId,
        event: StreamEvent,
    },
    Finished {
        submission_id: SubmissionId,
        result: Result<StreamSummary, UploadError>,
    },
}

/// Counters describing one consumed response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeStats {
    /// Complete lines seen.
    pub lines: u64,
    pub events: u64,
    /// `data: ` lines whose payload failed to parse.
    pub malformed: u64,
    /// `data: ` lines with a missing or unknown kind.
    pub unrecognized: u64,
    /// Complete lines without the `data: ` prefix.
    pub ignored_lines: u64,
    /// Unterminated bytes left in the carry-over buffer at end of stream.
    pub discarded_tail_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub bytes_received: u64,
    pub stats: DecodeStats,
    pub saw_end: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default)]
    pub use_llm: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError {
    pub kind: FailureKind,
    pub message: String,
}

impl UploadError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UploadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// The multipart body could not be assembled.
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Success status but nothing could be read from the body.
    EmptyBody,
    /// The body of a one-shot response could not be understood.
    InvalidResponse,
    Cancelled,
    Runtime,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::EmptyBody => write!(f, "empty response body"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Runtime => write!(f, "runtime error"),
        }
    }
}
