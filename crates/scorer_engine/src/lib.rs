//! Scorer engine: stream decoding, uploads and report persistence.
mod decode;
mod engine;
mod persist;
mod report;
mod types;
mod upload;

pub use decode::{StreamDecoder, EVENT_PREFIX};
pub use engine::{probe_health, EngineHandle};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use report::{build_report_markdown, format_score};
pub use types::{
    DecodeStats, EngineEvent, FailureKind, HealthStatus, StreamSummary, UploadError,
};
pub use upload::{ChannelEventSink, EventSink, ReqwestUploader, UploadSettings, Uploader};
