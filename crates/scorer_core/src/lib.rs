//! Scorer core: request composition, stream event vocabulary and the pure
//! submission state machine.
mod compose;
mod effect;
mod event;
mod msg;
mod state;
mod update;
mod view_model;

pub use compose::{
    compose, RequestBody, ResumeFile, SubmissionInput, ValidationError, ALLOWED_EXTENSIONS,
    MAX_RESUME_BYTES,
};
pub use effect::Effect;
pub use event::{classify_payload, BaseInfo, PayloadOutcome, ScoreReport, StreamEvent};
pub use msg::Msg;
pub use state::{AccumulatedResult, AppState, Phase, SubmissionId, UploadMode};
pub use update::update;
pub use view_model::{AppViewModel, ResumeSummary};
