use engine_logging::{engine_debug, engine_info};

use crate::compose::{ResumeFile, SubmissionInput};
use crate::event::{BaseInfo, StreamEvent};
use crate::view_model::{AppViewModel, ResumeSummary};

pub type SubmissionId = u64;

/// Lifecycle of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    ValidationFailed,
    Submitting,
    Streaming,
    StreamFailed,
    Completed,
}

impl Phase {
    /// Phases from which a new submission may begin.
    pub fn accepts_submit(self) -> bool {
        matches!(
            self,
            Phase::Idle | Phase::ValidationFailed | Phase::StreamFailed | Phase::Completed
        )
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Streaming)
    }
}

/// Which endpoint a submission goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    #[default]
    Stream,
    Blocking,
}

/// Everything observed for one submission.
///
/// Only [`AccumulatedResult::apply`] and [`AccumulatedResult::fail`] mutate it,
/// and both become no-ops once streaming has stopped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccumulatedResult {
    pub base_info: Option<BaseInfo>,
    pub streamed_text: String,
    pub final_text: Option<String>,
    pub error: Option<String>,
    pub is_streaming: bool,
    pub rule_suggestions: Vec<String>,
    pub notices: Vec<String>,
}

impl AccumulatedResult {
    /// Fresh result for a submission that is about to be dispatched.
    pub fn streaming() -> Self {
        Self {
            is_streaming: true,
            ..Self::default()
        }
    }

    /// Folds one event into the result. Returns whether anything changed.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        if !self.is_streaming {
            engine_debug!("Dropping event after stream stopped: {:?}", event);
            return false;
        }
        match event {
            StreamEvent::BaseInfo(info) => {
                self.base_info = Some(info);
            }
            StreamEvent::ContentChunk { text } => {
                if text.is_empty() {
                    return false;
                }
                self.streamed_text.push_str(&text);
            }
            StreamEvent::RuleSuggestion { text } => {
                self.rule_suggestions.push(text);
            }
            StreamEvent::Notice { message } => {
                self.notices.push(message);
            }
            StreamEvent::End => {
                self.final_text = Some(self.streamed_text.clone());
                self.is_streaming = false;
            }
        }
        true
    }

    /// Records a fatal error. Text streamed so far is kept; `final_text` stays unset.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.error = Some(message.into());
        self.is_streaming = false;
        true
    }

    /// Stops streaming without a final snapshot (transport closed before `End`).
    pub fn close(&mut self) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.is_streaming = false;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    phase: Phase,
    input: SubmissionInput,
    mode: UploadMode,
    result: AccumulatedResult,
    active_submission: Option<SubmissionId>,
    next_submission_id: SubmissionId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> &AccumulatedResult {
        &self.result
    }

    pub fn active_submission(&self) -> Option<SubmissionId> {
        self.active_submission
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            mode: self.mode,
            can_submit: self.phase.accepts_submit(),
            jd_chars: self.input.jd_text.chars().count(),
            resume: self.input.resume_file.as_ref().map(|file| ResumeSummary {
                name: file.name().to_string(),
                size_bytes: file.size_bytes(),
            }),
            base_info: self.result.base_info.clone(),
            streamed_text: self.result.streamed_text.clone(),
            final_text: self.result.final_text.clone(),
            error: self.result.error.clone(),
            is_streaming: self.result.is_streaming,
            rule_suggestions: self.result.rule_suggestions.clone(),
            notices: self.result.notices.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a re-render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_jd_text(&mut self, text: String) {
        if self.input.jd_text != text {
            self.input.jd_text = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_resume(&mut self, file: Option<ResumeFile>) {
        self.input.resume_file = file;
        self.mark_dirty();
    }

    pub(crate) fn set_mode(&mut self, mode: UploadMode) {
        if self.mode != mode {
            self.mode = mode;
            self.mark_dirty();
        }
    }

    pub(crate) fn mode(&self) -> UploadMode {
        self.mode
    }

    pub(crate) fn input(&self) -> &SubmissionInput {
        &self.input
    }

    /// Discards the previous result and enters `Validating`.
    pub(crate) fn begin_validation(&mut self) {
        self.result = AccumulatedResult::default();
        self.active_submission = None;
        self.transition(Phase::Validating);
    }

    pub(crate) fn reject(&mut self, message: String) {
        self.result.error = Some(message);
        self.transition(Phase::ValidationFailed);
    }

    /// Allocates a submission id and enters `Submitting`.
    pub(crate) fn dispatch(&mut self) -> SubmissionId {
        self.next_submission_id += 1;
        let id = self.next_submission_id;
        self.active_submission = Some(id);
        self.result = AccumulatedResult::streaming();
        self.transition(Phase::Submitting);
        id
    }

    pub(crate) fn is_current(&self, submission_id: SubmissionId) -> bool {
        self.active_submission == Some(submission_id) && self.phase.is_in_flight()
    }

    pub(crate) fn open_stream(&mut self) {
        if self.phase == Phase::Submitting {
            self.transition(Phase::Streaming);
        }
    }

    pub(crate) fn apply_event(&mut self, event: StreamEvent) {
        // A body may start producing events before the opened notice is seen.
        self.open_stream();
        if self.result.apply(event) {
            self.mark_dirty();
        }
        if !self.result.is_streaming {
            self.transition(Phase::Completed);
        }
    }

    pub(crate) fn close_stream(&mut self) {
        self.result.close();
        self.transition(Phase::Completed);
    }

    pub(crate) fn fail_stream(&mut self, message: String) {
        self.result.fail(message);
        self.transition(Phase::StreamFailed);
    }

    fn transition(&mut self, next: Phase) {
        if self.phase != next {
            engine_info!("Phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
        self.mark_dirty();
    }
}
