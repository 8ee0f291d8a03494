#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the job description text.
    JdTextChanged(String),
    /// User picked (or cleared) the resume file.
    ResumeSelected(Option<crate::ResumeFile>),
    /// User switched between the streaming and one-shot endpoints.
    ModeChanged(crate::UploadMode),
    /// User clicked the submit button.
    SubmitClicked,
    /// User abandoned the in-flight submission.
    CancelClicked,
    /// The service accepted the request and the response body is readable.
    StreamOpened { submission_id: crate::SubmissionId },
    /// One decoded event from the response body.
    StreamEvent {
        submission_id: crate::SubmissionId,
        event: crate::StreamEvent,
    },
    /// The response body ended.
    StreamClosed { submission_id: crate::SubmissionId },
    /// The request or the response body failed.
    StreamFailed {
        submission_id: crate::SubmissionId,
        message: String,
    },
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
