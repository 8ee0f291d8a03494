use crate::{RequestBody, SubmissionId, UploadMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit {
        submission_id: SubmissionId,
        request: RequestBody,
        mode: UploadMode,
    },
    Cancel { submission_id: SubmissionId },
}
