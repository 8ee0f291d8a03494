use crate::{BaseInfo, Phase, UploadMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeSummary {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub mode: UploadMode,
    /// Whether the submit control is enabled.
    pub can_submit: bool,
    pub jd_chars: usize,
    pub resume: Option<ResumeSummary>,
    pub base_info: Option<BaseInfo>,
    pub streamed_text: String,
    pub final_text: Option<String>,
    pub error: Option<String>,
    pub is_streaming: bool,
    pub rule_suggestions: Vec<String>,
    pub notices: Vec<String>,
    pub dirty: bool,
}
