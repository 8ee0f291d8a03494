//! Event vocabulary of the scoring stream and classification of `data: ` payloads.

use serde::Deserialize;
use serde_json::Value;

/// Discriminator field carried by every payload object.
const KIND_FIELD: &str = "type";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BaseInfo {
    pub total_score: Option<f64>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Score and skill match summary; replaces any earlier one.
    BaseInfo(BaseInfo),
    /// Incremental fragment of the generated advice.
    ContentChunk { text: String },
    /// Rule-based suggestion sent when the service runs without a language model.
    RuleSuggestion { text: String },
    /// Non-fatal, in-band error reported by the producer.
    Notice { message: String },
    /// The producer finished the generation.
    End,
}

/// Result of classifying one event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadOutcome {
    Event(StreamEvent),
    /// Not a JSON object, or a known kind whose fields have the wrong shape.
    Malformed(String),
    /// Well-formed object whose kind is missing or not one we handle.
    Unrecognized(Option<String>),
}

#[derive(Deserialize)]
struct BaseInfoPayload {
    #[serde(default)]
    total_score: Option<f64>,
    #[serde(default)]
    matched_skills: Option<Vec<String>>,
    #[serde(default)]
    missing_skills: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ContentPayload {
    content: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
}

/// Parses the text after the `data: ` prefix and classifies it by its `type` field.
pub fn classify_payload(payload: &str) -> PayloadOutcome {
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => return PayloadOutcome::Malformed(err.to_string()),
    };
    let Some(object) = value.as_object() else {
        return PayloadOutcome::Malformed("payload is not an object".to_string());
    };
    let kind = match object.get(KIND_FIELD) {
        Some(Value::String(kind)) => kind.clone(),
        Some(_) | None => return PayloadOutcome::Unrecognized(None),
    };

    let parsed = match kind.as_str() {
        "base_info" => serde_json::from_value::<BaseInfoPayload>(value).map(|p| {
            StreamEvent::BaseInfo(BaseInfo {
                total_score: p.total_score,
                matched_skills: p.matched_skills.unwrap_or_default(),
                missing_skills: p.missing_skills.unwrap_or_default(),
            })
        }),
        "stream_content" => serde_json::from_value::<ContentPayload>(value)
            .map(|p| StreamEvent::ContentChunk { text: p.content }),
        "rule_suggestion" => serde_json::from_value::<ContentPayload>(value)
            .map(|p| StreamEvent::RuleSuggestion { text: p.content }),
        "error" => serde_json::from_value::<ErrorPayload>(value).map(|p| StreamEvent::Notice {
            message: p
                .message
                .unwrap_or_else(|| "producer reported an error".to_string()),
        }),
        "end" => Ok(StreamEvent::End),
        _ => return PayloadOutcome::Unrecognized(Some(kind)),
    };

    match parsed {
        Ok(event) => PayloadOutcome::Event(event),
        Err(err) => PayloadOutcome::Malformed(format!("{kind}: {err}")),
    }
}

/// Response of the non-streaming upload endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreReport {
    pub total_score: f64,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub llm_used: bool,
}

impl ScoreReport {
    /// Expresses the one-shot report as the event sequence a stream would carry.
    pub fn into_events(self) -> Vec<StreamEvent> {
        let mut events = vec![StreamEvent::BaseInfo(BaseInfo {
            total_score: Some(self.total_score),
            matched_skills: self.matched_skills,
            missing_skills: self.missing_skills,
        })];
        if !self.suggestions.is_empty() {
            events.push(StreamEvent::ContentChunk {
                text: self.suggestions.join("\n"),
            });
        }
        events.push(StreamEvent::End);
        events
    }
}
