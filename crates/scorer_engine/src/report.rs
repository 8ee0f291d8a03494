use scorer_core::{AppViewModel, Phase};

/// Renders a finished submission as a Markdown document with a front-matter header.
pub fn build_report_markdown(view: &AppViewModel, generated_utc: &str) -> String {
    let score = view
        .base_info
        .as_ref()
        .and_then(|info| info.total_score)
        .map(format_score)
        .unwrap_or_else(|| "n/a".to_string());
    let status = match view.phase {
        Phase::Completed if view.final_text.is_some() => "completed",
        Phase::Completed => "incomplete",
        Phase::StreamFailed => "failed",
        Phase::ValidationFailed => "rejected",
        Phase::Idle | Phase::Validating | Phase::Submitting | Phase::Streaming => "pending",
    };
    let resume = view
        .resume
        .as_ref()
        .map(|r| r.name.as_str())
        .unwrap_or("none");

    let mut doc = format!(
        "---\nresume: {resume}\ngenerated_utc: {generated_utc}\nstatus: {status}\ntotal_score: {score}\n---\n\n# Resume score\n\n"
    );

    if let Some(info) = &view.base_info {
        doc.push_str(&skill_section("Matched skills", &info.matched_skills));
        doc.push_str(&skill_section("Missing skills", &info.missing_skills));
    }
    if !view.rule_suggestions.is_empty() {
        doc.push_str(&skill_section("Suggestions", &view.rule_suggestions));
    }

    // An interrupted stream still reports what arrived.
    let advice = view.final_text.as_deref().unwrap_or(&view.streamed_text);
    if !advice.is_empty() {
        doc.push_str("## Advice\n\n");
        doc.push_str(advice.trim_end());
        doc.push_str("\n\n");
    }
    if !view.notices.is_empty() {
        doc.push_str(&skill_section("Service notices", &view.notices));
    }
    if let Some(error) = &view.error {
        doc.push_str(&format!("## Error\n\n{error}\n"));
    }
    doc
}

/// Scores are integral in practice; print them without a fractional part when possible.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        format!("{score:.1}")
    }
}

fn skill_section(title: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut section = format!("## {title}\n\n");
    for item in items {
        section.push_str("- ");
        section.push_str(item);
        section.push('\n');
    }
    section.push('\n');
    section
}
