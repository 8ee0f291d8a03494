use std::io::{self, Write};

use scorer_core::{AppViewModel, BaseInfo, Phase};
use scorer_engine::format_score;

/// Incremental terminal renderer.
///
/// Each call prints only what changed since the previous view: a new phase
/// banner, a replaced base info block, the newly appended suffix of the
/// streamed text, and any new suggestions or notices.
pub struct TerminalRenderer<O: Write, E: Write> {
    out: O,
    err: E,
    last_phase: Phase,
    shown_base_info: Option<BaseInfo>,
    printed_bytes: usize,
    shown_suggestions: usize,
    shown_notices: usize,
}

impl TerminalRenderer<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalRenderer<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            last_phase: Phase::Idle,
            shown_base_info: None,
            printed_bytes: 0,
            shown_suggestions: 0,
            shown_notices: 0,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let phase_changed = view.phase != self.last_phase;
        if phase_changed && view.phase == Phase::Submitting {
            self.reset();
            let resume = view
                .resume
                .as_ref()
                .map(|r| format!("{} ({:.2} MB)", r.name, r.size_bytes as f64 / 1024.0 / 1024.0))
                .unwrap_or_default();
            writeln!(self.out, "Submitting {resume} ...")?;
        }

        if view.base_info.is_some() && view.base_info != self.shown_base_info {
            if let Some(info) = &view.base_info {
                self.render_base_info(info)?;
            }
            self.shown_base_info = view.base_info.clone();
        }

        for suggestion in view.rule_suggestions.iter().skip(self.shown_suggestions) {
            writeln!(self.out, "* {suggestion}")?;
        }
        self.shown_suggestions = view.rule_suggestions.len();

        for notice in view.notices.iter().skip(self.shown_notices) {
            writeln!(self.err, "notice: {notice}")?;
        }
        self.shown_notices = view.notices.len();

        if view.streamed_text.len() > self.printed_bytes {
            write!(self.out, "{}", &view.streamed_text[self.printed_bytes..])?;
            self.printed_bytes = view.streamed_text.len();
        }
        self.out.flush()?;

        if phase_changed {
            self.render_outcome(view)?;
        }
        self.last_phase = view.phase;
        Ok(())
    }

    fn reset(&mut self) {
        self.shown_base_info = None;
        self.printed_bytes = 0;
        self.shown_suggestions = 0;
        self.shown_notices = 0;
    }

    fn render_base_info(&mut self, info: &BaseInfo) -> io::Result<()> {
        match info.total_score {
            Some(score) => writeln!(self.out, "Total score: {}", format_score(score))?,
            None => writeln!(self.out, "Total score: n/a")?,
        }
        if !info.matched_skills.is_empty() {
            writeln!(self.out, "Matched skills: {}", info.matched_skills.join(", "))?;
        }
        if !info.missing_skills.is_empty() {
            writeln!(self.out, "Missing skills: {}", info.missing_skills.join(", "))?;
        }
        writeln!(self.out)
    }

    fn render_outcome(&mut self, view: &AppViewModel) -> io::Result<()> {
        let line_open = !view.streamed_text.is_empty() && !view.streamed_text.ends_with('\n');
        match view.phase {
            Phase::Completed => {
                if line_open {
                    writeln!(self.out)?;
                }
                if view.final_text.is_none() {
                    writeln!(self.err, "warning: the stream ended without a completion marker")?;
                }
            }
            Phase::StreamFailed | Phase::ValidationFailed => {
                if line_open {
                    writeln!(self.out)?;
                }
                if let Some(error) = &view.error {
                    writeln!(self.err, "error: {error}")?;
                }
            }
            Phase::Idle | Phase::Validating | Phase::Submitting | Phase::Streaming => {}
        }
        self.err.flush()
    }
}
