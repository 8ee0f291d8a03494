use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use engine_logging::{engine_info, set_submission_context};
use scorer_core::{update, AppState, Msg, Phase, ResumeFile, UploadMode, MAX_RESUME_BYTES};
use scorer_engine::{build_report_markdown, probe_health, AtomicFileWriter, UploadSettings};

use crate::cli::{Cli, Command, ScoreArgs};
use crate::effects::EffectRunner;
use crate::render::TerminalRenderer;

/// How long to wait for an engine event before emitting a render tick.
const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub fn run(cli: Cli) -> Result<ExitCode> {
    let settings = UploadSettings {
        request_timeout: Duration::from_secs(cli.timeout_secs),
        ..UploadSettings::with_base_url(cli.api_url)
    };
    match cli.command {
        Command::Health => run_health(settings),
        Command::Score(args) => run_score(settings, args),
    }
}

fn run_health(settings: UploadSettings) -> Result<ExitCode> {
    let base_url = settings.base_url.clone();
    match probe_health(settings) {
        Ok(status) => {
            let model = status.model.as_deref().unwrap_or("none");
            println!(
                "{base_url}: ok={} llm={} model={model}",
                status.ok,
                status.use_llm.unwrap_or(false)
            );
            Ok(if status.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(err) => {
            eprintln!("{base_url}: unreachable ({}): {}", err.kind, err.message);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_score(settings: UploadSettings, args: ScoreArgs) -> Result<ExitCode> {
    let jd_text = match (args.jd, args.jd_file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read job description from {}", path.display()))?,
        (None, None) => String::new(),
    };
    let resume = load_resume(&args.resume)?;

    let runner = EffectRunner::new(settings)?;
    let mut session = Session::new(runner, TerminalRenderer::stdio());
    session.dispatch(Msg::JdTextChanged(jd_text))?;
    session.dispatch(Msg::ResumeSelected(Some(resume)))?;
    if args.blocking {
        session.dispatch(Msg::ModeChanged(UploadMode::Blocking))?;
    }
    session.dispatch(Msg::SubmitClicked)?;

    while session.state.phase().is_in_flight() {
        let msg = session
            .runner
            .poll(TICK_INTERVAL, session.state.active_submission());
        session.dispatch(msg)?;
    }

    let view = session.state.view();
    if let Some(path) = args.report {
        let doc = build_report_markdown(&view, &Utc::now().to_rfc3339());
        let written = AtomicFileWriter
            .write(&path, &doc)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        engine_info!("Report written to {:?}", written);
    }

    Ok(match view.phase {
        Phase::Completed => ExitCode::SUCCESS,
        Phase::ValidationFailed => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    })
}

/// Reads the resume, leaving files over the size limit unread for validation to reject.
fn load_resume(path: &Path) -> Result<ResumeFile> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file path", path.display()))?;
    let size_bytes = fs::metadata(path)
        .with_context(|| format!("failed to read resume {}", path.display()))?
        .len();
    if size_bytes > MAX_RESUME_BYTES {
        return Ok(ResumeFile::unloaded(name, size_bytes));
    }
    let content =
        fs::read(path).with_context(|| format!("failed to read resume {}", path.display()))?;
    Ok(ResumeFile::new(name, content))
}

/// One message loop: state, effect execution and rendering on a single thread.
struct Session<O: Write, E: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer<O, E>,
}

impl<O: Write, E: Write> Session<O, E> {
    fn new(runner: EffectRunner, renderer: TerminalRenderer<O, E>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer,
        }
    }

    fn dispatch(&mut self, msg: Msg) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        set_submission_context(state.active_submission());
        self.runner.enqueue(effects);
        let was_dirty = state.consume_dirty();
        let view = state.view();
        self.state = state;
        if was_dirty {
            self.renderer
                .render(&view)
                .context("failed to write to terminal")?;
        }
        Ok(())
    }
}
