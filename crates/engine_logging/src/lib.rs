#![deny(missing_docs)]
//! Shared logging utilities for the scorer workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread submission context that tags log lines, and a minimal test
//! initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the submission currently being processed.
    static SUBMISSION: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Sets the submission id for the current thread.
/// Pass `None` once the thread is no longer working on a submission.
pub fn set_submission_context(submission_id: Option<u64>) {
    SUBMISSION.with(|v| v.set(submission_id));
}

/// Retrieves the submission id for the current thread, if any.
pub fn submission_context() -> Option<u64> {
    SUBMISSION.with(|v| v.get())
}

/// Formats the log prefix for the current thread's submission context.
///
/// Returns an empty string when no submission is active.
pub fn context_prefix() -> String {
    match submission_context() {
        Some(id) => format!("[submission {id}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
