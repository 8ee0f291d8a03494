use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(
    name = "scorer",
    about = "Score a resume against a job description and stream the service's advice"
)]
pub struct Cli {
    /// Base address of the scoring service
    #[arg(
        long,
        global = true,
        env = "SCORER_API_URL",
        default_value = "http://localhost:8080"
    )]
    pub api_url: String,

    /// Upper bound in seconds for a whole request, streamed body included
    #[arg(long, global = true, default_value_t = 600)]
    pub timeout_secs: u64,

    /// Where log records go
    #[arg(long, global = true, value_enum, default_value_t = LogDestination::File)]
    pub log_dest: LogDestination,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a resume and job description and render the scoring result
    Score(ScoreArgs),
    /// Check that the scoring service is reachable
    Health,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Resume file (.txt / .pdf / .doc / .docx, at most 10 MiB)
    #[arg(long)]
    pub resume: PathBuf,

    /// Job description text
    #[arg(long, conflicts_with = "jd_file", required_unless_present = "jd_file")]
    pub jd: Option<String>,

    /// File containing the job description text
    #[arg(long)]
    pub jd_file: Option<PathBuf>,

    /// Use the one-shot endpoint instead of the streaming one
    #[arg(long)]
    pub blocking: bool,

    /// Write a Markdown report of the result to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}
