//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use shelver_core::pattern::Placeholder;
use shelver_core::{OrganizerConfig, PlacementMode, UnknownPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Organize recognized audio files into a library tree built from their metadata.
///
/// Runs as a dry run unless --apply is given. A JSON report is written either way.
#[derive(Debug, Parser)]
#[command(author, version, name = "shelver", after_long_help = placeholder_help())]
pub struct Args {
    /// JSON mapping from source path to recognition metadata
    #[arg(short, long, value_name = "MAPPING", value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Root of the destination library
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dest_root: Option<PathBuf>,

    /// Destination pattern, e.g. "%A/%L/%Y - %S"
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Perform the copies or moves instead of only reporting them
    #[arg(long)]
    pub apply: bool,

    /// Move sources instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,

    /// Render unknown values as "Unknown ..." labels instead of dropping them
    #[arg(long)]
    pub keep_unknowns: bool,

    /// Literal inserted before the source name of a distinct duplicate
    #[arg(long, value_name = "TOKEN")]
    pub duplicate_token: Option<String>,

    /// Where to write the JSON report
    #[arg(long, visible_alias = "duplicates-json", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "SHELVER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of files fingerprinted concurrently
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Hash copied bytes and compare them to the source
    #[arg(long)]
    pub verify: bool,

    /// Log every planned and performed operation
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// The placeholder table shown after `--help`.
fn placeholder_help() -> String {
    let mut help = String::from("Pattern placeholders:\n");
    for placeholder in Placeholder::ALL {
        help.push_str(&format!("  {placeholder}  {}\n", placeholder.description()));
    }
    help
}

impl Args {
    /// Overlays the command line onto a loaded configuration.
    ///
    /// Boolean flags can only switch behavior on; leaving one off keeps
    /// whatever the file or environment chose.
    pub fn apply_to(&self, config: &mut OrganizerConfig) {
        if let Some(dest_root) = &self.dest_root {
            config.dest_root = dest_root.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if self.apply {
            config.apply = true;
        }
        if self.move_files {
            config.mode = PlacementMode::Move;
        }
        if self.keep_unknowns {
            config.unknowns = UnknownPolicy::Keep;
        }
        if let Some(token) = &self.duplicate_token {
            config.duplicate_token = token.clone();
        }
        if let Some(report) = &self.report {
            config.report_path = report.clone();
        }
        if let Some(jobs) = self.jobs {
            config.fingerprint_concurrency = jobs;
        }
        if self.verify {
            config.verify_copies = true;
        }
    }
}
