use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::core::command::DEFAULT_UTILITY;

#[derive(Debug, Parser)]
#[command(
    name = "syncflow",
    version,
    about = "Run canvassyncer over a batch of course configurations"
)]
pub struct Cli {
    /// Single configuration file
    #[arg(
        short = 'p',
        long = "config",
        value_name = "FILE",
        conflicts_with = "dir",
        required_unless_present_any = ["dir", "tui"]
    )]
    pub config: Option<PathBuf>,

    /// Directory of *.json configuration files
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        required_unless_present_any = ["config", "tui"]
    )]
    pub dir: Option<PathBuf>,

    /// Per-course timeout in seconds
    #[arg(
        short = 't',
        long = "timeout",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Log every line the utility prints
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Command used to launch the sync utility
    #[arg(long = "utility", value_name = "CMD", env = "SYNCFLOW_UTILITY", default_value = DEFAULT_UTILITY)]
    pub utility: String,

    /// Start the interactive terminal front-end
    #[arg(long = "tui")]
    pub tui: bool,

    /// Write logs to this file (TUI mode only; the terminal belongs to the UI)
    #[arg(long = "log-file", value_name = "PATH", requires = "tui")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Commands typed into the TUI input box.
#[derive(Debug, Parser)]
#[command(name = "syncflow", disable_help_subcommand = true, disable_version_flag = true)]
pub struct Shell {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum ShellCommand {
    /// Set the Canvas API token
    Token { value: String },
    /// Set the Canvas URL
    Url { value: String },
    /// Replace the course id list
    Courses {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Set the download directory
    Dir { path: String },
    /// File types to download (no arguments clears the list)
    Include { exts: Vec<String> },
    /// File types to skip (no arguments clears the list)
    Exclude { exts: Vec<String> },
    /// Show the configuration being edited
    Show,
    /// Load a configuration file into the editor
    Load { file: PathBuf },
    /// Save the edited configuration
    Save { file: PathBuf },
    /// Per-course timeout in seconds
    Timeout {
        #[arg(value_parser = clap::value_parser!(u64).range(60..=3600))]
        seconds: u64,
    },
    /// Run the edited configuration, or a configuration file
    Run { file: Option<PathBuf> },
    /// Queue every configuration in a directory
    Batch { dir: PathBuf },
    About,
}

pub fn parse_line(line: &str) -> Result<ShellCommand, String> {
    let mut argv = Vec::new();
    argv.push("syncflow".to_string());

    let tokens = shell_words::split(line).map_err(|err| err.to_string())?;
    argv.extend(tokens);

    let parsed = Shell::try_parse_from(argv).map_err(|err| err.to_string())?;
    Ok(parsed.command)
}

pub const HELP_LINES: [&str; 16] = [
    "Commands:",
    "  token <token>            set the Canvas API token",
    "  url <url>                set the Canvas URL",
    "  courses <id>...          set the course ids",
    "  dir <path>               set the download directory",
    "  include [ext...]         file types to download",
    "  exclude [ext...]         file types to skip",
    "  show                     show the current configuration",
    "  load <file> / save <file>",
    "  timeout <60-3600>        per-course timeout in seconds",
    "  run [file]               sync the current configuration or a file",
    "  batch <dir>              queue every *.json in a directory",
    "  about / help / clear / exit",
    "Keys:",
    "  PgUp/PgDn/Up/Down/Home/End scroll the log",
    "  Esc or Ctrl-C quits; Enter or Esc closes a dialog",
];
