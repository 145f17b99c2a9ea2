use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static RE_TQDM_BAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+%\|[\s\w█▏▎▍▌▋▊▉]*\|").unwrap());
static RE_THROUGHPUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+[kMG]B/s").unwrap());
static RE_ETA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+:\d+<\d+:\d+").unwrap());

const HARMLESS_WARNINGS: [&str; 7] = [
    "RuntimeWarning: 'canvassyncer.__main__' found in sys.modules",
    "this may result in unpredictable behaviour",
    "warn(RuntimeWarning",
    "RuntimeWarning",
    "Warning:",
    "warning:",
    "found in sys.modules after import",
];

const STDOUT_ERROR_MARKERS: [&str; 3] = ["error:", "exception:", "traceback"];

/// Hints shown when the utility dies with a `KeyError`.
pub const KEY_ERROR_HINTS: [&str; 4] = [
    "1. Is the Canvas API token valid?",
    "2. Is the Canvas URL correct?",
    "3. Does the course id exist?",
    "4. Is the network connection working?",
];

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Exited(i32),
    /// Terminated without an exit code (killed by a signal).
    Signaled,
    TimedOut(Duration),
    Cancelled,
}

impl ExitState {
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitState::Exited(code) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("timed out (>{}s)", .0.as_secs())]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("configuration or network problem (KeyError)")]
    KeyError,
    #[error("{0}")]
    Stderr(String),
    #[error("{0}")]
    StdoutError(String),
    #[error("non-zero exit code ({})", display_code(.0))]
    NonZeroExit(Option<i32>),
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// `files_downloaded` is only set when the utility reported a file count.
    Success { files_downloaded: Option<u64> },
    Failure(FailureReason),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success { .. })
    }

    pub fn files_downloaded(&self) -> u64 {
        match self {
            Verdict::Success { files_downloaded } => files_downloaded.unwrap_or(0),
            Verdict::Failure(_) => 0,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Verdict::Failure(reason) => Some(reason),
            Verdict::Success { .. } => None,
        }
    }
}

pub fn is_progress_bar(line: &str) -> bool {
    if line.contains('%') && (line.contains('|') || line.contains('[')) {
        return true;
    }
    RE_TQDM_BAR.is_match(line) || RE_THROUGHPUT.is_match(line) || RE_ETA.is_match(line)
}

pub fn is_harmless_warning(line: &str) -> bool {
    HARMLESS_WARNINGS.iter().any(|pattern| line.contains(pattern))
}

/// Stderr noise that must never be reported as a failure.
pub fn is_benign(line: &str) -> bool {
    is_progress_bar(line) || is_harmless_warning(line)
}

fn count_between(line: &str, prefix: &str, suffix: &str) -> Option<Option<u64>> {
    let (_, rest) = line.split_once(prefix)?;
    let (number, _) = rest.split_once(suffix)?;
    Some(number.trim().parse::<u64>().ok())
}

/// Counts announced by the utility: `Get <n> files!` and
/// `Start to download <n> file(s)!`. The last parseable line of each wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCounts {
    pub found: Option<u64>,
    pub downloaded: Option<u64>,
}

pub fn parse_file_counts<S: AsRef<str>>(stdout: &[S]) -> FileCounts {
    let mut counts = FileCounts::default();
    for line in stdout {
        let line = line.as_ref();
        if let Some(Some(found)) = count_between(line, "Get ", " files!") {
            counts.found = Some(found);
        }
        if let Some(Some(downloaded)) = count_between(line, "Start to download ", " file(s)!") {
            counts.downloaded = Some(downloaded);
        }
    }
    counts
}

pub fn classify<S: AsRef<str>>(stdout: &[S], stderr: &[S], exit: ExitState) -> Verdict {
    match exit {
        ExitState::TimedOut(limit) => return Verdict::Failure(FailureReason::Timeout(limit)),
        ExitState::Cancelled => return Verdict::Failure(FailureReason::Cancelled),
        ExitState::Exited(_) | ExitState::Signaled => {}
    }

    if stdout.iter().any(|line| line.as_ref().contains("KeyError")) {
        return Verdict::Failure(FailureReason::KeyError);
    }

    let stderr_error = stderr
        .iter()
        .map(|line| line.as_ref().trim())
        .find(|line| !line.is_empty() && !is_benign(line));
    if let Some(line) = stderr_error {
        return Verdict::Failure(FailureReason::Stderr(line.to_string()));
    }

    let stdout_error = stdout.iter().map(|line| line.as_ref()).find(|line| {
        let lower = line.to_lowercase();
        STDOUT_ERROR_MARKERS.iter().any(|marker| lower.contains(marker))
    });
    if let Some(line) = stdout_error {
        return Verdict::Failure(FailureReason::StdoutError(line.trim().to_string()));
    }

    let counts = parse_file_counts(stdout);
    if counts.found.unwrap_or(0) > 0 {
        return Verdict::Success {
            files_downloaded: Some(counts.downloaded.unwrap_or(0)),
        };
    }

    match exit.code() {
        Some(0) => Verdict::Success {
            files_downloaded: None,
        },
        code => Verdict::Failure(FailureReason::NonZeroExit(code)),
    }
}
