use std::path::PathBuf;

use crate::core::classifier::is_benign;
use crate::core::config::CourseId;
use crate::core::job::Invocation;
use crate::core::summary::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Output,
    Info,
    Error,
}

/// Notifications emitted while a configuration runs, one per produced line
/// plus lifecycle markers. Drivers render them; nothing depends on them.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    ConfigStarted {
        path: PathBuf,
        courses: usize,
    },
    CourseStarted {
        index: usize,
        total: usize,
        course: CourseId,
    },
    Command(String),
    Line {
        stream: StreamKind,
        text: String,
    },
    CourseFinished(Box<Invocation>),
    ConfigFinished {
        path: PathBuf,
        summary: RunSummary,
        error: Option<String>,
    },
}

/// Display level for one line of utility output.
pub fn classify_log_line(stream: StreamKind, line: &str) -> LogLevel {
    match stream {
        StreamKind::Stdout => LogLevel::Output,
        StreamKind::Stderr if is_benign(line) => LogLevel::Info,
        StreamKind::Stderr => LogLevel::Error,
    }
}
