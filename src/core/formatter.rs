use std::path::Path;
use std::time::Duration;

use crate::core::classifier::{FailureReason, Verdict, KEY_ERROR_HINTS};
use crate::core::config::CourseConfig;
use crate::core::event::{classify_log_line, LogLevel, StreamKind, SyncEvent};
use crate::core::job::Invocation;
use crate::core::summary::RunSummary;

pub fn format_course_header(index: usize, total: usize, course: &impl std::fmt::Display) -> String {
    format!("=== Course {index}/{total}: ID {course} ===")
}

pub fn format_stream_line(stream: StreamKind, line: &str) -> String {
    match classify_log_line(stream, line) {
        LogLevel::Output => line.to_string(),
        LogLevel::Info => format!("info: {line}"),
        LogLevel::Error => format!("error: {line}"),
    }
}

/// Result lines for one course; a KeyError adds the diagnostic checklist.
pub fn format_invocation(invocation: &Invocation) -> Vec<String> {
    let course = &invocation.course;
    match invocation.verdict.failure() {
        None => {
            let mut line = format!("Course {course} synced");
            if let Some(files) = reported_files(invocation) {
                line.push_str(&format!(", {files} file(s) downloaded"));
            }
            line.push_str(&format!(" in {}", format_duration(invocation.elapsed)));
            vec![line]
        }
        Some(FailureReason::KeyError) => {
            let mut lines = vec![
                format!("error: course {course}: configuration or network problem"),
                "Please check:".to_string(),
            ];
            lines.extend(KEY_ERROR_HINTS.iter().map(|hint| hint.to_string()));
            lines
        }
        Some(reason) => vec![format!("Course {course} failed: {reason}")],
    }
}

fn reported_files(invocation: &Invocation) -> Option<u64> {
    match invocation.verdict {
        Verdict::Success { files_downloaded } => files_downloaded,
        _ => None,
    }
}

pub fn format_config_summary(path: &Path, summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        format!("=== Finished {} ===", display_name(path)),
        format!("Courses: {}", summary.total()),
        format!("Succeeded: {}", summary.succeeded),
    ];
    if summary.failed > 0 {
        lines.push(format!("Failed: {}", summary.failed));
    }
    lines.push(format!("Files downloaded: {}", summary.files_downloaded));
    lines
}

pub fn format_batch_summary(summary: &RunSummary) -> String {
    format!(
        "Done: {}/{} configurations synced, {} file(s) downloaded",
        summary.succeeded,
        summary.total(),
        summary.files_downloaded
    )
}

/// Log-panel rendering of an event, empty when it has nothing to show.
pub fn format_event(event: &SyncEvent) -> Vec<String> {
    match event {
        SyncEvent::ConfigStarted { path, courses } => vec![format!(
            "Syncing {} course(s) from {}",
            courses,
            display_name(path)
        )],
        SyncEvent::CourseStarted {
            index,
            total,
            course,
        } => vec![format_course_header(*index, *total, course)],
        SyncEvent::Command(command) => vec![format!("$ {command}")],
        SyncEvent::Line { stream, text } => vec![format_stream_line(*stream, text)],
        SyncEvent::CourseFinished(invocation) => format_invocation(invocation),
        SyncEvent::ConfigFinished {
            path,
            summary,
            error,
        } => match error {
            Some(message) if summary.total() == 0 => {
                vec![format!("error: {}: {message}", display_name(path))]
            }
            Some(message) => {
                let mut lines = format_config_summary(path, summary);
                lines.push(format!("error: {message}"));
                lines
            }
            None => format_config_summary(path, summary),
        },
    }
}

/// Editor view of a configuration; the token is masked.
pub fn format_config(config: &CourseConfig) -> Vec<String> {
    let join = |ids: Vec<String>| {
        if ids.is_empty() {
            "-".to_string()
        } else {
            ids.join(", ")
        }
    };
    let token = match config.token.as_deref() {
        Some(token) if !token.is_empty() => mask(token),
        _ => "-".to_string(),
    };
    vec![
        format!("Token        : {token}"),
        format!("Canvas URL   : {}", config.site_url().unwrap_or("-")),
        format!(
            "Courses      : {}",
            join(config.courses().iter().map(|id| id.to_string()).collect())
        ),
        format!(
            "Download dir : {}",
            config.download_dir().unwrap_or("-")
        ),
        format!(
            "Includes     : {}",
            join(config.string_list("includes"))
        ),
        format!(
            "Excludes     : {}",
            join(config.string_list("excludes"))
        ),
    ]
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if token.chars().count() <= 4 {
        "*".repeat(token.chars().count())
    } else {
        format!("****{visible}")
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
