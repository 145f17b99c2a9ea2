use std::path::PathBuf;
use std::time::Duration;

use crate::core::classifier::{ExitState, Verdict};
use crate::core::config::CourseId;

/// State of the configuration run shown by the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Finished,
    Failed,
}

/// One launch of the sync utility for one course. The child has always been
/// reaped by the time a record exists.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub course: CourseId,
    pub config_path: PathBuf,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub exit: ExitState,
    pub elapsed: Duration,
    pub verdict: Verdict,
}
