use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::core::classifier::FailureReason;
use crate::core::config::{load_config, ConfigSchema, CourseConfig};
use crate::core::error::SyncError;
use crate::core::event::SyncEvent;
use crate::core::job::Invocation;
use crate::core::runner::run_invocation;
use crate::core::summary::RunSummary;
use crate::core::RunContext;

/// Result of running every course of one configuration file.
#[derive(Debug)]
pub struct ConfigOutcome {
    pub path: PathBuf,
    pub summary: RunSummary,
    pub invocations: Vec<Invocation>,
    /// Set when the configuration could not be run (or stopped early).
    pub error: Option<SyncError>,
}

impl ConfigOutcome {
    fn failed(path: &Path, error: SyncError) -> Self {
        Self {
            path: path.to_path_buf(),
            summary: RunSummary::default(),
            invocations: Vec::new(),
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.summary.all_succeeded()
    }
}

/// Loads and validates a configuration without running anything.
pub fn prepare_config(path: &Path) -> Result<(CourseConfig, ConfigSchema), SyncError> {
    let config = load_config(path)?;
    let schema = config.validate()?;
    Ok((config, schema))
}

/// Runs every course of the configuration at `path`, one after the other.
pub fn run_config(
    ctx: &RunContext,
    path: &Path,
    on_event: &mut dyn FnMut(SyncEvent),
) -> ConfigOutcome {
    let outcome = match prepare_config(path) {
        Ok((config, schema)) => run_courses(ctx, path, &config, schema, on_event),
        Err(err) => {
            warn!(config = %path.display(), error = %err, "skipping configuration");
            ConfigOutcome::failed(path, err)
        }
    };

    on_event(SyncEvent::ConfigFinished {
        path: outcome.path.clone(),
        summary: outcome.summary,
        error: outcome.error.as_ref().map(|err| err.to_string()),
    });
    outcome
}

fn run_courses(
    ctx: &RunContext,
    path: &Path,
    config: &CourseConfig,
    schema: ConfigSchema,
    on_event: &mut dyn FnMut(SyncEvent),
) -> ConfigOutcome {
    let courses = config.courses();
    let total = courses.len();
    let mut outcome = ConfigOutcome {
        path: path.to_path_buf(),
        summary: RunSummary::default(),
        invocations: Vec::with_capacity(total),
        error: None,
    };

    on_event(SyncEvent::ConfigStarted {
        path: path.to_path_buf(),
        courses: total,
    });
    info!(config = %path.display(), courses = total, "processing configuration");

    for (index, course) in courses.iter().enumerate() {
        if ctx.is_cancelled() {
            outcome.summary.failed += total - index;
            outcome.error = Some(SyncError::Cancelled);
            break;
        }

        on_event(SyncEvent::CourseStarted {
            index: index + 1,
            total,
            course: course.clone(),
        });

        // Legacy configs are split per course; the temp file lives until
        // the end of this iteration, whatever the verdict.
        let temp: Option<NamedTempFile> = match schema {
            ConfigSchema::Single => None,
            ConfigSchema::Legacy => match config.single_course(course).write_temp() {
                Ok(file) => Some(file),
                Err(err) => {
                    warn!(course = %course, error = %err, "could not write course configuration");
                    outcome.summary.record_failure();
                    continue;
                }
            },
        };
        let invocation_path = temp.as_ref().map_or(path, |file| file.path());

        match run_invocation(ctx, course, invocation_path, on_event) {
            Ok(invocation) => {
                log_verdict(&invocation);
                outcome.summary.record(&invocation.verdict);
                on_event(SyncEvent::CourseFinished(Box::new(invocation.clone())));
                outcome.invocations.push(invocation);
            }
            Err(err @ SyncError::UtilityNotFound { .. }) => {
                warn!(error = %err, "sync utility unavailable, abandoning configuration");
                outcome.summary.failed += total - index;
                outcome.error = Some(err);
                break;
            }
            Err(err) => {
                warn!(course = %course, error = %err, "invocation failed");
                outcome.summary.record_failure();
            }
        }

        if let Some(file) = temp {
            let temp_path = file.path().to_path_buf();
            if let Err(err) = file.close() {
                warn!(path = %temp_path.display(), error = %err, "could not delete temporary configuration");
            }
        }
    }

    info!(
        config = %path.display(),
        succeeded = outcome.summary.succeeded,
        failed = outcome.summary.failed,
        files = outcome.summary.files_downloaded,
        "configuration finished"
    );
    outcome
}

fn log_verdict(invocation: &Invocation) {
    debug!(
        course = %invocation.course,
        config = %invocation.config_path.display(),
        exit = ?invocation.exit,
        stdout_lines = invocation.stdout.len(),
        stderr_lines = invocation.stderr.len(),
        "invocation finished"
    );
    match invocation.verdict.failure() {
        None => info!(
            course = %invocation.course,
            files = invocation.verdict.files_downloaded(),
            elapsed = ?invocation.elapsed,
            "course synced"
        ),
        Some(FailureReason::KeyError) => warn!(
            course = %invocation.course,
            "utility raised KeyError: check token, URL, course id and network"
        ),
        Some(reason) => warn!(course = %invocation.course, reason = %reason, "course failed"),
    }
}

/// Outcome of a whole batch; `summary` counts configurations, not courses.
#[derive(Debug)]
pub struct BatchOutcome {
    pub summary: RunSummary,
    pub configs: Vec<ConfigOutcome>,
}

impl BatchOutcome {
    pub fn exit_code(&self) -> i32 {
        self.summary.exit_code()
    }
}

pub fn run_batch(
    ctx: &RunContext,
    paths: &[PathBuf],
    on_event: &mut dyn FnMut(SyncEvent),
) -> BatchOutcome {
    let mut summary = RunSummary::default();
    let mut configs = Vec::with_capacity(paths.len());

    for path in paths {
        let outcome = run_config(ctx, path, on_event);
        summary.record_outcome(outcome.succeeded(), outcome.summary.files_downloaded);
        configs.push(outcome);
    }

    BatchOutcome { summary, configs }
}
