use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::core::batch::run_batch;
use crate::core::classifier::{FailureReason, KEY_ERROR_HINTS};
use crate::core::command::UtilityCommand;
use crate::core::config::collect_config_files;
use crate::core::error::SyncError;
use crate::core::event::{classify_log_line, LogLevel, SyncEvent};
use crate::core::formatter::{format_batch_summary, format_course_header};
use crate::core::RunContext;

/// Non-interactive driver: runs every configuration once and returns the
/// process exit code.
pub fn run(cli: &Cli) -> Result<i32, SyncError> {
    let utility = UtilityCommand::parse(&cli.utility)?;
    let ctx = RunContext::new(utility, cli.timeout());

    info!("syncflow starting");
    let files = collect_config_files(cli.config.as_deref(), cli.dir.as_deref())?;
    info!(count = files.len(), "found configuration files");

    let outcome = run_batch(&ctx, &files, &mut log_event);
    for config in outcome.configs.iter().filter(|config| !config.succeeded()) {
        warn!(config = %config.path.display(), "configuration not fully synced");
    }

    info!("{}", format_batch_summary(&outcome.summary));
    Ok(outcome.exit_code())
}

fn log_event(event: SyncEvent) {
    match event {
        SyncEvent::CourseStarted {
            index,
            total,
            course,
        } => info!("{}", format_course_header(index, total, &course)),
        SyncEvent::Command(command) => info!(%command, "running"),
        SyncEvent::Line { stream, text } => match classify_log_line(stream, &text) {
            LogLevel::Error => warn!("{text}"),
            LogLevel::Output | LogLevel::Info => debug!(?stream, "{text}"),
        },
        SyncEvent::CourseFinished(invocation) => {
            if invocation.verdict.failure() == Some(&FailureReason::KeyError) {
                for hint in KEY_ERROR_HINTS {
                    info!("{hint}");
                }
            }
        }
        SyncEvent::ConfigStarted { .. } | SyncEvent::ConfigFinished { .. } => {}
    }
}
