use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod batch;
pub mod classifier;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod formatter;
pub mod job;
pub mod runner;
pub mod summary;

use command::UtilityCommand;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything a driver hands to the batch layer: which utility to launch,
/// how long one invocation may take, and the shutdown flag.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub utility: UtilityCommand,
    pub timeout: Duration,
    cancel: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new(utility: UtilityCommand, timeout: Duration) -> Self {
        Self {
            utility,
            timeout,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Asks every in-flight invocation sharing this context to stop.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(UtilityCommand::default(), DEFAULT_TIMEOUT)
    }
}
