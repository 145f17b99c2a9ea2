use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::error::SyncError;

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` for `--verbose`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "syncflow=debug,info" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_stderr(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The TUI owns the terminal, so its logs go to a file or nowhere.
pub fn init_file(path: &Path, verbose: bool) -> Result<(), SyncError> {
    let file = File::create(path).map_err(|source| SyncError::LogFile {
        path: path.to_path_buf(),
        source,
    })?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
