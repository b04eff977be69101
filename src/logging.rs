use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

/// Overrides the log file location.
pub const LOG_PATH_ENV: &str = "TYPETICK_LOG";

/// Resolve where logs are written: `$TYPETICK_LOG`, else the state directory.
pub fn log_path() -> Option<PathBuf> {
    std::env::var_os(LOG_PATH_ENV)
        .map(PathBuf::from)
        .or_else(AppDirs::log_path)
}

fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber, appending to the log file.
///
/// The terminal belongs to the UI, so nothing is written to stdout/stderr.
/// When the file cannot be opened logging is disabled. Returns the path in use.
pub fn init(verbose: bool) -> Option<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .ok()?;

    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_overrides_log_path() {
        std::env::set_var(LOG_PATH_ENV, "/tmp/typetick-test.log");
        assert_eq!(log_path(), Some(PathBuf::from("/tmp/typetick-test.log")));
        std::env::remove_var(LOG_PATH_ENV);
    }
}
