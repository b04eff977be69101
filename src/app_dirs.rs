use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typetick";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where stored values (config, history) live.
    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME)
            .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
    }

    /// Where the log file goes: `$HOME/.local/state/typetick` when `HOME` is set.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().join("state"))
        }
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(format!("{APP_NAME}.log")))
    }
}
