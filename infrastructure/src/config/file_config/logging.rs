//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where logs go.
///
/// ```toml
/// [logging]
/// run_event_log = true
/// dir = "~/.local/share/diligence/logs"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write the JSONL run event audit trail.
    pub run_event_log: bool,
    /// Log directory for the run event log and the rolling diagnostic log.
    /// Defaults to the platform data directory.
    pub dir: Option<String>,
}

impl FileLoggingConfig {
    /// Resolved log directory (`~` expanded).
    pub fn log_dir(&self) -> Option<PathBuf> {
        match &self.dir {
            Some(dir) => Some(expand_home(dir)),
            None => dirs::data_local_dir().map(|d| d.join("diligence").join("logs")),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
