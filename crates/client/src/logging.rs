use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::config::LoggingConfig;

/// Plain-text record of completed exchanges, one file per session.
/// Failures are swallowed: logging must never take the client down.
pub(crate) struct ExchangeLog {
    path: PathBuf,
}

impl ExchangeLog {
    /// Create the session file with a header. Returns `None` when logging is
    /// disabled or the file cannot be created.
    pub(crate) fn create(config: &LoggingConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let dir = config
            .directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));
        fs::create_dir_all(&dir).ok()?;

        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("session_{timestamp}.txt"));

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .ok()?;
        let header = format!(
            "=== Chat Session ===\nDate: {}\n====================\n\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        file.write_all(header.as_bytes()).ok()?;

        Some(Self { path })
    }

    /// Append one user/assistant pair after a successful round trip.
    pub(crate) fn log_exchange(&self, user_line: &str, assistant_line: &str) {
        let mut file = match OpenOptions::new().append(true).open(&self.path) {
            Ok(file) => file,
            Err(_) => return,
        };

        let now = Local::now().format("%H:%M:%S");
        let entry =
            format!("[{now}] You:\n{user_line}\n\n[{now}] Assistant:\n{assistant_line}\n\n");
        let _ = file.write_all(entry.as_bytes());
    }
}
