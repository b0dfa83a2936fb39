use std::path::Path;

use serde::Deserialize;

/// Client configuration, read from a TOML file next to the executable.
/// Every field has a default so a missing or partial file still works.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Uploads are allowed to take longer than ordinary requests.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Delay between history polls.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// When false, scheduled polls are deferred while a submission is in
    /// flight. Forced polls after a submission always run.
    #[serde(default = "default_poll_during_submission")]
    pub poll_during_submission: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
    /// How many trailing history entries accompany a chat request.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_thinking_indicator")]
    pub thinking_indicator: String,
    #[serde(default = "default_upload_indicator")]
    pub upload_indicator: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    /// Directory for session logs. Defaults to "logs" in the working
    /// directory when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    120
}

fn default_interval_ms() -> u64 {
    2500
}

fn default_poll_during_submission() -> bool {
    true
}

fn default_history_window() -> usize {
    10
}

fn default_thinking_indicator() -> String {
    "Assistant is thinking...".to_string()
}

fn default_upload_indicator() -> String {
    "Analyzing image...".to_string()
}

fn default_logging_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            poll_during_submission: default_poll_during_submission(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            thinking_indicator: default_thinking_indicator(),
            upload_indicator: default_upload_indicator(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            directory: None,
        }
    }
}

impl Config {
    /// Read configuration from a TOML file, falling back to defaults when the
    /// file is missing or malformed. Runs before tracing is set up, so
    /// problems go to stderr.
    pub fn load(path: &Path) -> Config {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("[client] Failed to parse {}: {e}", path.display());
                    Config::default()
                }
            },
            Err(_) => {
                eprintln!(
                    "[client] {} not found, using default configuration",
                    path.display()
                );
                Config::default()
            }
        }
    }
}
