//! Audit logging for plugin selections
//!
//! Writes one JSON line per dispatched goal: what the model selected, with
//! which arguments, and how the call ended.

use crate::config::LoggingConfig;
use crate::error::DispatchError;
use crate::plugins::Args;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, warn};
use uuid::Uuid;

/// Session ID for the current process
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Secret patterns for redaction
static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // API keys and tokens
        r#"(?i)(api[_-]?key|token|secret|password|passwd|pwd)\s*[=:]\s*['"]?([^'"\s]+)['"]?"#,
        // Bearer tokens
        r"(?i)bearer\s+[a-zA-Z0-9._-]+",
        // OpenAI-style keys
        r"sk-[a-zA-Z0-9_-]{16,}",
        // AWS keys
        r"AKIA[A-Z0-9]{16}",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: LogEvent,
    /// The user's goal
    pub goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    /// Truncated plugin result or error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEvent {
    /// The model picked a registered plugin
    Selected,
    /// The model declined or named an unknown plugin
    NoSelection,
    /// The plugin returned a result
    Invoked,
    /// Transport, decode or plugin failure
    Error,
}

/// JSON-lines audit logger
pub struct AuditLogger {
    config: LoggingConfig,
    log_file: Option<BufWriter<File>>,
}

impl AuditLogger {
    pub fn new(config: LoggingConfig) -> Self {
        let log_file = config.audit_log.as_deref().and_then(Self::open_log_file);
        Self { config, log_file }
    }

    /// Logger that records nothing
    pub fn disabled() -> Self {
        Self {
            config: LoggingConfig::default(),
            log_file: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.log_file.is_some()
    }

    fn open_log_file(path: &Path) -> Option<BufWriter<File>> {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create log directory: {}", e);
                return None;
            }
        }

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                error!("Failed to open audit log {:?}: {}", path, e);
                None
            }
        }
    }

    /// Log a resolved selection
    pub fn log_selection(&mut self, goal: &str, plugin: &str, args: &Args) {
        let entry = self.entry(LogEvent::Selected, goal, Some(plugin));
        let entry = LogEntry {
            args: Some(self.redact_if_needed(&serde_json::Value::Object(args.clone()).to_string())),
            ..entry
        };
        self.write_entry(&entry);
    }

    /// Log a plugin result
    pub fn log_result(&mut self, goal: &str, plugin: &str, result: &Args, duration_ms: u64) {
        let detail = serde_json::Value::Object(result.clone()).to_string();
        let entry = LogEntry {
            detail: Some(truncate_preview(&self.redact_if_needed(&detail))),
            duration_ms: Some(duration_ms),
            ..self.entry(LogEvent::Invoked, goal, Some(plugin))
        };
        self.write_entry(&entry);
    }

    /// Log a failed call
    pub fn log_error(&mut self, goal: &str, err: &DispatchError, duration_ms: u64) {
        let (event, plugin) = match err {
            DispatchError::NoValidPlugin { plugin } => (LogEvent::NoSelection, plugin.as_deref()),
            DispatchError::Capability { plugin, .. } => (LogEvent::Error, Some(plugin.as_str())),
            _ => (LogEvent::Error, None),
        };

        let entry = LogEntry {
            detail: Some(truncate_preview(&self.redact_if_needed(&err.to_string()))),
            duration_ms: Some(duration_ms),
            ..self.entry(event, goal, plugin)
        };
        self.write_entry(&entry);
    }

    fn entry(&self, event: LogEvent, goal: &str, plugin: Option<&str>) -> LogEntry {
        LogEntry {
            session_id: SESSION_ID.clone(),
            timestamp: Utc::now(),
            event,
            goal: self.redact_if_needed(goal),
            plugin: plugin.map(str::to_string),
            args: None,
            detail: None,
            duration_ms: None,
        }
    }

    fn write_entry(&mut self, entry: &LogEntry) {
        if let Some(ref mut file) = self.log_file {
            match serde_json::to_string(entry) {
                Ok(json) => {
                    if let Err(e) = writeln!(file, "{}", json) {
                        error!("Failed to write log entry: {}", e);
                    }
                    if let Err(e) = file.flush() {
                        warn!("Failed to flush log file: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize log entry: {}", e);
                }
            }
        }
    }

    fn redact_if_needed(&self, text: &str) -> String {
        if self.config.redact_secrets {
            redact_secrets(text)
        } else {
            text.to_string()
        }
    }

    pub fn session_id() -> &'static str {
        &SESSION_ID
    }
}

/// Redact secrets from text
fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();

    for pattern in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    result
}

/// Truncate text for preview, on a char boundary
fn truncate_preview(text: &str) -> String {
    const MAX_PREVIEW: usize = 500;
    if text.len() <= MAX_PREVIEW {
        return text.to_string();
    }

    let mut end = MAX_PREVIEW;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &text[..end])
}
