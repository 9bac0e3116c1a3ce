use crate::errors::PortalError;
use crate::log_retention::enforce_total_budget;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_DISK_BUDGET_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

static RUN_LOG: Mutex<Option<JsonlLogger>> = Mutex::new(None);

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub ts: u64,
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
        }
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), PortalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PortalError::Io(e.to_string()))?;
        }
        self.rotate_if_oversized()?;

        let truncated = truncate_json(event.payload.clone(), self.max_payload_bytes);
        let line = serde_json::to_string(&LogEvent {
            ts: event.ts,
            level: event.level,
            event_type: event.event_type,
            payload: truncated,
        })
        .map_err(|e| PortalError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PortalError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| PortalError::Io(e.to_string()))?;
        file.write_all(b"\n")
            .map_err(|e| PortalError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            let _ = enforce_total_budget(parent, self.budget_bytes, &self.path)?;
        }

        Ok(())
    }

    /// Moves the active file aside once it holds a quarter of the budget.
    fn rotate_if_oversized(&self) -> Result<(), PortalError> {
        let Ok(meta) = fs::metadata(&self.path) else {
            return Ok(());
        };
        if meta.len() < self.budget_bytes / 4 {
            return Ok(());
        }
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("run");
        let rotated = self
            .path
            .with_file_name(format!("{stem}.{}.jsonl", unix_millis()));
        fs::rename(&self.path, rotated).map_err(|e| PortalError::Io(e.to_string()))
    }
}

/// Installs the process-wide run log used by `append_run_log`.
pub fn init_run_log(logger: JsonlLogger) {
    if let Ok(mut slot) = RUN_LOG.lock() {
        *slot = Some(logger);
    }
}

pub fn disable_run_log() {
    if let Ok(mut slot) = RUN_LOG.lock() {
        *slot = None;
    }
}

/// Best effort: logging never interrupts the session.
pub fn append_run_log(level: &str, event_type: &str, payload: Value) {
    let Ok(slot) = RUN_LOG.lock() else {
        return;
    };
    if let Some(logger) = slot.as_ref() {
        let _ = logger.append(&LogEvent {
            ts: unix_millis(),
            level,
            event_type,
            payload,
        });
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while cut > 0 && !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}

#[cfg(test)]
mod tests {
    use super::{truncate_json, JsonlLogger, LogEvent};
    use serde_json::json;

    #[test]
    fn logger_truncates_large_payloads_and_writes_jsonl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.jsonl");
        let mut logger = JsonlLogger::new(&path);
        logger.max_payload_bytes = 20;
        logger.budget_bytes = 1024 * 1024;

        logger
            .append(&LogEvent {
                ts: 1,
                level: "info",
                event_type: "flow.dispatch",
                payload: json!({"text": "abcdefghijklmnopqrstuvwxyz"}),
            })
            .expect("append");

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"event_type\":\"flow.dispatch\""));
        assert!(text.contains("..."));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn oversized_active_log_is_rotated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.jsonl");
        std::fs::write(&path, vec![b'x'; 300]).expect("seed");
        let mut logger = JsonlLogger::new(&path);
        logger.budget_bytes = 1000;

        logger
            .append(&LogEvent {
                ts: 2,
                level: "info",
                event_type: "session.login",
                payload: json!({}),
            })
            .expect("append");

        let fresh = std::fs::read_to_string(&path).expect("read");
        assert!(fresh.starts_with('{'));
        let files = std::fs::read_dir(dir.path()).expect("dir").count();
        assert_eq!(files, 2);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let value = json!({"name": "ééééééééééééééé"});
        let out = truncate_json(value, 12);
        assert!(out.as_str().expect("string").ends_with("..."));
    }
}
