//! Client event log.
//!
//! One line per request lifecycle event, prefixed with an RFC 3339
//! timestamp. Logging is best-effort: a missing home directory or an
//! unwritable file never interrupts the session.

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;

/// Append-only line logger. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    /// Log to the given file. `None` discards every message.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// A log that writes nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn log(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };

        if let Some(parent) = path.parent()
            && create_dir_all(parent).is_err()
        {
            return;
        }

        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };

        let line = message.replace(['\r', '\n'], " ");
        let _ = writeln!(file, "{} {}", Utc::now().to_rfc3339(), line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("client.log");
        let log = EventLog::new(Some(path.clone()));

        log.log("request 1 started");
        log.log("request 1\ncompleted");

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" request 1 started"));
        assert!(lines[1].ends_with(" request 1 completed"));
    }

    #[test]
    fn disabled_log_is_silent() {
        EventLog::disabled().log("nothing happens");
    }
}
