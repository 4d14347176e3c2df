//! Append-only event log.
//!
//! One timestamped line per processed event or lifecycle marker. Each line
//! is written with a single append-mode write, so concurrent appends never
//! interleave and a crash cannot damage earlier lines.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{error, info};

/// Shared handle to the event log file.
#[derive(Clone, Debug)]
pub struct EventLog {
    path: PathBuf,
    file: Arc<File>,
}

impl EventLog {
    /// Open the log for appending, creating it and its parent directories.
    pub async fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let open_path = path.clone();

        let file = tokio::task::spawn_blocking(move || -> io::Result<File> {
            if let Some(parent) = open_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            OpenOptions::new().create(true).append(true).open(&open_path)
        })
        .await
        .map_err(io::Error::other)??;

        Ok(Self {
            path,
            file: Arc::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a timestamped line and mirror it to stdout.
    ///
    /// Never fails: write errors are reported on stderr and in the trace.
    pub async fn append(&self, line: &str) {
        let stamped = format_line(line);
        println!("{}", stamped.trim_end());

        let file = Arc::clone(&self.file);
        let bytes = stamped.into_bytes();
        let result = tokio::task::spawn_blocking(move || (&*file).write_all(&bytes))
            .await
            .map_err(io::Error::other)
            .and_then(|r| r);

        match result {
            Ok(()) => info!(log_file = %self.path.display(), line = %line, "event_logged"),
            Err(e) => {
                eprintln!("failed to write event log {}: {}", self.path.display(), e);
                error!(log_file = %self.path.display(), error = %e, "event_log_write_failed");
            }
        }
    }
}

/// `[<rfc3339 timestamp>] <line>\n`, with embedded newlines flattened.
fn format_line(line: &str) -> String {
    let flat = line.replace(['\r', '\n'], " ");
    format!(
        "[{}] {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        flat
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("nested").join("events.log");

        let log = EventLog::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(log.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_append_preserves_prior_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.log");
        std::fs::write(&path, "existing line\n").unwrap();

        let log = EventLog::open(&path).await.unwrap();
        log.append("first").await;
        log.append("second").await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing line");
        assert!(lines[1].starts_with('['));
        assert!(lines[1].ends_with("] first"));
        assert!(lines[2].ends_with("] second"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::open(dir.path().join("events.log")).await.unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&format!("event {i}")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 50);
        assert!(content.lines().all(|l| l.starts_with('[') && l.contains("] event ")));
    }

    #[test]
    fn test_format_line_flattens_newlines() {
        let line = format_line("a\nb\r\nc");
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with("] a b  c\n"));
    }
}
