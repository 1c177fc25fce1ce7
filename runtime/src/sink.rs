//! Command event sinks.
//!
//! The core crate defines the [`EventSink`] port; this module provides the
//! concrete destinations the service ships with and the selection from the
//! configured event output ([`sink_for`]).

use pickup_point_core::event::{CommandEvent, EventSink};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::config::ServiceConfig;

/// Writes each event as one JSON line to standard output.
///
/// Delivery problems are logged and swallowed; the dispatched command is
/// never affected by its event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn publish(&self, event: &CommandEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                if let Err(error) = writeln!(handle, "{line}") {
                    tracing::warn!(%error, "Failed to write command event");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to serialize command event");
            }
        }
    }
}

/// Emits each event as a structured tracing record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &CommandEvent) {
        tracing::info!(
            target: "command_events",
            time = %event.time,
            command = %event.command,
            args = %event.args,
            "Command dispatched"
        );
    }
}

/// Appends each event as one JSON line to a file.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) the event file for appending.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn publish(&self, event: &CommandEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(error) = writeln!(file, "{line}") {
                    tracing::warn!(%error, "Failed to write command event");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to serialize command event");
            }
        }
    }
}

/// Select the event sink for a configuration: `stdout` and `tracing` map
/// to their sinks, anything else is treated as a file path.
///
/// # Errors
///
/// Returns the underlying I/O error if a file destination cannot be
/// opened.
pub fn sink_for(config: &ServiceConfig) -> std::io::Result<Box<dyn EventSink>> {
    match config.event_output.as_str() {
        "stdout" => Ok(Box::new(ConsoleSink)),
        "tracing" => Ok(Box::new(TracingSink)),
        path => Ok(Box::new(FileSink::create(Path::new(path))?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn config_with_output(output: &str) -> ServiceConfig {
        ServiceConfig::from_lookup(|name| match name {
            "DATABASE_URL" => Some("postgres://localhost/pickup".to_string()),
            "CACHE_TTL_SECONDS" => Some("60".to_string()),
            "EVENT_OUTPUT" => Some(output.to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn sample_event() -> CommandEvent {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 10, 0, 0).single().unwrap();
        CommandEvent::new("issue-order", &["5".to_string()], now)
    }

    #[test]
    fn test_stdout_and_tracing_outputs_select_without_io() {
        assert!(sink_for(&config_with_output("stdout")).is_ok());
        assert!(sink_for(&config_with_output("tracing")).is_ok());
    }

    #[test]
    fn test_file_output_appends_json_lines() {
        let path = std::env::temp_dir().join(format!(
            "pickup-point-events-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let sink = sink_for(&config_with_output(path.to_str().unwrap())).unwrap();
        sink.publish(&sample_event());
        sink.publish(&sample_event());

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""command":"issue-order""#));

        let _ = std::fs::remove_file(&path);
    }
}
