//! Progress log for delay comparison records.
//!
//! Records are kept in a bounded in-memory buffer and, when a file is
//! configured, appended to it as one line each:
//!
//! ```text
//! 2025-10-23T18:00:01Z [0] 1.500000,2.000000
//! ```
//!
//! The bracketed number is the channel index; the comparison records always use
//! channel 0.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Maximum number of records to buffer before they're consumed.
pub const PROGRESS_BUFFER_CAPACITY: usize = 10000;

/// Channel used for baseline/external delay pairs.
pub const DELAY_COMPARISON_CHANNEL: u32 = 0;

/// A single progress log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub channel: u32,
    pub timestamp: DateTime<Utc>,
    pub payload: String,
}

impl ProgressRecord {
    /// Render the record as a log line (without newline).
    pub fn to_line(&self) -> String {
        format!("{} [{}] {}", self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true), self.channel, self.payload)
    }
}

/// Payload of a comparison record: both delays in milliseconds.
pub fn comparison_payload(baseline_ms: f64, external_ms: f64) -> String {
    format!("{:.6},{:.6}", baseline_ms, external_ms)
}

pub struct ProgressLog {
    buffer: VecDeque<ProgressRecord>,
    sink: Option<BufWriter<File>>,
}

impl ProgressLog {
    /// Log that only keeps records in memory.
    pub fn in_memory() -> Self {
        Self {
            buffer: VecDeque::with_capacity(64),
            sink: None,
        }
    }

    /// Log that also appends to `path`, creating it if needed.
    pub fn with_file(path: &Path) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::info!("Writing progress log to {}", path.display());
        Ok(Self {
            buffer: VecDeque::with_capacity(64),
            sink: Some(BufWriter::new(file)),
        })
    }

    /// Append a record. A failing file sink is reported and the record is still
    /// buffered.
    pub fn log(&mut self, channel: u32, payload: String) {
        let record = ProgressRecord {
            channel,
            timestamp: Utc::now(),
            payload,
        };

        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = writeln!(sink, "{}", record.to_line()) {
                log::warn!("Failed to write progress record: {}", e);
            }
        }

        if self.buffer.len() >= PROGRESS_BUFFER_CAPACITY {
            self.buffer.pop_front();
        }
        self.buffer.push_back(record);
    }

    /// Records currently buffered, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drain all buffered records.
    pub fn drain(&mut self) -> Vec<ProgressRecord> {
        self.buffer.drain(..).collect()
    }

    pub fn flush(&mut self) -> Result<(), std::io::Error> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for ProgressLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("Failed to flush progress log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_payload_uses_six_decimals() {
        assert_eq!(comparison_payload(1.5, 2.0), "1.500000,2.000000");
        assert_eq!(comparison_payload(0.0001234, 1000.0), "0.000123,1000.000000");
    }

    #[test]
    fn buffer_is_bounded() {
        let mut log = ProgressLog::in_memory();
        for i in 0..PROGRESS_BUFFER_CAPACITY + 5 {
            log.log(0, i.to_string());
        }
        assert_eq!(log.len(), PROGRESS_BUFFER_CAPACITY);
        assert_eq!(log.records().next().unwrap().payload, "5");
        assert_eq!(log.drain().len(), PROGRESS_BUFFER_CAPACITY);
        assert!(log.is_empty());
    }

    #[test]
    fn file_sink_receives_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.log");
        {
            let mut log = ProgressLog::with_file(&path).unwrap();
            log.log(DELAY_COMPARISON_CHANNEL, comparison_payload(1.5, 2.0));
            log.log(3, "other".to_string());
        }
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" [0] 1.500000,2.000000"));
        assert!(lines[1].ends_with(" [3] other"));
    }
}
