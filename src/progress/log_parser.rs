//! Parse progress log lines back into records and summarize delay comparisons.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::progress_log::{DELAY_COMPARISON_CHANNEL, ProgressRecord};

/// Buffer size for reading log files (8KB).
const BUFFER_SIZE: usize = 8 * 1024;

/// Parse a progress log line.
///
/// Returns `None` for lines that do not follow the
/// `<RFC3339 timestamp> [<channel>] <payload>` layout.
pub fn parse_line(line: &str) -> Option<ProgressRecord> {
    let (timestamp_str, rest) = line.split_once(' ')?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp_str).ok()?.with_timezone(&Utc);
    let (channel, payload) = extract_channel(rest)?;
    Some(ProgressRecord {
        channel,
        timestamp,
        payload: payload.to_string(),
    })
}

/// Extract the channel from a message with format `[N] ...`.
fn extract_channel(message: &str) -> Option<(u32, &str)> {
    let trimmed = message.trim_start();
    if !trimmed.starts_with('[') {
        return None;
    }

    let end_bracket = trimmed.find(']')?;
    let channel: u32 = trimmed[1..end_bracket].parse().ok()?;
    Some((channel, trimmed[end_bracket + 1..].trim_start()))
}

/// Parse a `<baseline_ms>,<external_ms>` payload.
pub fn parse_comparison(payload: &str) -> Option<(f64, f64)> {
    let (baseline, external) = payload.split_once(',')?;
    Some((baseline.trim().parse().ok()?, external.trim().parse().ok()?))
}

/// Aggregate statistics over baseline/external delay pairs (milliseconds).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonSummary {
    pub samples: usize,
    pub mean_baseline_ms: f64,
    pub mean_external_ms: f64,
    pub mean_abs_diff_ms: f64,
    pub max_abs_diff_ms: f64,
}

impl ComparisonSummary {
    /// Summarize the comparison-channel records, skipping anything else.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ProgressRecord>) -> Self {
        let mut summary = ComparisonSummary::default();
        let mut baseline_sum = 0.0;
        let mut external_sum = 0.0;
        let mut diff_sum = 0.0;

        for record in records {
            if record.channel != DELAY_COMPARISON_CHANNEL {
                continue;
            }
            let Some((baseline, external)) = parse_comparison(&record.payload) else {
                log::debug!("Skipping malformed comparison payload: {}", record.payload);
                continue;
            };
            let diff = (external - baseline).abs();
            summary.samples += 1;
            baseline_sum += baseline;
            external_sum += external;
            diff_sum += diff;
            summary.max_abs_diff_ms = summary.max_abs_diff_ms.max(diff);
        }

        if summary.samples > 0 {
            let n = summary.samples as f64;
            summary.mean_baseline_ms = baseline_sum / n;
            summary.mean_external_ms = external_sum / n;
            summary.mean_abs_diff_ms = diff_sum / n;
        }
        summary
    }
}

impl std::fmt::Display for ComparisonSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} samples, mean baseline {:.6} ms, mean external {:.6} ms, mean |diff| {:.6} ms, max |diff| {:.6} ms",
            self.samples, self.mean_baseline_ms, self.mean_external_ms, self.mean_abs_diff_ms, self.max_abs_diff_ms
        )
    }
}

/// Read a progress log file and summarize its comparison records.
pub fn load_comparison_log(path: &Path) -> Result<ComparisonSummary, std::io::Error> {
    let reader = BufReader::with_capacity(BUFFER_SIZE, File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(record) => records.push(record),
            None => log::debug!("Skipping unparseable progress line: {}", line),
        }
    }
    Ok(ComparisonSummary::from_records(&records))
}
