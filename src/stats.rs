//! Counters for a single pass over the license database.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Line and record counts collected while parsing.
#[derive(Debug, Clone)]
pub struct ParseStats {
    /// Total lines read
    pub lines_read: u64,

    /// Lines that matched the `HD` field layout
    pub lines_matched: u64,

    /// Lines that did not match the field layout
    pub malformed_lines: u64,

    /// Matched records with an empty expiration date
    pub missing_expiration: u64,

    /// Matched records with an empty call sign
    pub missing_call_sign: u64,

    /// Records that inserted or moved forward an availability date
    pub records_merged: u64,

    /// Total bytes of raw input processed
    pub bytes_processed: u64,

    start_time: Instant,
}

impl ParseStats {
    /// Create a new counter set.
    pub fn new() -> Self {
        Self {
            lines_read: 0,
            lines_matched: 0,
            malformed_lines: 0,
            missing_expiration: 0,
            missing_call_sign: 0,
            records_merged: 0,
            bytes_processed: 0,
            start_time: Instant::now(),
        }
    }

    /// Get the elapsed time since parsing started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Current lines per second rate.
    pub fn lines_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.lines_read as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Snapshot the counters.
    pub fn summary(&self, call_signs: usize) -> ParseSummary {
        ParseSummary {
            elapsed_secs: self.elapsed().as_secs_f64(),
            lines_read: self.lines_read,
            lines_matched: self.lines_matched,
            malformed_lines: self.malformed_lines,
            missing_expiration: self.missing_expiration,
            missing_call_sign: self.missing_call_sign,
            records_merged: self.records_merged,
            bytes_processed: self.bytes_processed,
            lines_per_second: self.lines_per_second(),
            call_signs,
        }
    }
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a finished parse.
#[derive(Debug, Clone, Serialize)]
pub struct ParseSummary {
    pub elapsed_secs: f64,
    pub lines_read: u64,
    pub lines_matched: u64,
    pub malformed_lines: u64,
    pub missing_expiration: u64,
    pub missing_call_sign: u64,
    pub records_merged: u64,
    pub bytes_processed: u64,
    pub lines_per_second: f64,
    pub call_signs: usize,
}

impl std::fmt::Display for ParseSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Parsed {} lines in {:.1}s ({:.0} lines/sec)",
            self.lines_read, self.elapsed_secs, self.lines_per_second
        )?;
        writeln!(f, "  Matched records: {}", self.lines_matched)?;
        writeln!(f, "  Malformed lines: {}", self.malformed_lines)?;
        writeln!(f, "  No expiration date: {}", self.missing_expiration)?;
        writeln!(f, "  No call sign: {}", self.missing_call_sign)?;
        writeln!(f, "  Dates merged: {}", self.records_merged)?;
        writeln!(f, "  Bytes processed: {} KB", self.bytes_processed / 1024)?;
        write!(f, "  Distinct call signs: {}", self.call_signs)
    }
}
