//! Progress of one transfer attempt (bytes done, rate, ETA) and size formatting.
//!
//! Pure computation; the engine owns the value and hands out copies.

use std::time::{Duration, Instant};

/// Lower bound on elapsed time used for rate computation.
const MIN_ELAPSED_SECS: f64 = 1e-3;

/// Snapshot of one transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferState {
    /// Bytes in the staging file, including those carried over from a previous attempt.
    pub bytes_transferred: u64,
    /// Expected final size; 0 when the server did not declare a length.
    pub total_bytes: u64,
    /// Start of the current attempt.
    pub started_at: Instant,
}

impl TransferState {
    pub fn new(bytes_transferred: u64, total_bytes: u64, started_at: Instant) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
            started_at,
        }
    }

    /// Fraction complete, or None when the total is unknown.
    pub fn progress_fraction(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        Some(self.bytes_transferred as f64 / self.total_bytes as f64)
    }

    pub fn percent(&self) -> Option<f64> {
        self.progress_fraction().map(|f| f * 100.0)
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Bytes per second measured against the current attempt's clock.
    ///
    /// Bytes resumed from a previous attempt are counted too, so the figure
    /// overstates throughput right after a resume.
    pub fn bytes_per_sec_at(&self, now: Instant) -> f64 {
        let secs = self.elapsed_at(now).as_secs_f64().max(MIN_ELAPSED_SECS);
        self.bytes_transferred as f64 / secs
    }

    /// Estimated seconds remaining (None if the total is unknown or nothing has moved).
    pub fn eta_secs_at(&self, now: Instant) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let remaining = self.total_bytes.saturating_sub(self.bytes_transferred);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec_at(now);
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }
}

const UNITS: [&str; 3] = ["KB", "MB", "GB"];

/// Human-readable size with base-1024 units and one decimal (`"1.5 MB"`).
/// Values under 1024 are printed as whole bytes.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}
