//! # Decode Metrics
//!
//! Timing and size counters reported by the decoder through `tracing`.

use std::time::{Duration, Instant};

/// Summary of one decode call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub input_bytes: usize,
    pub header_bytes: usize,
    pub records: usize,
    pub fields: usize,
    pub symbols: usize,
    pub empty_cells: usize,
    pub elapsed: Duration,
}

impl DecodeStats {
    /// Records decoded per second
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records as f64 / secs
        } else {
            0.0
        }
    }

    /// Log the summary at info level
    pub fn log(&self) {
        tracing::info!(
            input_bytes = self.input_bytes,
            header_bytes = self.header_bytes,
            records = self.records,
            fields = self.fields,
            symbols = self.symbols,
            empty_cells = self.empty_cells,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "QVD decoded"
        );
    }
}

/// Timer for measuring one pipeline stage
pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    /// Start new timer
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop timer, log duration and return it
    pub fn stop(self) -> Duration {
        let duration = self.elapsed();
        tracing::debug!(
            stage = self.name,
            duration_us = duration.as_micros() as u64,
            "Stage completed"
        );
        duration
    }
}
