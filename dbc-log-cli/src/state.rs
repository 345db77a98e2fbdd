//! Signal state between frames
//!
//! Keeps the last decoded value of every output column and decides when a
//! resampled row is due.

use chrono::Duration;
use dbc_log_decoder::{DecodedFrame, Timestamp};
use std::collections::HashMap;

/// Last known value per column, plus the sample-rate gate
pub struct HeldValues {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<Option<f64>>,
    sample_interval: Duration,
    last_write: Option<Timestamp>,
}

impl HeldValues {
    /// Track `columns`, writing at most one row per `sample_rate_ms`
    pub fn new(columns: &[String], sample_rate_ms: u64) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            columns: columns.to_vec(),
            index,
            values: vec![None; columns.len()],
            sample_interval: i64::try_from(sample_rate_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX),
            last_write: None,
        }
    }

    /// Take the signals of a frame; columns absent from it keep their value
    pub fn update<T>(&mut self, frame: &DecodedFrame<T>) {
        for (name, value) in &frame.signals {
            if let Some(&i) = self.index.get(name) {
                self.values[i] = Some(*value);
            }
        }
    }

    /// Whether a row at `timestamp` should be written; records it if so
    ///
    /// The first row is always due. Later rows need at least the sample
    /// interval since the last written row, so time going backwards writes
    /// nothing until it catches up.
    pub fn due(&mut self, timestamp: Timestamp) -> bool {
        let due = match self.last_write {
            None => true,
            Some(last) => timestamp.signed_duration_since(last) >= self.sample_interval,
        };
        if due {
            self.last_write = Some(timestamp);
        }
        due
    }

    /// Current values in column order
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
