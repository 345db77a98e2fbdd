//! Core types for the DBC log decoder library
//!
//! This module defines the frames the decoder consumes and the decoded frames it
//! emits. The decoder is stateless across frames: every frame is decoded on its own
//! against the read-only signal database.

use chrono::NaiveTime;
use serde::Serialize;
use std::collections::HashMap;

/// Timestamp type used by the trace reader
pub type Timestamp = NaiveTime;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Raw CAN frame read from a trace log
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    /// Time of day, truncated to 100 µs
    pub timestamp: Timestamp,
    /// CAN channel number
    pub channel: u8,
    /// CAN message ID exactly as logged
    pub can_id: u32,
    /// Frame data bytes
    pub data: Vec<u8>,
}

impl CanFrame {
    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Errors that can occur while loading inputs
///
/// Decoding itself never fails: malformed schema lines are skipped and
/// unknown frames are dropped. Only the file boundary reports errors.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to parse log file: {0}")]
    LogParseError(String),

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One decoded frame - the primary output of the decoder
///
/// `timestamp` is carried through untouched; the decoder never looks at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedFrame<T> {
    /// Caller-supplied timestamp token
    pub timestamp: T,
    /// CAN message ID the frame was looked up with
    pub can_id: u32,
    /// Message name from the DBC
    pub message_name: String,
    /// Physical value per active signal
    pub signals: HashMap<String, f64>,
}

impl<T> DecodedFrame<T> {
    /// Physical value of a signal, if it was active in this frame
    pub fn signal(&self, name: &str) -> Option<f64> {
        self.signals.get(name).copied()
    }

    /// Replace the timestamp token, keeping the decoded content
    pub fn with_timestamp<U>(self, timestamp: U) -> DecodedFrame<U> {
        DecodedFrame {
            timestamp,
            can_id: self.can_id,
            message_name: self.message_name,
            signals: self.signals,
        }
    }
}
