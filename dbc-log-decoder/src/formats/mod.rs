//! Log file format parsers
//!
//! Each parser exposes an iterator over [`CanFrame`](crate::types::CanFrame)
//! values read from a log file.

pub mod trace;

// Re-export parser types
pub use trace::{
    format_timestamp, parse_timestamp, TraceFrameIterator, TraceParser, DEFAULT_HEADER_LINES,
};
