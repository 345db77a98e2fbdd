//! Signal database and DBC parser
//!
//! This module contains the DBC line parser and the signal database it fills.

pub mod dbc;
pub mod database;

// Re-export key types for convenience
pub use database::{
    mask_id, ByteOrder, DatabaseStats, MessageDefinition, MuxRole, SignalDatabase,
    SignalDefinition, SkippedLine, ValueType, CAN_ID_MASK,
};
pub use dbc::{parse_dbc_file, parse_dbc_lines, parse_dbc_str, LineOutcome, SkipReason};
