//! DBC Log Decoder Library
//!
//! A stateless, reusable library for decoding CAN frames into physical values
//! with signal definitions from DBC files.
//!
//! # Architecture
//!
//! - Parses DBC text into a read-only signal database (best effort: malformed
//!   records are skipped, not rejected)
//! - Decodes frame payloads bit by bit, in Intel or Motorola order
//! - Applies the frame-wide sign heuristic, multiplexing, scaling and clamping
//! - Reads text trace logs into CAN frames
//!
//! The library does NOT:
//! - Write CSV or any other output
//! - Resample or hold values between frames
//! - Talk to a live bus
//!
//! All higher-level functionality is in the application layer (dbc-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use dbc_log_decoder::{Decoder, DecoderConfig};
//! use std::path::Path;
//!
//! // Create decoder and load signal definitions
//! let mut decoder = Decoder::new();
//! decoder.add_dbc(Path::new("battery.dbc")).unwrap();
//!
//! // Configure decoder
//! let config = DecoderConfig::new()
//!     .with_header_lines(14)
//!     .with_channel_filter(vec![1]);
//!
//! // Decode log file
//! let frames = decoder.decode_file(Path::new("drive.log"), config).unwrap();
//!
//! for frame in frames {
//!     match frame {
//!         Ok(decoded) => println!("{} at {}", decoded.message_name, decoded.timestamp),
//!         Err(e) => eprintln!("Decode error: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod codec;
pub mod config;
pub mod decoder;
pub mod formats;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::{DatabaseStats, Decoder, DecodingIterator};
pub use message_decoder::MessageDecoder;
pub use signals::{
    ByteOrder, MessageDefinition, MuxRole, SignalDatabase, SignalDefinition, ValueType,
};
pub use types::{CanFrame, DecodedFrame, DecoderError, Result, Timestamp};

// Internal modules
mod message_decoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
