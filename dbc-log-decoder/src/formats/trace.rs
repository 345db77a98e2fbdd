//! Text trace log parser
//!
//! Reads the text traces written by the bus logger:
//!
//! ```text
//! <time> <dir> <channel> <id> <type> <dlc> <byte> <byte> ...
//! 10:15:42:1234 Rx 1 0x100 DT 8 01 02 03 04 05 06 07 08
//! ```
//!
//! The file starts with a fixed-size header that is skipped. Lines whose first
//! token is not a timestamp are ignored silently, and only lines containing
//! `Rx` carry frames. Identifiers with a `0x` prefix are hexadecimal, others
//! decimal. Data bytes are always hexadecimal.

use crate::types::{CanFrame, DecoderError, Result, Timestamp};
use chrono::{NaiveTime, Timelike};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of header lines at the top of a trace file
pub const DEFAULT_HEADER_LINES: usize = 14;

/// Trace file parser
pub struct TraceParser;

impl TraceParser {
    /// Open a trace file and return an iterator over its frames
    pub fn parse(path: &Path, header_lines: usize) -> Result<TraceFrameIterator<BufReader<File>>> {
        log::info!("Parsing trace file: {:?}", path);

        if !path.exists() {
            return Err(DecoderError::LogParseError(format!(
                "Trace file not found: {:?}",
                path
            )));
        }

        let file = File::open(path).map_err(|e| {
            DecoderError::LogParseError(format!("Failed to open trace file: {}", e))
        })?;

        Ok(TraceFrameIterator::new(BufReader::new(file), header_lines))
    }
}

/// Iterator over CAN frames of a trace
pub struct TraceFrameIterator<R: BufRead> {
    reader: R,
    header_lines: usize,
    line_number: usize,
    buffer: Vec<u8>,
}

impl<R: BufRead> TraceFrameIterator<R> {
    /// Read frames from any buffered reader
    pub fn new(reader: R, header_lines: usize) -> Self {
        Self {
            reader,
            header_lines,
            line_number: 0,
            buffer: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for TraceFrameIterator<R> {
    type Item = Result<CanFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(DecoderError::IoError(e))),
            }
            self.line_number += 1;
            if self.line_number <= self.header_lines {
                continue;
            }

            let line = String::from_utf8_lossy(&self.buffer);
            if let Some(frame) = parse_trace_line(&line, self.line_number) {
                return Some(Ok(frame));
            }
        }
    }
}

/// Parse one trace line into a frame
///
/// Returns `None` for lines that carry no received frame. Malformed frame
/// lines are logged and dropped.
pub fn parse_trace_line(line: &str, line_number: usize) -> Option<CanFrame> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }
    let timestamp = parse_timestamp(tokens[0])?;

    if !line.contains("Rx") {
        return None;
    }

    match parse_frame_fields(&tokens, timestamp) {
        Ok(frame) => Some(frame),
        Err(reason) => {
            log::warn!("Skipping trace line {}: {}", line_number, reason);
            None
        }
    }
}

fn parse_frame_fields(tokens: &[&str], timestamp: Timestamp) -> std::result::Result<CanFrame, String> {
    if tokens.len() < 5 {
        return Err(format!("expected at least 5 fields, found {}", tokens.len()));
    }

    let channel: u8 = tokens[2]
        .parse()
        .map_err(|_| format!("invalid channel '{}'", tokens[2]))?;
    let can_id = parse_can_id(tokens[3]).ok_or_else(|| format!("invalid CAN ID '{}'", tokens[3]))?;
    let data = tokens
        .iter()
        .skip(6)
        .map(|byte| u8::from_str_radix(byte, 16).map_err(|_| format!("invalid data byte '{}'", byte)))
        .collect::<std::result::Result<Vec<u8>, String>>()?;

    Ok(CanFrame {
        timestamp,
        channel,
        can_id,
        data,
    })
}

/// Parse a logged identifier: `0x`-prefixed hexadecimal or plain decimal
pub fn parse_can_id(token: &str) -> Option<u32> {
    match token.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

/// Parse `H:M:S:F` into a time of day truncated to 100 µs
///
/// Hours, minutes and seconds take one or two digits; the fraction takes one
/// to six digits and is read as a decimal fraction (`5` is 500 ms).
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let (clock, fraction) = text.rsplit_once(':')?;
    if fraction.is_empty() || fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let time = NaiveTime::parse_from_str(&format!("{}.{}", clock, fraction), "%H:%M:%S%.f").ok()?;
    time.with_nanosecond(time.nanosecond() / 100_000 * 100_000)
}

/// Render a timestamp as `HH:MM:SS:ffff`
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    format!(
        "{}:{:04}",
        timestamp.format("%H:%M:%S"),
        timestamp.nanosecond() / 100_000
    )
}
