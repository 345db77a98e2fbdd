//! DBC file parser
//!
//! Line-oriented, best-effort parser for Vector DBC files. Only `BO_` (message)
//! and `SG_` (signal) records are read; every other line is ignored. A record
//! that cannot be read is skipped and noted in the database, never reported as
//! an error.
//!
//! ```text
//! BO_ 2147483904 BatteryStatus: 8 BMS
//!  SG_ Mode M : 0|8@1+ (1,0) [0|3] "" ECU1
//!  SG_ CellVoltage m1 : 8|16@1+ (0.001,0) [0|5] "V" ECU1
//! ```

use crate::signals::database::{
    mask_id, ByteOrder, MessageDefinition, MuxRole, SignalDatabase, SignalDefinition, ValueType,
};
use crate::types::{DecoderError, Result};
use std::fmt;
use std::path::Path;

/// Result of reading a single DBC line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// A `BO_` record; opens this message for the following signals
    Message(MessageDefinition),
    /// A `SG_` record belonging to the open message
    Signal(SignalDefinition),
    /// A `BO_` or `SG_` record that could not be read
    Skipped(SkipReason),
    /// Any other line
    Ignored,
}

/// Why a record was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `SG_` line before any message was opened
    NoOpenMessage,
    /// Not enough whitespace-separated tokens
    MissingTokens { found: usize, required: usize },
    /// A field token could not be parsed
    InvalidField { field: &'static str, token: String },
}

impl SkipReason {
    fn invalid(field: &'static str, token: &str) -> Self {
        SkipReason::InvalidField {
            field,
            token: token.to_string(),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoOpenMessage => write!(f, "signal outside of a message"),
            SkipReason::MissingTokens { found, required } => {
                write!(f, "expected at least {} tokens, found {}", required, found)
            }
            SkipReason::InvalidField { field, token } => {
                write!(f, "invalid {} '{}'", field, token)
            }
        }
    }
}

/// Parse a DBC file into a signal database
///
/// Only reading the file can fail; unreadable records are skipped.
pub fn parse_dbc_file(path: &Path) -> Result<SignalDatabase> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // Try UTF-8 first, then fall back to Latin-1 (compatible with Windows-1252)
    let content = String::from_utf8(bytes).unwrap_or_else(|e| {
        log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
        e.into_bytes().iter().map(|&b| b as char).collect()
    });

    let database = parse_dbc_str(&content);
    let stats = database.stats();
    log::info!(
        "Parsed {} messages, {} signals from {:?} ({} lines skipped)",
        stats.num_messages,
        stats.num_signals,
        path,
        stats.num_skipped_lines
    );

    Ok(database)
}

/// Parse DBC text into a signal database
pub fn parse_dbc_str(content: &str) -> SignalDatabase {
    parse_dbc_lines(content.lines())
}

/// Parse DBC lines into a signal database
///
/// The only state carried between lines is the ID of the open message.
pub fn parse_dbc_lines<I, S>(lines: I) -> SignalDatabase
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut database = SignalDatabase::new();
    let mut open_message: Option<u32> = None;

    for (index, line) in lines.into_iter().enumerate() {
        let line_number = index + 1;
        match parse_line(line.as_ref(), open_message.is_some()) {
            LineOutcome::Message(message) => {
                open_message = Some(message.id);
                database.add_message(message);
            }
            LineOutcome::Signal(signal) => {
                if let Some(can_id) = open_message {
                    database.add_signal(can_id, signal);
                }
            }
            LineOutcome::Skipped(reason) => {
                // A broken BO_ line must not let its signals land in the previous message
                if is_message_line(line.as_ref()) {
                    open_message = None;
                }
                log::debug!("Skipping DBC line {}: {}", line_number, reason);
                database.record_skipped(line_number, reason.to_string());
            }
            LineOutcome::Ignored => {}
        }
    }

    database
}

/// Classify and read one DBC line
///
/// `message_open` tells whether a `SG_` line has a message to belong to.
pub fn parse_line(line: &str, message_open: bool) -> LineOutcome {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let outcome = match tokens.first() {
        Some(&"BO_") => parse_message(&tokens).map(LineOutcome::Message),
        Some(&"SG_") if !message_open => Err(SkipReason::NoOpenMessage),
        Some(&"SG_") => parse_signal(&tokens).map(LineOutcome::Signal),
        _ => Ok(LineOutcome::Ignored),
    };
    outcome.unwrap_or_else(LineOutcome::Skipped)
}

fn is_message_line(line: &str) -> bool {
    line.split_whitespace().next() == Some("BO_")
}

/// `BO_ <id> <name>: <size> [<sender>]`
fn parse_message(tokens: &[&str]) -> std::result::Result<MessageDefinition, SkipReason> {
    if tokens.len() < 4 {
        return Err(SkipReason::MissingTokens {
            found: tokens.len(),
            required: 4,
        });
    }

    let raw_id: u64 = tokens[1]
        .parse()
        .map_err(|_| SkipReason::invalid("message id", tokens[1]))?;
    let size: usize = tokens[3]
        .parse()
        .map_err(|_| SkipReason::invalid("message size", tokens[3]))?;
    let name = tokens[2].strip_suffix(':').unwrap_or(tokens[2]);

    // Truncation keeps the low 32 bits, and the mask only looks at the low 29
    let mut message = MessageDefinition::new(mask_id(raw_id as u32), name, size);
    message.sender = tokens.get(4).map(|s| s.to_string());
    Ok(message)
}

/// `SG_ <name> [<mux>] : <start>|<length>@<order><sign> (<factor>,<offset>) [<min>|<max>] "<unit>" <receivers>`
fn parse_signal(tokens: &[&str]) -> std::result::Result<SignalDefinition, SkipReason> {
    let (mux_token, layout_index) = if tokens.len() > 4 && tokens[3] == ":" {
        (Some(tokens[2]), 4)
    } else {
        (None, 3)
    };

    // layout, scaling, range and unit must all be present
    let required = layout_index + 4;
    if tokens.len() < required {
        return Err(SkipReason::MissingTokens {
            found: tokens.len(),
            required,
        });
    }

    let mux_role = match mux_token {
        Some(token) => parse_mux_role(token)?,
        None => MuxRole::None,
    };
    let layout = parse_layout(tokens[layout_index])?;
    let (factor, offset) = parse_pair(tokens[layout_index + 1], &['(', ')'], ',', "factor/offset")?;
    let (min, max) = parse_pair(tokens[layout_index + 2], &['[', ']'], '|', "min/max")?;
    let unit = strip_quotes(tokens[layout_index + 3]);
    let receivers = tokens[layout_index + 4..]
        .iter()
        .flat_map(|t| t.split(','))
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    Ok(SignalDefinition {
        name: signal_name(tokens[1]),
        mux_role,
        start_bit: layout.start_bit,
        length: layout.length,
        byte_order: layout.byte_order,
        value_type: layout.value_type,
        factor,
        offset,
        min,
        max,
        unit,
        receivers,
    })
}

/// Build the signal name from its raw token
///
/// A trailing qualifier (other than `m0`) is appended with an underscore so
/// that same-named multiplexed variants stay distinct.
pub fn signal_name(raw: &str) -> String {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    match parts.as_slice() {
        [first, .., last] if *last != "m0" => format!("{}_{}", first, last),
        [first, ..] => first.to_string(),
        [] => String::new(),
    }
}

/// Read a multiplexer marker: `M` (switch) or `m<n>` (variant)
pub fn parse_mux_role(token: &str) -> std::result::Result<MuxRole, SkipReason> {
    if token.contains('M') {
        return Ok(MuxRole::Switch);
    }
    let digits = token.strip_prefix('m').unwrap_or(token);
    digits
        .parse::<u32>()
        .map(MuxRole::Variant)
        .map_err(|_| SkipReason::invalid("multiplexer", token))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    start_bit: u16,
    length: u16,
    byte_order: ByteOrder,
    value_type: ValueType,
}

/// Read `<start>|<length>@<order><sign>`
fn parse_layout(token: &str) -> std::result::Result<Layout, SkipReason> {
    let invalid = || SkipReason::invalid("bit layout", token);

    let mut fields = token.split('|');
    let start_bit: u16 = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(invalid)?;
    let length: u16 = fields
        .next()
        .and_then(|rest| rest.split('@').next())
        .and_then(|s| s.parse().ok())
        .ok_or_else(invalid)?;
    let order = token
        .split('@')
        .nth(1)
        .and_then(|rest| rest.chars().next())
        .ok_or_else(invalid)?;

    let byte_order = if order == '1' {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    };

    // The sign scan keeps the last sign character seen, but a '+' only counts
    // when nothing follows it: "0|8@1+" is unsigned, "0|8@+1" is signed.
    let value_type = if token.ends_with('+') {
        ValueType::Unsigned
    } else {
        ValueType::Signed
    };

    Ok(Layout {
        start_bit,
        length,
        byte_order,
        value_type,
    })
}

/// Read `(a,b)` or `[a|b]` into two floats
fn parse_pair(
    token: &str,
    brackets: &[char],
    separator: char,
    field: &'static str,
) -> std::result::Result<(f64, f64), SkipReason> {
    let inner = token.trim_matches(|c| brackets.contains(&c));
    let values: Vec<&str> = inner.split(separator).collect();
    match values.as_slice() {
        [a, b] => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            _ => Err(SkipReason::invalid(field, token)),
        },
        _ => Err(SkipReason::invalid(field, token)),
    }
}

/// Drop the first and last character (the quotes around the unit)
fn strip_quotes(token: &str) -> String {
    let mut chars = token.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_DBC: &str = r#"
VERSION ""

NS_ :
    NS_DESC_
    CM_

BS_:

BU_: ECU1 ECU2

BO_ 291 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] "rpm" ECU2
 SG_ EngineTemp : 16|8@1- (1,-40) [-40|215] "C" ECU2

BO_ 2147484160 BatteryStatus: 8 ECU1
 SG_ BatteryVoltage : 7|16@0+ (0.01,0) [0|16] "V" ECU2,ECU1

BO_TX_BU_ 291 : ECU2;
CM_ SG_ 291 EngineSpeed "Crankshaft speed";
"#;

    #[test]
    fn test_parse_simple_dbc() {
        let db = parse_dbc_str(SAMPLE_DBC);

        assert_eq!(db.stats().num_messages, 2);
        assert!(db.skipped_lines().is_empty());

        let msg = db.get_message(291).unwrap();
        assert_eq!(msg.name, "EngineData");
        assert_eq!(msg.size, 8);
        assert_eq!(msg.sender, Some("ECU1".to_string()));
        assert_eq!(msg.signals.len(), 2);

        let speed = &msg.signals["EngineSpeed"];
        assert_eq!(speed.start_bit, 0);
        assert_eq!(speed.length, 16);
        assert_eq!(speed.byte_order, ByteOrder::LittleEndian);
        assert_eq!(speed.value_type, ValueType::Unsigned);
        assert_eq!(speed.mux_role, MuxRole::None);
        assert_eq!(speed.unit, "rpm");
        assert_eq!(speed.receivers, vec!["ECU2"]);

        let temp = &msg.signals["EngineTemp"];
        assert_eq!(temp.value_type, ValueType::Signed);
        assert_eq!(temp.offset, -40.0);
        assert_eq!(temp.min, -40.0);
        assert_eq!(temp.max, 215.0);
    }

    #[test]
    fn test_extended_id_is_masked() {
        let db = parse_dbc_str(SAMPLE_DBC);
        // 2147484160 = 0x80000200
        let msg = db.get_message(0x200).unwrap();
        assert_eq!(msg.name, "BatteryStatus");

        let voltage = &msg.signals["BatteryVoltage"];
        assert_eq!(voltage.byte_order, ByteOrder::BigEndian);
        assert_eq!(voltage.factor, 0.01);
        assert_eq!(voltage.receivers, vec!["ECU2", "ECU1"]);
    }

    #[test]
    fn test_parse_multiplexed_signals() {
        let db = parse_dbc_str(
            r#"
BO_ 512 MultiplexedMsg: 8 ECU1
 SG_ Mode M : 0|8@1+ (1,0) [0|3] "" ECU1
 SG_ SignalA m0 : 8|16@1+ (1,0) [0|100] "%" ECU1
 SG_ SignalB m01 : 8|16@1+ (0.1,0) [0|1000] "mV" ECU1
"#,
        );

        let msg = db.get_message(512).unwrap();
        assert!(msg.is_multiplexed());
        assert_eq!(msg.signals["Mode"].mux_role, MuxRole::Switch);
        assert_eq!(msg.signals["SignalA"].mux_role, MuxRole::Variant(0));
        assert_eq!(msg.signals["SignalB"].mux_role, MuxRole::Variant(1));
        assert_eq!(msg.signals["SignalB"].start_bit, 8);
        assert_eq!(msg.signals["Mode"].unit, "");
    }

    #[test]
    fn test_missing_range_token_skips_only_that_signal() {
        let db = parse_dbc_str(
            r#"
BO_ 256 Body: 8 ECU1
 SG_ DoorOpen : 0|1@1+ (1,0) [0|1] "" ECU2
 SG_ Broken : 1|7@1+ (1,0) "" ECU2
 SG_ Light : 8|8@1+ (1,0) [0|255] "" ECU2
"#,
        );

        let msg = db.get_message(256).unwrap();
        assert_eq!(msg.signals.len(), 2);
        assert!(msg.signals.contains_key("DoorOpen"));
        assert!(msg.signals.contains_key("Light"));
        assert!(!msg.signals.contains_key("Broken"));

        let skipped = db.skipped_lines();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].line_number, 4);
    }

    #[test]
    fn test_signal_before_message_is_skipped() {
        let db = parse_dbc_str(" SG_ Orphan : 0|8@1+ (1,0) [0|255] \"\" ECU2\n");
        assert_eq!(db.stats().num_signals, 0);
        assert_eq!(db.skipped_lines()[0].reason, "signal outside of a message");
    }

    #[test]
    fn test_broken_message_line_closes_previous_message() {
        let db = parse_dbc_str(
            r#"
BO_ 1 First: 8 ECU1
 SG_ A : 0|8@1+ (1,0) [0|255] "" ECU2
BO_ notanumber Second: 8 ECU1
 SG_ B : 8|8@1+ (1,0) [0|255] "" ECU2
"#,
        );

        let first = db.get_message(1).unwrap();
        assert_eq!(first.signals.len(), 1);
        assert_eq!(db.skipped_lines().len(), 2);
    }

    #[test]
    fn test_sign_marker_must_be_trailing() {
        assert_eq!(
            parse_layout("0|8@1+").unwrap().value_type,
            ValueType::Unsigned
        );
        assert_eq!(parse_layout("0|8@1-").unwrap().value_type, ValueType::Signed);
        assert_eq!(parse_layout("0|8@1").unwrap().value_type, ValueType::Signed);
        assert_eq!(parse_layout("0|8@+1").unwrap().value_type, ValueType::Signed);
    }

    #[test]
    fn test_byte_order_digit() {
        assert_eq!(
            parse_layout("7|8@0+").unwrap().byte_order,
            ByteOrder::BigEndian
        );
        assert_eq!(
            parse_layout("7|8@1+").unwrap().byte_order,
            ByteOrder::LittleEndian
        );
        assert_eq!(
            parse_layout("7|8@x+").unwrap().byte_order,
            ByteOrder::BigEndian
        );
    }

    #[test]
    fn test_invalid_layouts() {
        assert!(parse_layout("0-8@1+").is_err());
        assert!(parse_layout("0|8").is_err());
        assert!(parse_layout("0|8@").is_err());
        assert!(parse_layout("a|8@1+").is_err());
    }

    #[test]
    fn test_wide_signal_is_kept() {
        let db = parse_dbc_str(
            "BO_ 600 Wide: 9 ECU1\n SG_ Blob : 0|72@1+ (1,0) [0|0] \"\" ECU2\n",
        );
        assert!(db.skipped_lines().is_empty());
        assert_eq!(db.get_message(600).unwrap().signals["Blob"].length, 72);
    }

    #[test]
    fn test_parse_mux_role() {
        assert_eq!(parse_mux_role("M"), Ok(MuxRole::Switch));
        assert_eq!(parse_mux_role("m2M"), Ok(MuxRole::Switch));
        assert_eq!(parse_mux_role("m0"), Ok(MuxRole::Variant(0)));
        assert_eq!(parse_mux_role("m007"), Ok(MuxRole::Variant(7)));
        assert_eq!(parse_mux_role("m12"), Ok(MuxRole::Variant(12)));
        assert!(parse_mux_role("mx").is_err());
        assert!(parse_mux_role("m").is_err());
    }

    #[test]
    fn test_signal_name_qualifier() {
        assert_eq!(signal_name("Voltage"), "Voltage");
        assert_eq!(signal_name("Voltage m0"), "Voltage");
        assert_eq!(signal_name("Voltage m3"), "Voltage_m3");
        assert_eq!(signal_name("Voltage cell 4"), "Voltage_4");
    }

    #[test]
    fn test_unit_quotes_are_dropped() {
        assert_eq!(strip_quotes("\"km/h\""), "km/h");
        assert_eq!(strip_quotes("\"\""), "");
        assert_eq!(strip_quotes("\"°C\""), "°C");
        assert_eq!(strip_quotes("x"), "");
    }

    #[test]
    fn test_message_line_outcome() {
        let mut expected = MessageDefinition::new(0x8000_0123, "Gateway", 8);
        expected.sender = Some("GW".to_string());
        assert_eq!(
            parse_line("BO_ 2147483939 Gateway: 8 GW", false),
            LineOutcome::Message(expected)
        );
    }

    #[test]
    fn test_other_records_are_ignored() {
        assert_eq!(parse_line("VAL_ 291 EngineSpeed 0 \"Off\" ;", true), LineOutcome::Ignored);
        assert_eq!(parse_line("", true), LineOutcome::Ignored);
        assert_eq!(parse_line("BO_TX_BU_ 291 : ECU2;", true), LineOutcome::Ignored);
    }

    #[test]
    fn test_parse_dbc_file_latin1() {
        let mut content = b"BO_ 16 Climate: 8 HVAC\n SG_ CabinTemp : 0|8@1- (1,0) [-40|80] \"".to_vec();
        content.push(0xB0); // Latin-1 degree sign
        content.extend_from_slice(b"C\" ECU2\n");

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&content).unwrap();
        temp_file.flush().unwrap();

        let db = parse_dbc_file(temp_file.path()).unwrap();
        let signal = &db.get_message(16).unwrap().signals["CabinTemp"];
        assert_eq!(signal.unit, "°C");
    }

    #[test]
    fn test_parse_dbc_file_missing() {
        let result = parse_dbc_file(Path::new("/nonexistent/file.dbc"));
        assert!(matches!(result, Err(DecoderError::DbcParseError(_))));
    }
}
