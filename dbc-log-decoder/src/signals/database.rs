//! Signal database
//!
//! Holds the message and signal definitions parsed from a DBC file, keyed by
//! the masked CAN ID. Built once while loading, read-only while decoding.

use serde::Serialize;
use std::collections::HashMap;

/// Mask applied to every message ID read from a DBC file
///
/// DBC files store extended IDs with bit 31 set; only the low 29 bits identify
/// the message.
pub const CAN_ID_MASK: u32 = 0x1FFF_FFFF;

/// Strip the flag bits from a DBC message ID
pub fn mask_id(raw_id: u32) -> u32 {
    raw_id & CAN_ID_MASK
}

/// A complete CAN message definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDefinition {
    /// CAN message ID (already masked)
    pub id: u32,
    /// Message name
    pub name: String,
    /// Declared message size in bytes (informational, never enforced)
    pub size: usize,
    /// Sender ECU name (optional)
    pub sender: Option<String>,
    /// Signals of this message by name
    pub signals: HashMap<String, SignalDefinition>,
}

impl MessageDefinition {
    /// Create a message without signals
    pub fn new(id: u32, name: impl Into<String>, size: usize) -> Self {
        Self {
            id: mask_id(id),
            name: name.into(),
            size,
            sender: None,
            signals: HashMap::new(),
        }
    }

    /// Add a signal, replacing any earlier signal with the same name
    pub fn add_signal(&mut self, signal: SignalDefinition) {
        self.signals.insert(signal.name.clone(), signal);
    }

    /// True if any signal takes part in multiplexing
    pub fn is_multiplexed(&self) -> bool {
        self.signals.values().any(|s| s.mux_role != MuxRole::None)
    }
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Multiplexing role of this signal
    pub mux_role: MuxRole,
    /// Start bit in the CAN frame
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    /// Bit traversal direction
    pub byte_order: ByteOrder,
    /// Declared sign convention
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum physical value
    pub min: f64,
    /// Maximum physical value
    pub max: f64,
    /// Engineering unit, display only
    pub unit: String,
    /// Receiving nodes listed after the unit
    pub receivers: Vec<String>,
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

/// Role of a signal in a multiplexed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MuxRole {
    /// Plain signal, always present
    None,
    /// Selects which variants are active; never emitted itself
    Switch,
    /// Active only when the switch value equals the contained value
    Variant(u32),
}

/// A schema line that was dropped during parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number in the DBC text
    pub line_number: usize,
    /// Why the line was dropped
    pub reason: String,
}

/// The signal database
#[derive(Debug, Clone, Default)]
pub struct SignalDatabase {
    /// All message definitions by masked CAN ID
    messages: HashMap<u32, MessageDefinition>,

    /// Accepted signal names in declaration order (may repeat)
    declared_signals: Vec<String>,

    /// Schema lines dropped while parsing
    skipped: Vec<SkippedLine>,
}

impl SignalDatabase {
    /// Create a new empty signal database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message definition, replacing any message with the same ID
    pub fn add_message(&mut self, message: MessageDefinition) {
        if let Some(previous) = self.messages.get(&message.id) {
            log::debug!(
                "Message 0x{:X} redefined: '{}' replaces '{}'",
                message.id,
                message.name,
                previous.name
            );
        }
        self.messages.insert(message.id, message);
    }

    /// Attach a signal to an already added message
    ///
    /// Returns false when no message with that ID exists.
    pub fn add_signal(&mut self, can_id: u32, signal: SignalDefinition) -> bool {
        match self.messages.get_mut(&can_id) {
            Some(message) => {
                self.declared_signals.push(signal.name.clone());
                message.add_signal(signal);
                true
            }
            None => false,
        }
    }

    /// Move every definition of `other` into this database
    ///
    /// Messages of `other` replace messages with the same ID.
    pub fn merge(&mut self, other: SignalDatabase) {
        for (_, message) in other.messages {
            self.add_message(message);
        }
        self.declared_signals.extend(other.declared_signals);
        self.skipped.extend(other.skipped);
    }

    /// Record a dropped schema line
    pub fn record_skipped(&mut self, line_number: usize, reason: impl Into<String>) {
        self.skipped.push(SkippedLine {
            line_number,
            reason: reason.into(),
        });
    }

    /// Get a message definition by CAN ID
    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.messages.get(&can_id)
    }

    /// Iterate over all message definitions (unordered)
    pub fn messages(&self) -> impl Iterator<Item = &MessageDefinition> {
        self.messages.values()
    }

    /// Schema lines dropped while parsing
    pub fn skipped_lines(&self) -> &[SkippedLine] {
        &self.skipped
    }

    /// Accepted signal names in declaration order, first occurrence only
    pub fn signal_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.declared_signals
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.values().map(|m| m.signals.len()).sum(),
            num_skipped_lines: self.skipped.len(),
        }
    }

    /// Get all CAN IDs in the database, sorted
    pub fn get_all_can_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.messages.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of message definitions
    pub num_messages: usize,
    /// Number of signal definitions
    pub num_signals: usize,
    /// Number of schema lines that were dropped
    pub num_skipped_lines: usize,
}
