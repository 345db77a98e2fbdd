//! Message Decoding Engine
//!
//! Turns the payload of one frame into physical signal values using a message
//! definition from the signal database. Handles bit extraction, the frame sign
//! heuristic, multiplexing and scaling.

use crate::codec::{extract, is_active, switch_value, to_physical, FrameSign};
use crate::signals::database::MessageDefinition;
use crate::types::DecodedFrame;
use std::collections::HashMap;

/// Message decoder - extracts signals from CAN frames
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode one frame into a [`DecodedFrame`]
    ///
    /// # Arguments
    /// * `timestamp` - Passed through untouched
    /// * `message_def` - Message definition from the signal database
    /// * `data` - Frame payload
    ///
    /// A frame is always produced, even when no signal is active for it.
    pub fn decode<T>(timestamp: T, message_def: &MessageDefinition, data: &[u8]) -> DecodedFrame<T> {
        DecodedFrame {
            timestamp,
            can_id: message_def.id,
            message_name: message_def.name.clone(),
            signals: Self::decode_signals(message_def, data),
        }
    }

    /// Decode the active signals of one payload
    pub fn decode_signals(message_def: &MessageDefinition, data: &[u8]) -> HashMap<String, f64> {
        // Both are frame-wide and computed once
        let frame_sign = FrameSign::from_payload(data);
        let switch = switch_value(data);

        let mut decoded = HashMap::with_capacity(message_def.signals.len());
        for signal in message_def.signals.values() {
            if !is_active(signal.mux_role, switch) {
                continue;
            }

            let raw = extract(data, signal.start_bit, signal.length, signal.byte_order);
            let value = to_physical(raw, signal, frame_sign);
            decoded.insert(signal.name.clone(), value);
        }

        decoded
    }
}
