//! Multiplexer resolution
//!
//! The switch value of a frame is always its first payload byte, whatever
//! bit position the switch signal declares.

use crate::signals::database::MuxRole;

/// Switch value of a frame; `None` for an empty payload
pub fn switch_value(data: &[u8]) -> Option<u8> {
    data.first().copied()
}

/// Whether a signal with `role` is emitted for a frame with `switch`
///
/// Switch signals are consumed internally and never emitted. Variants need an
/// exact match.
pub fn is_active(role: MuxRole, switch: Option<u8>) -> bool {
    match role {
        MuxRole::None => true,
        MuxRole::Switch => false,
        MuxRole::Variant(selector) => switch.map_or(false, |value| u32::from(value) == selector),
    }
}
