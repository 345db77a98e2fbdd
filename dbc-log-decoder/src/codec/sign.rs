//! Frame sign heuristic
//!
//! Every payload byte is classified by its most significant bit: 0 is
//! positive, 1 is negative. The parity of the positive count selects the
//! signed conversion used for all signed signals of the frame.
//!
//! Ordinary DBC decoding is purely per signal. This frame-wide flag reproduces
//! the behaviour of the logs this tool was built for and is kept as is.

use serde::Serialize;

/// Per-frame sign classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameSign {
    /// Even number of positive bytes (zero included)
    EvenNegative,
    /// Odd number of positive bytes
    OddPositive,
}

impl FrameSign {
    /// Classify a payload
    pub fn from_payload(data: &[u8]) -> Self {
        let positive = data.iter().filter(|&&byte| byte & 0x80 == 0).count();
        if positive % 2 == 0 {
            FrameSign::EvenNegative
        } else {
            FrameSign::OddPositive
        }
    }
}
