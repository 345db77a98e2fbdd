//! Bit-level frame codec
//!
//! Building blocks used by the message decoder: raw bit extraction, the
//! per-frame sign heuristic, signed/scaled conversion and multiplexer
//! resolution. All functions are pure over the payload slice.

pub mod bits;
pub mod mux;
pub mod scale;
pub mod sign;

pub use bits::extract;
pub use mux::{is_active, switch_value};
pub use scale::{clamp, to_physical, twos_complement};
pub use sign::FrameSign;
