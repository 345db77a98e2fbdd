//! Raw-to-physical conversion
//!
//! physical = clamp(raw_or_signed * factor + offset, min, max)

use crate::codec::sign::FrameSign;
use crate::signals::database::{SignalDefinition, ValueType};

/// Reinterpret an unsigned `length`-bit value as two's complement
///
/// For fields wider than 64 bits the sign bit is not part of `raw`, so the
/// value stays non-negative.
pub fn twos_complement(raw: u64, length: u16) -> i128 {
    let raw = i128::from(raw);
    if length == 0 || length > 64 {
        return raw;
    }
    if raw >= 1i128 << (length - 1) {
        raw - (1i128 << length)
    } else {
        raw
    }
}

/// Clamp into `[min, max]`
///
/// The lower bound is applied first, so `max` wins when `min > max`. Never
/// panics, unlike `f64::clamp`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    let value = if min > value { min } else { value };
    if max < value {
        max
    } else {
        value
    }
}

/// Convert a raw field into its physical value
///
/// Signed signals go through the branch selected by the frame's sign flag.
/// Both branches currently apply the same two's-complement transform; the
/// flag stays an explicit input so the odd-positive path can diverge on its own.
pub fn to_physical(raw: u64, signal: &SignalDefinition, frame_sign: FrameSign) -> f64 {
    let value = match (signal.value_type, frame_sign) {
        (ValueType::Unsigned, _) => raw as f64,
        (ValueType::Signed, FrameSign::EvenNegative) => twos_complement(raw, signal.length) as f64,
        (ValueType::Signed, FrameSign::OddPositive) => twos_complement(raw, signal.length) as f64,
    };
    clamp(value * signal.factor + signal.offset, signal.min, signal.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::{ByteOrder, MuxRole};

    fn signal(value_type: ValueType, length: u16, factor: f64, offset: f64) -> SignalDefinition {
        SignalDefinition {
            name: "Test".to_string(),
            mux_role: MuxRole::None,
            start_bit: 0,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type,
            factor,
            offset,
            min: -1.0e9,
            max: 1.0e9,
            unit: String::new(),
            receivers: Vec::new(),
        }
    }

    #[test]
    fn test_twos_complement() {
        assert_eq!(twos_complement(0x7F, 8), 127);
        assert_eq!(twos_complement(0xFF, 8), -1);
        assert_eq!(twos_complement(0x80, 8), -128);
        assert_eq!(twos_complement(0x8000, 16), -32768);
        assert_eq!(twos_complement(0b1010, 4), -6);
        assert_eq!(twos_complement(1, 1), -1);
        assert_eq!(twos_complement(u64::MAX, 64), -1);
        assert_eq!(twos_complement(0, 0), 0);
        assert_eq!(twos_complement(u64::MAX, 72), i128::from(u64::MAX));
    }

    #[test]
    fn test_unsigned_scaling_ignores_frame_sign() {
        let sig = signal(ValueType::Unsigned, 8, 0.5, 2.0);
        assert_eq!(to_physical(10, &sig, FrameSign::EvenNegative), 7.0);
        assert_eq!(to_physical(10, &sig, FrameSign::OddPositive), 7.0);
        assert_eq!(to_physical(0xFF, &sig, FrameSign::EvenNegative), 129.5);
    }

    #[test]
    fn test_signed_branches_agree() {
        let sig = signal(ValueType::Signed, 4, 1.0, 0.0);
        assert_eq!(to_physical(0b1010, &sig, FrameSign::EvenNegative), -6.0);
        assert_eq!(to_physical(0b1010, &sig, FrameSign::OddPositive), -6.0);
        assert_eq!(to_physical(0b0101, &sig, FrameSign::OddPositive), 5.0);
    }

    #[test]
    fn test_signed_scaling() {
        let sig = signal(ValueType::Signed, 16, 0.1, -5.0);
        let value = to_physical(0xFFF6, &sig, FrameSign::EvenNegative);
        assert!((value - (-6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_result_is_clamped() {
        let mut sig = signal(ValueType::Unsigned, 8, 1.0, 0.0);
        sig.min = 10.0;
        sig.max = 100.0;
        assert_eq!(to_physical(5, &sig, FrameSign::OddPositive), 10.0);
        assert_eq!(to_physical(50, &sig, FrameSign::OddPositive), 50.0);
        assert_eq!(to_physical(200, &sig, FrameSign::OddPositive), 100.0);
    }

    #[test]
    fn test_clamp_is_total() {
        let bounds = [(-10.0, 10.0), (0.0, 0.0), (-1.5, 2.25), (100.0, 1.0e6)];
        let values = [-1.0e12, -10.0, -0.5, 0.0, 1.0, 9.99, 10.0, 5.0e5, 1.0e12];
        for &(min, max) in &bounds {
            for &value in &values {
                let clamped = clamp(value, min, max);
                assert!(clamped >= min && clamped <= max);
                if value >= min && value <= max {
                    assert_eq!(clamped, value);
                }
            }
        }
    }

    #[test]
    fn test_clamp_inverted_bounds() {
        assert_eq!(clamp(5.0, 10.0, 0.0), 0.0);
        assert_eq!(clamp(-5.0, 10.0, 0.0), 0.0);
    }
}
