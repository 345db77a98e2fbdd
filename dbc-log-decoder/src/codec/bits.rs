//! Raw bit-field extraction
//!
//! Both byte orders walk the payload one bit at a time starting at the
//! signal's start bit:
//! - Little-endian (Intel): bit positions increase inside a byte, then the walk
//!   continues at bit 0 of the next byte. The first bit read is the LSB.
//! - Big-endian (Motorola): bit positions decrease inside a byte, then the walk
//!   continues at bit 7 of the next byte. The first bit read is the MSB.
//!
//! The walk stops at the end of the payload. Bits already read keep their
//! position, so a truncated big-endian field is not right-aligned.
//!
//! Fields wider than 64 bits are walked in full; only bits of weight below
//! 2^64 land in the raw value.

use crate::signals::database::ByteOrder;

/// Extract an unsigned `length`-bit field from `data`
pub fn extract(data: &[u8], start_bit: u16, length: u16, byte_order: ByteOrder) -> u64 {
    let length = u32::from(length);
    let mut byte_index = usize::from(start_bit / 8);
    let mut bit_offset = (start_bit % 8) as u8;
    let mut raw: u64 = 0;

    for i in 0..length {
        let Some(&byte) = data.get(byte_index) else {
            break;
        };
        let bit = u64::from((byte >> bit_offset) & 0x01);

        match byte_order {
            ByteOrder::BigEndian => {
                raw |= bit.checked_shl(length - i - 1).unwrap_or(0);
                if bit_offset == 0 {
                    byte_index += 1;
                    bit_offset = 7;
                } else {
                    bit_offset -= 1;
                }
            }
            ByteOrder::LittleEndian => {
                raw |= bit.checked_shl(i).unwrap_or(0);
                if bit_offset == 7 {
                    byte_index += 1;
                    bit_offset = 0;
                } else {
                    bit_offset += 1;
                }
            }
        }
    }

    raw
}
