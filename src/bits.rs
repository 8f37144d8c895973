//! Word-level bit-field primitives.
//!
//! The LC-3 packs every instruction into a single 16-bit word:
//! - Bits 15-12 hold the opcode
//! - Register indices are 3-bit fields at fixed positions
//! - Offsets are two's-complement fields of width 5, 6, 9, or 11
//!
//! Everything here operates on plain `u16` words; all arithmetic on
//! machine words elsewhere in the crate is wrapping.

/// Extract an unsigned bit field from a word.
///
/// Returns bits `low..low + width` shifted down to bit 0.
#[inline]
pub fn field(word: u16, low: u16, width: u16) -> u16 {
    debug_assert!(low + width <= 16);
    ((u32::from(word) >> low) & ((1u32 << width) - 1)) as u16
}

/// Extract a single bit as a boolean.
#[inline]
pub fn flag(word: u16, bit: u16) -> bool {
    (word >> bit) & 1 == 1
}

/// Sign-extend the low `width` bits of `value` to a full 16-bit word.
///
/// Bit `width - 1` is treated as the sign bit and replicated into all
/// higher bits. The result stays a `u16`; signedness only matters to
/// the wrapping additions that consume it.
#[inline]
pub fn sign_extend(value: u16, width: u16) -> u16 {
    debug_assert!(width > 0 && width <= 16);
    if (value >> (width - 1)) & 1 == 1 {
        value | ((0xFFFFu32 << width) as u16)
    } else {
        value & (((1u32 << width) - 1) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_field_extraction() {
        // 0b0001_010_001_1_11101: ADD R2, R1, #-3
        let word = 0b0001_010_001_1_11101;
        assert_eq!(field(word, 12, 4), 0b0001);
        assert_eq!(field(word, 9, 3), 2);
        assert_eq!(field(word, 6, 3), 1);
        assert!(flag(word, 5));
        assert_eq!(field(word, 0, 5), 0b11101);
    }

    #[test]
    fn test_sign_extend_negative() {
        // imm5 = -3
        assert_eq!(sign_extend(0b11101, 5), 0xFFFD);
        // offset9 = -1
        assert_eq!(sign_extend(0x1FF, 9), 0xFFFF);
        // offset11 = -1024
        assert_eq!(sign_extend(0x400, 11), 0xFC00);
    }

    #[test]
    fn test_sign_extend_positive() {
        assert_eq!(sign_extend(0b01101, 5), 0b01101);
        assert_eq!(sign_extend(0x0FF, 9), 0x0FF);
        assert_eq!(sign_extend(0, 6), 0);
    }

    proptest! {
        // Masking a sign-extended field back down recovers the field
        // exactly, for every width the instruction set uses.
        #[test]
        fn prop_sign_extend_roundtrip(v in any::<u16>()) {
            for width in [5u16, 6, 9, 11] {
                let low = v & ((1 << width) - 1);
                let extended = sign_extend(low, width);
                prop_assert_eq!(extended & ((1 << width) - 1), low);
            }
        }

        // The high bits after extension are all copies of the sign bit.
        #[test]
        fn prop_sign_extend_high_bits(v in any::<u16>()) {
            for width in [5u16, 6, 9, 11] {
                let low = v & ((1 << width) - 1);
                let extended = sign_extend(low, width);
                let high = extended >> width;
                if (low >> (width - 1)) & 1 == 1 {
                    prop_assert_eq!(high, 0xFFFF >> width);
                } else {
                    prop_assert_eq!(high, 0);
                }
            }
        }
    }
}
