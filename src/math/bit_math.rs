use crate::error::MathError;
use alloy_primitives::U256;

/// Returns the index (0–255) of the most significant set bit in a `U256`,
/// or `MathError::ZeroValue` if the input is zero.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(255 - x.leading_zeros() as u8)
}

/// Returns the index (0–255) of the least significant set bit in a `U256`,
/// or `MathError::ZeroValue` if the input is zero.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(x.trailing_zeros() as u8)
}

/// Zeroes out the `shift` lowest bits (`right`) or the `shift` highest bits
/// (`!right`) of a bitmap word. Shifts of 256 or more clear the whole word.
pub fn truncate_bitmap(bitmap: U256, shift: u16, right: bool) -> U256 {
    if shift >= 256 {
        return U256::ZERO;
    }
    let shift = shift as usize;
    if right {
        (bitmap >> shift) << shift
    } else {
        (bitmap << shift) >> shift
    }
}

/// First set bit left standing after truncating `shift` bits off the word:
/// the lowest one when truncating from the right, the highest otherwise.
/// `None` means the search spills out of this word.
pub fn bit_after_trunc(bitmap: U256, shift: u16, right: bool) -> Option<u8> {
    let truncated = truncate_bitmap(bitmap, shift, right);
    if right {
        least_significant_bit(truncated).ok()
    } else {
        most_significant_bit(truncated).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------- most_significant_bit tests -------------------------

    #[test]
    fn msb_errors_on_zero() {
        assert!(matches!(
            most_significant_bit(U256::ZERO),
            Err(MathError::ZeroValue)
        ));
    }

    #[test]
    fn msb_of_multiple_bits() {
        // binary: 1001_0100 (MSB = bit 7)
        let x = U256::from(0b1001_0100u64);
        assert_eq!(most_significant_bit(x).unwrap(), 7);
        assert_eq!(most_significant_bit(U256::MAX).unwrap(), 255);
    }

    // ------------------------- least_significant_bit tests -------------------------

    #[test]
    fn lsb_errors_on_zero() {
        assert!(matches!(
            least_significant_bit(U256::ZERO),
            Err(MathError::ZeroValue)
        ));
    }

    #[test]
    fn lsb_of_multiple_bits() {
        // binary: 1011001000 -> LSB is position 3
        let x = U256::from(0b1011001000u64);
        assert_eq!(least_significant_bit(x).unwrap(), 3);
        assert_eq!(least_significant_bit(U256::MAX).unwrap(), 0);
    }

    // ------------------------- truncation tests -------------------------

    #[test]
    fn truncate_right_clears_low_bits() {
        let word = U256::from(0b1111_0000_1111u64);
        assert_eq!(truncate_bitmap(word, 4, true), U256::from(0b1111_0000_0000u64));
        assert_eq!(truncate_bitmap(word, 0, true), word);
    }

    #[test]
    fn truncate_left_clears_high_bits() {
        let word = (U256::ONE << 255) | U256::from(0b101u64);
        assert_eq!(truncate_bitmap(word, 1, false), U256::from(0b101u64));
        assert_eq!(truncate_bitmap(word, 254, false), U256::from(0b01u64));
    }

    #[test]
    fn truncate_full_width_empties_word() {
        assert_eq!(truncate_bitmap(U256::MAX, 256, true), U256::ZERO);
        assert_eq!(truncate_bitmap(U256::MAX, 256, false), U256::ZERO);
    }

    #[test]
    fn bit_after_trunc_directions() {
        let word = (U256::ONE << 200) | (U256::ONE << 40) | (U256::ONE << 3);
        assert_eq!(bit_after_trunc(word, 0, true), Some(3));
        assert_eq!(bit_after_trunc(word, 4, true), Some(40));
        assert_eq!(bit_after_trunc(word, 41, true), Some(200));
        assert_eq!(bit_after_trunc(word, 201, true), None);

        assert_eq!(bit_after_trunc(word, 0, false), Some(200));
        assert_eq!(bit_after_trunc(word, 55, false), Some(200));
        assert_eq!(bit_after_trunc(word, 56, false), Some(40));
        assert_eq!(bit_after_trunc(word, 253, false), None);
    }
}
