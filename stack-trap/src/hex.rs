//! Fixed-width hexadecimal rendering
//!
//! The reporter runs on whatever stack is left below the guard, so this
//! avoids `core::fmt` entirely: one 8-byte buffer, no formatter state.

use arbitrary_int::u4;

/// Number of digits in a rendered word
pub const HEX_DIGITS: usize = 8;

/// Shown in place of a word whose value could not be trusted
pub const UNKNOWN: &str = "????????";

/// A 32-bit word as eight uppercase hexadecimal digits
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Hex8([u8; HEX_DIGITS]);

impl Hex8 {
    /// Render `value`, most significant nibble first
    pub fn new(value: u32) -> Hex8 {
        let mut digits = [b'0'; HEX_DIGITS];
        for (i, digit) in digits.iter_mut().enumerate() {
            let shift = (HEX_DIGITS - 1 - i) * 4;
            *digit = ascii(u4::new(((value >> shift) & 0xF) as u8));
        }
        Hex8(digits)
    }

    pub fn as_str(&self) -> &str {
        // Safety: every byte came from `ascii`
        unsafe { core::str::from_utf8_unchecked(&self.0) }
    }
}

fn ascii(nibble: u4) -> u8 {
    match nibble.value() {
        n @ 0..=9 => b'0' + n,
        n => b'A' + (n - 10),
    }
}

impl core::fmt::Display for Hex8 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::fmt::Debug for Hex8 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Hex8({})", self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Hex8 {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremes() {
        assert_eq!(Hex8::new(0).as_str(), "00000000");
        assert_eq!(Hex8::new(u32::MAX).as_str(), "FFFFFFFF");
    }

    #[test]
    fn digit_order_and_case() {
        assert_eq!(Hex8::new(0x1000_0042).as_str(), "10000042");
        assert_eq!(Hex8::new(0xDEAD_BEEF).as_str(), "DEADBEEF");
        assert_eq!(Hex8::new(0x0123_4567).as_str(), "01234567");
        assert_eq!(Hex8::new(0x89AB_CDEF).as_str(), "89ABCDEF");
    }

    #[test]
    fn display_matches_str() {
        assert_eq!(format!("{}", Hex8::new(0xA5)), "000000A5");
        assert_eq!(format!("{:?}", Hex8::new(0xA5)), "Hex8(000000A5)");
    }

    #[test]
    fn placeholder_is_as_wide_as_a_word() {
        assert_eq!(UNKNOWN.len(), HEX_DIGITS);
    }
}
