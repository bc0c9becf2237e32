//! Code for the stacked xPSR (*Combined Program Status Register*)

use arbitrary_int::u9;

/// xPSR, as found in the eighth word of a basic exception frame
#[bitbybit::bitfield(u32)]
pub struct Xpsr {
    /// Thumb state. Cortex-M only executes Thumb code, so a frame with this
    /// bit clear faults again on return.
    #[bit(24, rw)]
    t: bool,
    /// Set when the hardware inserted a padding word to 8-byte align the frame
    #[bit(9, rw)]
    frame_padded: bool,
    /// Active exception number. Zero means Thread mode.
    #[bits(0..=8, rw)]
    exception: u9,
}

impl Xpsr {
    /// Status word for a frame that returns to Thread mode, Thumb state
    pub const THREAD_THUMB: Xpsr = Xpsr::new_with_raw_value(0).with_t(true);

    /// Was the interrupted code running in Thread mode?
    pub fn is_thread(&self) -> bool {
        self.exception().value() == 0
    }
}

impl core::fmt::Debug for Xpsr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "XPSR {{ t={} padded={} exception={} }}",
            self.t(),
            self.frame_padded(),
            self.exception()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Xpsr {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "XPSR {{ t={=bool} padded={=bool} exception={=u16} }}",
            self.t(),
            self.frame_padded(),
            self.exception().value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_thumb_is_t_bit_only() {
        assert_eq!(Xpsr::THREAD_THUMB.raw_value(), 0x0100_0000);
        assert!(Xpsr::THREAD_THUMB.is_thread());
    }

    #[test]
    fn hard_fault_number_decodes() {
        let xpsr = Xpsr::new_with_raw_value(0x0100_0203);
        assert!(xpsr.t());
        assert!(xpsr.frame_padded());
        assert_eq!(xpsr.exception().value(), 3);
        assert!(!xpsr.is_thread());
    }
}
