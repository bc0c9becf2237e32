//! Code for EXC_RETURN, the value found in LR on entry to an exception handler

use arbitrary_int::u4;

/// Where an exception return goes, from the low nibble of EXC_RETURN
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReturnTo {
    /// Handler mode, frame on the Main stack
    HandlerMain = 0b0001,
    /// Thread mode, frame on the Main stack
    ThreadMain = 0b1001,
    /// Thread mode, frame on the Process stack
    ThreadProcess = 0b1101,
}

/// EXC_RETURN
#[bitbybit::bitfield(u32)]
pub struct ExcReturn {
    /// Always `0xF` for a genuine EXC_RETURN
    #[bits(28..=31, r)]
    prefix: u4,
    /// Set for a basic (integer only) frame, clear when FP state was stacked
    #[bit(4, rw)]
    basic_frame: bool,
    /// Set to return to Thread mode, clear for Handler mode
    #[bit(3, rw)]
    thread: bool,
    /// Set to restore from the Process stack, clear for the Main stack
    #[bit(2, rw)]
    process_stack: bool,
}

impl ExcReturn {
    /// Return to Thread mode on the Main stack with a basic frame (`0xFFFF_FFF9`)
    pub const THREAD_MAIN: ExcReturn = ExcReturn::new_with_raw_value(0xFFFF_FFE1)
        .with_basic_frame(true)
        .with_thread(true)
        .with_process_stack(false);

    /// Does this look like an EXC_RETURN value at all?
    pub fn is_exc_return(&self) -> bool {
        self.prefix().value() == 0xF
    }

    /// Decode the return mode and stack from the low nibble
    pub fn return_to(&self) -> Result<ReturnTo, u8> {
        let raw = (self.raw_value() & 0xF) as u8;
        ReturnTo::try_from(raw).map_err(|_| raw)
    }
}

impl core::fmt::Debug for ExcReturn {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "EXC_RETURN {{ basic_frame={} thread={} process_stack={} return_to={:?} }}",
            self.basic_frame(),
            self.thread(),
            self.process_stack(),
            self.return_to()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ExcReturn {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "EXC_RETURN {{ basic_frame={=bool} thread={=bool} process_stack={=bool} return_to={} }}",
            self.basic_frame(),
            self.thread(),
            self.process_stack(),
            self.return_to()
        )
    }
}
