//! The register set captured by the HardFault trampoline
//!
//! The trampoline builds the report by pushing registers, so the word order
//! here is fixed by the order of those pushes. Address words by the
//! constants in [`index`].

use crate::register::{ExcReturn, Xpsr};

/// Number of words in a [`RegisterReport`]
pub const REPORT_WORDS: usize = 23;

/// Positions of each captured value within a [`RegisterReport`]
///
/// `FRAME_*` words were read back from the exception frame the hardware
/// should have pushed. The rest were captured straight from registers.
pub mod index {
    /// Stack pointer at the time of the fault, above the exception frame
    pub const SP: usize = 0;
    pub const FRAME_R12: usize = 1;
    pub const FRAME_LR: usize = 2;
    pub const FRAME_PC: usize = 3;
    /// Eighth word of the exception frame (the stacked program status word)
    pub const FRAME_PSP: usize = 4;
    pub const FRAME_R0: usize = 5;
    pub const FRAME_R1: usize = 6;
    pub const FRAME_R2: usize = 7;
    pub const FRAME_R3: usize = 8;
    pub const R0: usize = 9;
    pub const R1: usize = 10;
    pub const R2: usize = 11;
    pub const R3: usize = 12;
    pub const R12: usize = 13;
    /// LR on entry to the trampoline, i.e. the EXC_RETURN value
    pub const LR: usize = 14;
    pub const R8: usize = 15;
    pub const R9: usize = 16;
    pub const R10: usize = 17;
    pub const R11: usize = 18;
    pub const R4: usize = 19;
    pub const R5: usize = 20;
    pub const R6: usize = 21;
    pub const R7: usize = 22;
}

/// Registers captured at HardFault entry.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegisterReport([u32; REPORT_WORDS]);

impl RegisterReport {
    /// Wrap words laid out in trampoline order
    pub const fn new(words: [u32; REPORT_WORDS]) -> RegisterReport {
        RegisterReport(words)
    }

    /// Borrow the report the trampoline left in memory.
    ///
    /// # Safety
    ///
    /// `ptr` must point at [`REPORT_WORDS`] readable, 4-byte aligned words
    /// that stay untouched for `'a`.
    pub unsafe fn from_ptr<'a>(ptr: *const u32) -> &'a RegisterReport {
        unsafe { &*ptr.cast::<RegisterReport>() }
    }

    /// Replace one word, for building reports by hand
    pub const fn with(mut self, index: usize, value: u32) -> RegisterReport {
        self.0[index] = value;
        self
    }

    /// All words, in trampoline order
    pub const fn words(&self) -> &[u32; REPORT_WORDS] {
        &self.0
    }

    /// Did the hardware really push the frame we read back?
    ///
    /// The trampoline saved R0-R3 itself before reading the frame. If the
    /// frame copies disagree with those, the frame words are stale memory.
    pub fn has_frame(&self) -> bool {
        self.0[index::FRAME_R0..=index::FRAME_R3] == self.0[index::R0..=index::R3]
    }

    /// Stack pointer at the time of the fault
    pub const fn stack_pointer(&self) -> u32 {
        self.0[index::SP]
    }

    /// The faulting PC, if the frame is genuine
    pub fn frame_pc(&self) -> Option<u32> {
        self.has_frame().then_some(self.0[index::FRAME_PC])
    }

    /// The stacked program status word, if the frame is genuine
    pub fn frame_xpsr(&self) -> Option<Xpsr> {
        self.has_frame()
            .then(|| Xpsr::new_with_raw_value(self.0[index::FRAME_PSP]))
    }

    /// LR as captured on entry to the trampoline
    pub fn exc_return(&self) -> ExcReturn {
        ExcReturn::new_with_raw_value(self.0[index::LR])
    }
}

impl core::ops::Index<usize> for RegisterReport {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.0[index]
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RegisterReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "RegisterReport {{ sp={=u32:#010x} lr={=u32:#010x} pc={} has_frame={=bool} }}",
            self.stack_pointer(),
            self.0[index::LR],
            self.frame_pc(),
            self.has_frame()
        )
    }
}
