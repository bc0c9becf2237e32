//! Stack guard boundary and fault classification

/// Size of the guard window above the boundary, in bytes
///
/// A fault-time stack pointer in `[guard, guard + GUARD_WINDOW)` means the
/// stack ran into the guard.
pub const GUARD_WINDOW: u32 = 0x200;

/// Read access to the current stack guard boundary
///
/// Installing and moving the guard belongs to someone else; the reporter only
/// ever reads it.
pub trait StackGuard {
    /// The lowest address of the guard region
    fn boundary(&self) -> u32;
}

impl StackGuard for u32 {
    fn boundary(&self) -> u32 {
        *self
    }
}

impl<G: StackGuard + ?Sized> StackGuard for &G {
    fn boundary(&self) -> u32 {
        G::boundary(self)
    }
}

/// What kind of fault we caught
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Classification {
    /// The stack pointer was inside the guard window
    StackOverrun,
    /// Anything else
    HardFault,
}

impl Classification {
    /// Classify a fault from the stack pointer at fault time
    pub fn of(sp: u32, guard: u32) -> Classification {
        if in_guard_window(sp, guard) {
            Classification::StackOverrun
        } else {
            Classification::HardFault
        }
    }

    /// The message handed to the error sink
    pub const fn message(self) -> &'static str {
        match self {
            Classification::StackOverrun => "\r\nStack overrun",
            Classification::HardFault => "\r\nHard fault",
        }
    }
}

/// Is `sp` within `[guard, guard + GUARD_WINDOW)`?
pub fn in_guard_window(sp: u32, guard: u32) -> bool {
    sp >= guard && sp - guard < GUARD_WINDOW
}
