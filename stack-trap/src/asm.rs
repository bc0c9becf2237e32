//! Simple assembly routines
//!
//! On anything other than an Arm target these collapse to compiler fences, so
//! the code that calls them stays testable on the host.

use core::sync::atomic::{compiler_fence, Ordering};

/// Data Synchronization Barrier
///
/// Acts as a special kind of memory barrier. No instruction in program order after this instruction
/// can execute until this instruction completes. This instruction completes only when any explicit
/// memory access made before this instruction is complete.
#[inline]
pub fn dsb() {
    compiler_fence(Ordering::SeqCst);
    #[cfg(target_arch = "arm")]
    unsafe {
        core::arch::asm!("dsb", options(nostack, preserves_flags));
    }
    compiler_fence(Ordering::SeqCst);
}

/// Instruction Synchronization Barrier
///
/// Flushes the pipeline in the processor, so that all instructions following the `ISB` are fetched
/// from cache or memory, after the instruction has been completed. Required after moving `VTOR`.
#[inline]
pub fn isb() {
    compiler_fence(Ordering::SeqCst);
    #[cfg(target_arch = "arm")]
    unsafe {
        core::arch::asm!("isb", options(nostack, preserves_flags));
    }
    compiler_fence(Ordering::SeqCst);
}

/// Emit an NOP instruction
#[inline]
pub fn nop() {
    #[cfg(target_arch = "arm")]
    unsafe {
        core::arch::asm!("nop", options(nomem, nostack, preserves_flags))
    }
    #[cfg(not(target_arch = "arm"))]
    core::hint::spin_loop();
}
