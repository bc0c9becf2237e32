//! # Stack-overrun trap for Arm Cortex-M
//!
//! This library supplies a HardFault handler, `_stack_trap`, that still works
//! when the fault was caused by the stack running off the bottom of its
//! region. It captures every general purpose register, moves onto a stack
//! just below the stack guard, and hands over to the reporter in the
//! `stack-trap` crate, which prints a register dump and then calls your error
//! routine. That routine must not return; typically it `longjmp`s (or the
//! moral equivalent) back to a known-good point above the guard.
//!
//! ## Features
//!
//! - `semihosting`: the default text and error sinks print through
//!   semihosting, and the default error sink exits with the fault code.
//!
//! ## Information about the Run-Time
//!
//! This crate does not own the vector table. Either point your start-up
//! crate's HardFault entry at `_stack_trap`, or call [`arm`] to copy the live
//! vector table into RAM with `_stack_trap` patched in.
//!
//! The stack guard is a single word, `_stack_guard`. Whatever installs the
//! guard (an MPU region, `MSPLIM`, or nothing at all) should record the
//! guard's lowest address with [`set_stack_guard`]. When the guard is zero
//! the trampoline stays on the faulting stack.
//!
//! Link with `-Tstack-trap.x`. It `PROVIDE`s default sinks and makes sure
//! `_stack_trap` is kept.
//!
//! ### C-Compatible Functions
//!
//! * `_crash_text` - an `extern "C"` function that receives each piece of the
//!   register dump. Our linker script PROVIDEs a default at
//!   `_default_crash_text`, but you can override it (see [`crash_text`]).
//!
//!   Expected prototype:
//!
//!   ```rust,ignore
//!   #[unsafe(no_mangle)]
//!   unsafe extern "C" fn _crash_text(ptr: *const u8, len: usize);
//!   ```
//!
//! * `_crash_error` - an `extern "C"` function called last, with code 255 and
//!   either `"\r\nStack overrun"` or `"\r\nHard fault"`. It must not return.
//!   Our linker script PROVIDEs a default at `_default_crash_error`, but you
//!   can override it (see [`crash_error`]).
//!
//!   Expected prototype:
//!
//!   ```rust,ignore
//!   #[unsafe(no_mangle)]
//!   unsafe extern "C" fn _crash_error(code: i32, ptr: *const u8, len: usize) -> !;
//!   ```
//!
//! ## Outputs
//!
//! This library produces global symbols called:
//!
//! * `_stack_trap` - the assembly language trampoline, suitable as a HardFault
//!   vector
//! * `_stack_guard` - the stack guard boundary, one word, zero when no guard is
//!   installed
//! * `_crash_report` - the `extern "C"` function the trampoline returns into,
//!   with a pointer to the register report in `r0`
//! * `_default_crash_text` - discards text, or prints it over semihosting
//! * `_default_crash_error` - spins forever, or exits over semihosting
//!
//! The trampoline has to be in assembly language because nothing about the
//! faulting stack can be trusted. It saves R0-R3 on the faulting stack (they
//! only exist in registers), then moves SP to the guard address and builds the
//! rest of the report there. Finally it fakes an exception frame whose PC is
//! `_crash_report` and performs an exception return into it, so the reporter
//! runs as ordinary Thread mode code on the new stack.

#![cfg_attr(not(test), no_std)]

use core::sync::atomic::{AtomicU32, Ordering};

use stack_trap::StackGuard;

pub use stack_trap_rt_macros::{crash_error, crash_text};

mod vectors;

#[cfg(arm_profile = "m")]
pub use vectors::arm;
pub use vectors::{VectorTable, HARD_FAULT, VECTOR_TABLE_WORDS};

#[cfg(all(target_arch = "arm", not(arm_profile = "m")))]
compile_error!("stack-trap-rt only supports Arm M-profile targets");

/// The stack guard boundary, as read by the trampoline and the reporter
#[export_name = "_stack_guard"]
static STACK_GUARD: AtomicU32 = AtomicU32::new(0);

/// Record the lowest address of a newly installed stack guard
pub fn set_stack_guard(boundary: u32) {
    STACK_GUARD.store(boundary, Ordering::Relaxed);
}

/// Record that no stack guard is installed
pub fn clear_stack_guard() {
    STACK_GUARD.store(0, Ordering::Relaxed);
}

/// The current stack guard boundary, zero if there is none
pub fn stack_guard() -> u32 {
    STACK_GUARD.load(Ordering::Relaxed)
}

/// [`StackGuard`] over the `_stack_guard` word
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardWord;

impl StackGuard for GuardWord {
    fn boundary(&self) -> u32 {
        stack_guard()
    }
}

/// Rebuild a `&str` handed over by one of the sinks.
///
/// # Safety
///
/// `ptr` and `len` must describe a live UTF-8 string.
#[cfg_attr(not(feature = "semihosting"), allow(dead_code))]
unsafe fn sink_str<'a>(ptr: *const u8, len: usize) -> &'a str {
    unsafe { core::str::from_utf8_unchecked(core::slice::from_raw_parts(ptr, len)) }
}

/// Our default text sink.
///
/// We end up here if the weak `PROVIDE` in stack-trap.x hasn't been
/// over-ridden.
///
/// # Safety
///
/// `ptr` and `len` must describe a live UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _default_crash_text(ptr: *const u8, len: usize) {
    #[cfg(feature = "semihosting")]
    {
        let text = unsafe { sink_str(ptr, len) };
        semihosting::print!("{}", text);
    }
    #[cfg(not(feature = "semihosting"))]
    {
        let _ = (ptr, len);
    }
}

/// Our default error sink.
///
/// We end up here if the weak `PROVIDE` in stack-trap.x hasn't been
/// over-ridden.
///
/// # Safety
///
/// `ptr` and `len` must describe a live UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _default_crash_error(code: i32, ptr: *const u8, len: usize) -> ! {
    #[cfg(feature = "semihosting")]
    {
        let message = unsafe { sink_str(ptr, len) };
        semihosting::println!("{}", message);
        semihosting::process::exit(code);
    }
    #[cfg(not(feature = "semihosting"))]
    {
        let _ = (code, ptr, len);
        loop {
            stack_trap::asm::nop();
        }
    }
}

#[cfg(arm_profile = "m")]
extern "C" {
    fn _crash_text(ptr: *const u8, len: usize);
    fn _crash_error(code: i32, ptr: *const u8, len: usize) -> !;
}

/// [`stack_trap::Recovery`] through the `_crash_error` symbol
#[cfg(arm_profile = "m")]
struct ExternRecovery;

#[cfg(arm_profile = "m")]
impl stack_trap::Recovery for ExternRecovery {
    fn error(&mut self, code: i32, message: &str) -> ! {
        unsafe { _crash_error(code, message.as_ptr(), message.len()) }
    }
}

/// Where the trampoline's fake exception frame returns to.
///
/// Runs in Thread mode on the stack just below the guard.
#[cfg(arm_profile = "m")]
#[unsafe(no_mangle)]
unsafe extern "C" fn _crash_report(report: *const u32) -> ! {
    // Safety: the trampoline passes the report it just pushed, and nothing
    // pops it because we never return
    let report = unsafe { stack_trap::RegisterReport::from_ptr(report) };
    stack_trap::crash_report(
        report,
        &GuardWord,
        &mut |text: &str| unsafe { _crash_text(text.as_ptr(), text.len()) },
        &mut ExternRecovery,
    )
}

/// This macro expands to code that turns off the Main stack limit check,
/// because the trampoline is about to run below the stack floor on purpose.
///
/// Armv8-M Baseline only has `MSPLIM` in Secure state, and the trap does not
/// support running Secure firmware, so Baseline is left alone.
#[cfg(arm_architecture = "v8-m.main")]
macro_rules! clear_stack_limit {
    () => {
        r#"
        // reset stack limit
        movs    r0, #0
        msr     msplim, r0
        "#
    };
}

/// This macro expands to code that does nothing because there is no stack
/// limit register
#[cfg(not(arm_architecture = "v8-m.main"))]
macro_rules! clear_stack_limit {
    () => {
        r#"
        // no stack limit register - do nothing
        "#
    };
}

// The HardFault trampoline.
//
// The report is built by pushing, so the pushes below run in reverse report
// order: R4-R7 end up at the highest address (words 19-22) and the fault-time
// SP at the lowest (word 0). Only Thumb-1 instructions are used, so this
// assembles for Armv6-M too.
#[cfg(arm_profile = "m")]
core::arch::global_asm!(
    r#"
    .section .text._stack_trap,"ax",%progbits
    .global _stack_trap
    .type _stack_trap, %function
    .thumb_func
    _stack_trap:
        // R0-R3 only exist in registers, so they have to go on the faulting stack
        push    {{r0-r3}}
    "#,
    clear_stack_limit!(),
    r#"
        // r0 = faulting stack, pointing at the R0-R3 we just saved
        mov     r0, sp
        // r1 walks the data block
        adr     r1, 2f
        ldm     r1!, {{r2}}
        ldr     r2, [r2]
        // no guard? stay where we are
        cmp     r2, #0
        beq     1f
        // move to the stack below the guard
        mov     sp, r2
    1:
        // one word of padding keeps the reporter's stack 8-byte aligned
        sub     sp, sp, #4
        // R4-R7 (words 19-22)
        push    {{r4-r7}}
        // R8-R11 (words 15-18)
        mov     r4, r8
        mov     r5, r9
        mov     r6, r10
        mov     r7, r11
        push    {{r4-r7}}
        // R12 and LR (words 13-14)
        mov     r4, r12
        mov     r5, lr
        push    {{r4-r5}}
        // the R0-R3 we saved on the faulting stack (words 9-12)
        ldm     r0!, {{r4-r7}}
        push    {{r4-r7}}
        // R0-R3 from the exception frame (words 5-8)
        ldm     r0!, {{r4-r7}}
        push    {{r4-r7}}
        // R12, LR, PC and xPSR from the exception frame (words 1-4), and r0,
        // now just above the frame, as the fault-time SP (word 0)
        ldm     r0!, {{r4-r7}}
        push    {{r0, r4-r7}}
        // r0 = the report
        mov     r0, sp
        // r2 = _crash_report, r3 = Thread mode xPSR, r4 = EXC_RETURN
        ldm     r1!, {{r2-r4}}
        // the stacked PC must not have the Thumb bit set
        movs    r5, #1
        bics    r2, r5
        movs    r5, #0
        // fake exception frame: xPSR, PC, LR, R12, R3, R2, R1, R0 = report
        push    {{r2-r3}}
        push    {{r5}}
        push    {{r5}}
        push    {{r5}}
        push    {{r5}}
        push    {{r5}}
        push    {{r0}}
        // exception return into _crash_report
        bx      r4

        .align  2
    2:
        .word   _stack_guard
        .word   _crash_report
        .word   {xpsr_thumb}
        .word   {exc_return}
    .size _stack_trap, . - _stack_trap
    "#,
    xpsr_thumb = const stack_trap::register::Xpsr::THREAD_THUMB.raw_value(),
    exc_return = const stack_trap::register::ExcReturn::THREAD_MAIN.raw_value(),
);
