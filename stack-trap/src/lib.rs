//! # HardFault capture and stack-overrun reporting for Arm Cortex-M
//!
//! This crate holds the parts of the stack trap that are plain Rust: the
//! [`RegisterReport`] the trampoline in `stack-trap-rt` fills in, the code
//! that renders it, and the test that tells a stack overrun from any other
//! HardFault.
//!
//! The dump looks like this (values in hex, `????????` where the hardware
//! exception frame could not be trusted):
//!
//! ```text
//! R0 = 00000001  R8  = 00000000
//! R1 = 00000002  R9  = 00000000
//! R2 = 00000003  R10 = 00000000
//! R3 = 00000004  R11 = 00000000
//! R4 = 00000000  R12 = 00000000
//! R5 = 00000000  SP  = 20000100
//! R6 = 00000000  LR  = 10000321
//! R7 = 00000000  PC  = 10000042
//! SG = 20000000  PSP = 01000000
//! Stack overrun
//! ```
//!
//! ## Features
//!
//! - `defmt`: adds `defmt::Format` for the report and register types.

#![cfg_attr(not(test), no_std)]

pub mod asm;
pub mod guard;
pub mod hex;
pub mod register;
pub mod report;
pub mod reporter;
pub mod transcript;

pub use guard::{Classification, StackGuard, GUARD_WINDOW};
pub use report::{index, RegisterReport, REPORT_WORDS};
pub use reporter::{crash_report, render, Console, Recovery, FAULT_CODE};
pub use transcript::{Token, Transcript};
