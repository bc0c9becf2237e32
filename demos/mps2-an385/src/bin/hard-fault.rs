//! Example where a HardFault happens well clear of the stack guard.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use semihosting::println;
use stack_trap::Classification;

/// The entry-point to the Rust application.
#[entry]
fn main() -> ! {
    mps2_an385::arm_trap();
    let guard = mps2_an385::install_guard();
    println!("Hello, this is a hard fault example, guard at {:#010x}", guard);
    // the main stack is at the top of RAM, nowhere near the guard
    mps2_an385::fault();
}

/// Passes if the trap saw a plain hard fault with a genuine frame.
///
/// The fault-time SP depends on the code `main` compiled to, so only the
/// guard is checked.
#[stack_trap_rt::crash_error]
fn recover(code: i32, message: &str) -> ! {
    println!("{}", message);
    println!("error code {}", code);
    let pass = mps2_an385::dump_matches(code, message, Classification::HardFault, None);
    semihosting::process::exit(if pass { 0 } else { 1 });
}
