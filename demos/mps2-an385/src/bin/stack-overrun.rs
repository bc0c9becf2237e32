//! Example where the stack pointer ends up inside the guard window.

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
    println!("Hello, this is a stack overrun example, guard at {:#010x}", guard);
    mps2_an385::fault_with_sp(guard + 0x100);
}

/// Passes if the trap saw an overrun and dumped the SP we faulted with.
#[stack_trap_rt::crash_error]
fn recover(code: i32, message: &str) -> ! {
    println!("{}", message);
    println!("error code {}", code);
    let sp = stack_trap_rt::stack_guard() + 0x100;
    let pass = mps2_an385::dump_matches(code, message, Classification::StackOverrun, Some(sp));
    semihosting::process::exit(if pass { 0 } else { 1 });
}
