//! Common code for all examples

#![no_std]

use core::ptr::{addr_of, addr_of_mut};

use stack_trap::{Classification, Console, Transcript, FAULT_CODE};
use stack_trap_rt::VectorTable;

#[cfg(not(arm_profile = "m"))]
compile_error!("This example/board is only compatible with Arm M-profile targets");

/// Entries copied from cortex-m-rt's vector table
const LIVE_VECTORS: usize = 48;

/// Bytes set aside for the stack guard and the reporter's stack below it
const GUARD_REGION_BYTES: usize = 2048;

static mut VECTORS: VectorTable = VectorTable::new();

/// What the text sink has seen of the dump so far
static mut TRANSCRIPT: Transcript = Transcript::new();

#[repr(C, align(8))]
struct GuardRegion([u8; GUARD_REGION_BYTES]);

static mut GUARD_REGION: GuardRegion = GuardRegion([0; GUARD_REGION_BYTES]);

/// Make `_stack_trap` the HardFault handler.
pub fn arm_trap() {
    // Safety: called once, before anything else touches VECTORS
    unsafe {
        stack_trap_rt::arm(&mut *addr_of_mut!(VECTORS), LIVE_VECTORS);
    }
}

/// Install a pretend guard in the middle of our guard region and return its
/// address. The lower half is where the reporter's stack goes.
pub fn install_guard() -> u32 {
    let base = addr_of_mut!(GUARD_REGION) as u32;
    let guard = base + (GUARD_REGION_BYTES as u32 / 2);
    stack_trap_rt::set_stack_guard(guard);
    guard
}

/// Fault on the current stack.
///
/// `udf` raises a UsageFault, which escalates to HardFault because
/// UsageFault is not enabled.
pub fn fault() -> ! {
    unsafe {
        core::arch::asm!("udf    #0", options(noreturn));
    }
}

/// Fault with `sp` as the stack pointer.
pub fn fault_with_sp(sp: u32) -> ! {
    unsafe {
        core::arch::asm!(
            "mov    sp, {sp}",
            "udf    #0",
            sp = in(reg) sp,
            options(noreturn)
        );
    }
}

#[stack_trap_rt::crash_text]
fn console(text: &str) {
    semihosting::print!("{}", text);
    // Safety: the sinks run once, in Thread mode, after the fault
    unsafe { (*addr_of_mut!(TRANSCRIPT)).text(text) };
}

/// Check what reached the sinks.
///
/// Passes when the code is [`FAULT_CODE`], the message matches `expected`,
/// every slot of the dump held a real value, `SG` is the installed guard and,
/// if given, `SP` is `sp`.
pub fn dump_matches(code: i32, message: &str, expected: Classification, sp: Option<u32>) -> bool {
    // Safety: the text sink is done by the time the error sink runs
    let dump = unsafe { &*addr_of!(TRANSCRIPT) };
    let guard = stack_trap_rt::stack_guard();
    let checks = [
        ("error code", code == FAULT_CODE),
        ("message", message == expected.message()),
        ("complete dump", dump.is_complete()),
        ("genuine frame", !dump.saw_unknown()),
        ("SG", dump.word("SG") == Some(guard)),
        ("SP", sp.is_none() || dump.word("SP") == sp),
    ];
    let mut pass = true;
    for (what, ok) in checks {
        if !ok {
            semihosting::println!("FAIL: {}", what);
            pass = false;
        }
    }
    pass
}

/// Called when the application raises an unrecoverable `panic!`.
///
/// Prints the panic to the console and then exits QEMU using a semihosting
/// breakpoint.
#[panic_handler]
#[cfg(target_os = "none")]
fn panic(info: &core::panic::PanicInfo) -> ! {
    semihosting::println!("PANIC: {:#?}", info);
    semihosting::process::abort();
}
