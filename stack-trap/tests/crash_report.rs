//! Drives the reporter the way the runtime does, with a console that records
//! and a recovery routine that unwinds instead of jumping.

use std::panic::{self, AssertUnwindSafe};

use stack_trap::{
    crash_report, index, render, Recovery, RegisterReport, Token, Transcript, FAULT_CODE,
    REPORT_WORDS,
};

const GUARD: u32 = 0x2000_0000;

/// What the error sink was called with
#[derive(Debug, PartialEq)]
struct Diverted {
    code: i32,
    message: String,
}

struct Unwind {
    calls: usize,
}

impl Recovery for Unwind {
    fn error(&mut self, code: i32, message: &str) -> ! {
        self.calls += 1;
        panic::panic_any(Diverted {
            code,
            message: message.to_owned(),
        })
    }
}

/// Run the reporter to completion, returning the dump and the diverging call
fn run(report: &RegisterReport, guard: u32) -> (String, Diverted) {
    let mut console = String::new();
    let mut recovery = Unwind { calls: 0 };
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        crash_report(
            report,
            &guard,
            &mut |s: &str| console.push_str(s),
            &mut recovery,
        )
    }));
    assert_eq!(recovery.calls, 1);
    let payload = match result {
        Err(payload) => payload,
        Ok(_) => unreachable!("crash_report returned"),
    };
    let diverted = *payload
        .downcast::<Diverted>()
        .expect("recovery was not the thing that diverged");
    (console, diverted)
}

/// Registers as a real fault would leave them
fn report(sp: u32, genuine: bool) -> RegisterReport {
    let base = RegisterReport::new([0; REPORT_WORDS])
        .with(index::SP, sp)
        .with(index::R0, 0x0000_0001)
        .with(index::R1, 0x0000_0002)
        .with(index::R2, 0x0000_0003)
        .with(index::R3, 0x0000_0004)
        .with(index::R4, 0x0000_0005)
        .with(index::R5, 0x0000_0006)
        .with(index::R6, 0x0000_0007)
        .with(index::R7, 0x0000_0008)
        .with(index::R8, 0x0000_0009)
        .with(index::R9, 0x0000_000A)
        .with(index::R10, 0x0000_000B)
        .with(index::R11, 0x0000_000C)
        .with(index::R12, 0x0000_000D)
        .with(index::LR, 0xFFFF_FFF9)
        .with(index::FRAME_R12, 0x0000_000D)
        .with(index::FRAME_LR, 0x1000_0321)
        .with(index::FRAME_PC, 0x1000_0042)
        .with(index::FRAME_PSP, 0x0100_0000);
    if genuine {
        base.with(index::FRAME_R0, 0x0000_0001)
            .with(index::FRAME_R1, 0x0000_0002)
            .with(index::FRAME_R2, 0x0000_0003)
            .with(index::FRAME_R3, 0x0000_0004)
    } else {
        base.with(index::FRAME_R0, 0xE000_ED08)
            .with(index::FRAME_R1, 0x0000_0002)
            .with(index::FRAME_R2, 0x0000_0003)
            .with(index::FRAME_R3, 0x0000_0004)
    }
}

#[test]
fn overrun_with_genuine_frame() {
    let (dump, diverted) = run(&report(GUARD + 0x100, true), GUARD);
    let expected = "\r\nR0 = 00000001  R8  = 00000009\
                    \r\nR1 = 00000002  R9  = 0000000A\
                    \r\nR2 = 00000003  R10 = 0000000B\
                    \r\nR3 = 00000004  R11 = 0000000C\
                    \r\nR4 = 00000005  R12 = 0000000D\
                    \r\nR5 = 00000006  SP  = 20000100\
                    \r\nR6 = 00000007  LR  = 10000321\
                    \r\nR7 = 00000008  PC  = 10000042\
                    \r\nSG = 20000000  PSP = 01000000";
    assert_eq!(dump, expected);
    assert_eq!(
        diverted,
        Diverted {
            code: FAULT_CODE,
            message: "\r\nStack overrun".to_owned()
        }
    );
}

#[test]
fn hard_fault_with_stale_frame() {
    let (dump, diverted) = run(&report(GUARD + 0x1000, false), GUARD);
    assert!(dump.contains("\r\nR6 = 00000007  LR  = FFFFFFF9"));
    assert!(dump.contains("\r\nR7 = 00000008  PC  = ????????"));
    assert!(dump.contains("\r\nSG = 20000000  PSP = ????????"));
    assert!(!dump.contains("10000321"));
    assert_eq!(diverted.code, 255);
    assert_eq!(diverted.message, "\r\nHard fault");
}

#[test]
fn window_edges() {
    assert_eq!(run(&report(GUARD, true), GUARD).1.message, "\r\nStack overrun");
    assert_eq!(
        run(&report(GUARD + 0x1FF, false), GUARD).1.message,
        "\r\nStack overrun"
    );
    assert_eq!(
        run(&report(GUARD + 0x200, true), GUARD).1.message,
        "\r\nHard fault"
    );
}

#[test]
fn captured_registers_survive_a_stale_frame() {
    let (dump, _) = run(&report(0x2003_F000, false), GUARD);
    assert!(dump.starts_with("\r\nR0 = 00000001  R8  = 00000009"));
    assert!(dump.contains("R12 = 0000000D"));
    assert!(dump.contains("SP  = 2003F000"));
}

#[test]
fn transcript_reads_back_a_genuine_dump() {
    let mut transcript = Transcript::new();
    render(&report(GUARD + 0x100, true), GUARD, &mut transcript);
    assert!(transcript.is_complete());
    assert!(!transcript.saw_unknown());
    assert_eq!(transcript.word("SP"), Some(GUARD + 0x100));
    assert_eq!(transcript.word("SG"), Some(GUARD));
    assert_eq!(transcript.word("PC"), Some(0x1000_0042));
    assert_eq!(transcript.word("LR"), Some(0x1000_0321));
    assert_eq!(transcript.word("R11"), Some(0x0000_000C));
}

#[test]
fn transcript_sees_the_placeholders_of_a_stale_frame() {
    let mut transcript = Transcript::new();
    render(&report(GUARD + 0x100, false), GUARD, &mut transcript);
    assert!(transcript.is_complete());
    assert!(transcript.saw_unknown());
    assert_eq!(transcript.token("PC"), Token::Unknown);
    assert_eq!(transcript.token("PSP"), Token::Unknown);
    assert_eq!(transcript.word("LR"), Some(0xFFFF_FFF9));
}
