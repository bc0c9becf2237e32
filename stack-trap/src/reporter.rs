//! Rendering and classifying a captured [`RegisterReport`]
//!
//! [`crash_report`] runs on the stack just below the guard region, so it
//! sticks to fixed tables and an 8-byte digit buffer.

use crate::guard::{Classification, StackGuard};
use crate::hex::{Hex8, UNKNOWN};
use crate::report::{index, RegisterReport};

/// Code passed to the error sink for every fault we report
pub const FAULT_CODE: i32 = 255;

/// Somewhere to send the register dump
pub trait Console {
    /// Emit `text` verbatim; the dump supplies its own line breaks
    fn text(&mut self, text: &str);
}

impl<F: FnMut(&str)> Console for F {
    fn text(&mut self, text: &str) {
        self(text)
    }
}

/// The way back to a safe execution context
pub trait Recovery {
    /// Report `message` and transfer control elsewhere. Never returns.
    fn error(&mut self, code: i32, message: &str) -> !;
}

/// What goes in each slot of the dump
#[derive(Clone, Copy)]
pub(crate) enum Slot {
    /// Taken from a register by the trampoline, always shown
    Captured(usize),
    /// Read back from the exception frame, unknown if the frame is not genuine
    Framed(usize),
    /// The frame's LR if the frame is genuine, otherwise the trampoline's
    LinkRegister,
    /// The guard boundary
    Guard,
}

/// Labelled values in the dump
pub(crate) const SLOTS: usize = 18;

/// Label and contents of each slot, left column then right column, row by row
pub(crate) static LAYOUT: [(&str, Slot); SLOTS] = [
    ("\r\nR0 = ", Slot::Captured(index::R0)),
    ("  R8  = ", Slot::Captured(index::R8)),
    ("\r\nR1 = ", Slot::Captured(index::R1)),
    ("  R9  = ", Slot::Captured(index::R9)),
    ("\r\nR2 = ", Slot::Captured(index::R2)),
    ("  R10 = ", Slot::Captured(index::R10)),
    ("\r\nR3 = ", Slot::Captured(index::R3)),
    ("  R11 = ", Slot::Captured(index::R11)),
    ("\r\nR4 = ", Slot::Captured(index::R4)),
    ("  R12 = ", Slot::Captured(index::R12)),
    ("\r\nR5 = ", Slot::Captured(index::R5)),
    ("  SP  = ", Slot::Captured(index::SP)),
    ("\r\nR6 = ", Slot::Captured(index::R6)),
    ("  LR  = ", Slot::LinkRegister),
    ("\r\nR7 = ", Slot::Captured(index::R7)),
    ("  PC  = ", Slot::Framed(index::FRAME_PC)),
    ("\r\nSG = ", Slot::Guard),
    ("  PSP = ", Slot::Framed(index::FRAME_PSP)),
];

/// Write the two-column register dump for `report` to `console`
pub fn render<C: Console + ?Sized>(report: &RegisterReport, guard: u32, console: &mut C) {
    let has_frame = report.has_frame();
    for &(label, cell) in LAYOUT.iter() {
        console.text(label);
        let value = match cell {
            Slot::Captured(i) => Some(report[i]),
            Slot::Framed(i) => has_frame.then_some(report[i]),
            Slot::LinkRegister if has_frame => Some(report[index::FRAME_LR]),
            Slot::LinkRegister => Some(report[index::LR]),
            Slot::Guard => Some(guard),
        };
        match value {
            Some(word) => console.text(Hex8::new(word).as_str()),
            None => console.text(UNKNOWN),
        }
    }
}

/// Dump `report`, classify the fault and hand over to `recovery`.
///
/// The guard is read once, so the dump and the classification agree.
pub fn crash_report<G, C, R>(
    report: &RegisterReport,
    guard: &G,
    console: &mut C,
    recovery: &mut R,
) -> !
where
    G: StackGuard + ?Sized,
    C: Console + ?Sized,
    R: Recovery + ?Sized,
{
    let guard = guard.boundary();
    render(report, guard, console);
    let classification = Classification::of(report.stack_pointer(), guard);
    recovery.error(FAULT_CODE, classification.message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::REPORT_WORDS;

    fn report_with_frame(genuine: bool) -> RegisterReport {
        let mut words = [0u32; REPORT_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = 0x1111_1111 * (i as u32 % 15);
        }
        let mut report = RegisterReport::new(words);
        for i in 0..4 {
            report = report.with(index::FRAME_R0 + i, report[index::R0 + i]);
        }
        if !genuine {
            report = report.with(index::FRAME_R2, !report[index::R2]);
        }
        report
    }

    fn rendered(report: &RegisterReport, guard: u32) -> String {
        let mut out = String::new();
        render(report, guard, &mut |s: &str| out.push_str(s));
        out
    }

    #[test]
    fn layout_pairs_columns() {
        let out = rendered(&report_with_frame(true), 0x2000_0000);
        let lines: Vec<&str> = out.split("\r\n").skip(1).collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("R0 = 99999999  R8  = "));
        assert!(lines[8].starts_with("SG = 20000000  PSP = "));
        for line in lines {
            assert_eq!(line.len(), "R0 = 00000000  R8  = 00000000".len());
        }
    }

    #[test]
    fn each_token_is_a_separate_write() {
        let mut writes = 0;
        render(&report_with_frame(false), 0, &mut |_: &str| writes += 1);
        assert_eq!(writes, LAYOUT.len() * 2);
    }

    #[test]
    fn genuine_frame_uses_frame_lr() {
        let report = report_with_frame(true);
        let out = rendered(&report, 0);
        let lr = Hex8::new(report[index::FRAME_LR]);
        assert!(out.contains(&format!("LR  = {lr}")));
        assert!(!out.contains(UNKNOWN));
    }

    #[test]
    fn stale_frame_uses_captured_lr() {
        let report = report_with_frame(false);
        let out = rendered(&report, 0);
        let lr = Hex8::new(report[index::LR]);
        assert!(out.contains(&format!("LR  = {lr}")));
        assert!(out.contains("PC  = ????????"));
        assert!(out.ends_with("PSP = ????????"));
    }
}
