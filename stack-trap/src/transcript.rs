//! Reading a rendered dump back, one write at a time
//!
//! A [`Transcript`] is a [`Console`] that remembers the value shown after each
//! label, so a text sink can check what the trampoline captured without
//! buffering the whole dump.

use crate::hex::{HEX_DIGITS, UNKNOWN};
use crate::reporter::{Console, LAYOUT, SLOTS};

/// What a transcript saw after one label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Token {
    /// The label never appeared, or nothing followed it
    Missing,
    /// The `????????` placeholder
    Unknown,
    /// A hex word
    Word(u32),
}

/// Records a dump as it is written
#[derive(Debug, Clone)]
pub struct Transcript {
    pending: Option<usize>,
    tokens: [Token; SLOTS],
    stray: bool,
}

impl Transcript {
    /// An empty transcript
    pub const fn new() -> Transcript {
        Transcript {
            pending: None,
            tokens: [Token::Missing; SLOTS],
            stray: false,
        }
    }

    /// The value shown for register `name`, e.g. `"SP"` or `"SG"`
    pub fn token(&self, name: &str) -> Token {
        LAYOUT
            .iter()
            .position(|&(label, _)| label_name(label) == name)
            .map_or(Token::Missing, |slot| self.tokens[slot])
    }

    /// The word shown for register `name`, if there was one
    pub fn word(&self, name: &str) -> Option<u32> {
        match self.token(name) {
            Token::Word(value) => Some(value),
            _ => None,
        }
    }

    /// Did any slot show the placeholder?
    pub fn saw_unknown(&self) -> bool {
        self.tokens.contains(&Token::Unknown)
    }

    /// Every label was followed by a value, and nothing else was written
    pub fn is_complete(&self) -> bool {
        !self.stray && self.pending.is_none() && !self.tokens.contains(&Token::Missing)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Transcript::new()
    }
}

impl Console for Transcript {
    fn text(&mut self, text: &str) {
        match self.pending.take() {
            Some(slot) => match parse(text) {
                Some(token) => self.tokens[slot] = token,
                None => self.stray = true,
            },
            None => match LAYOUT.iter().position(|&(label, _)| label == text) {
                Some(slot) => self.pending = Some(slot),
                None => self.stray = true,
            },
        }
    }
}

/// `"\r\nR0 = "` becomes `"R0"`
fn label_name(label: &str) -> &str {
    label.split_whitespace().next().unwrap_or(label)
}

fn parse(text: &str) -> Option<Token> {
    if text == UNKNOWN {
        return Some(Token::Unknown);
    }
    if text.len() != HEX_DIGITS || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(text, 16).ok().map(Token::Word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(transcript: &mut Transcript, pieces: &[&str]) {
        for piece in pieces {
            transcript.text(piece);
        }
    }

    #[test]
    fn names_come_from_labels() {
        assert_eq!(label_name("\r\nR0 = "), "R0");
        assert_eq!(label_name("  SP  = "), "SP");
        assert_eq!(label_name("\r\nSG = "), "SG");
    }

    #[test]
    fn value_follows_its_label() {
        let mut transcript = Transcript::new();
        feed(&mut transcript, &["  SP  = ", "20000100", "  PC  = ", "????????"]);
        assert_eq!(transcript.word("SP"), Some(0x2000_0100));
        assert_eq!(transcript.token("PC"), Token::Unknown);
        assert_eq!(transcript.token("R0"), Token::Missing);
        assert!(transcript.saw_unknown());
        assert!(!transcript.is_complete());
    }

    #[test]
    fn unknown_name_is_missing() {
        let transcript = Transcript::new();
        assert_eq!(transcript.token("XPSR"), Token::Missing);
    }

    #[test]
    fn stray_text_spoils_the_transcript() {
        let mut transcript = Transcript::new();
        feed(&mut transcript, &["  SP  = ", "2000010"]);
        assert_eq!(transcript.token("SP"), Token::Missing);
        let mut transcript = Transcript::new();
        feed(&mut transcript, &["hello"]);
        assert!(!transcript.is_complete());
    }
}
