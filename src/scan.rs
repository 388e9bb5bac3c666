//! Command stream: lazily yields the eight recognized operations from raw
//! source text, with byte positions. Every other character is a comment and
//! is skipped silently. There are no scan-level errors; the only malformed
//! input the language admits is bracket mismatch, which the translator
//! detects.

use crate::span::{Span, Spanned};

/// The eight operations of the source language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    MoveRight, // >
    MoveLeft,  // <
    Increment, // +
    Decrement, // -
    Output,    // .
    Input,     // ,
    LoopOpen,  // [
    LoopClose, // ]
}

impl Command {
    /// Map a source byte to its command, or `None` for comment bytes.
    pub fn from_byte(b: u8) -> Option<Command> {
        match b {
            b'>' => Some(Command::MoveRight),
            b'<' => Some(Command::MoveLeft),
            b'+' => Some(Command::Increment),
            b'-' => Some(Command::Decrement),
            b'.' => Some(Command::Output),
            b',' => Some(Command::Input),
            b'[' => Some(Command::LoopOpen),
            b']' => Some(Command::LoopClose),
            _ => None,
        }
    }
}

/// Lazy scanner over program text. Recreate it to restart the stream.
pub struct CommandStream<'src> {
    source: &'src [u8],
    pos: usize,
}

impl<'src> CommandStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
        }
    }
}

impl<'src> Iterator for CommandStream<'src> {
    type Item = Spanned<Command>;

    fn next(&mut self) -> Option<Spanned<Command>> {
        while self.pos < self.source.len() {
            let at = self.pos;
            self.pos += 1;
            if let Some(cmd) = Command::from_byte(self.source[at]) {
                return Some(Spanned::new(cmd, Span::at(at)));
            }
        }
        None
    }
}
