//! Single-pass translator from the command stream to the block IR.
//!
//! Loops lower to a header/body/exit triple: the block before the loop jumps
//! to the header, the header branches on the current cell (zero → exit,
//! nonzero → body), and the body's last block jumps back to the header.
//! Nesting is handled by a stack of open loop frames; the only user-facing
//! errors are unmatched brackets.

use std::fmt;

use crate::diagnostic::Diagnostic;
use crate::ir::builder::FunctionBuilder;
use crate::ir::{BlockId, Function, Inst, Module, Term};
use crate::scan::{Command, CommandStream};
use crate::span::{Span, Spanned};

// ─────────────────────────── Errors ───────────────────────────

/// Everything translation can report. Optimizer and builder defects are
/// panics, not variants; user input can only get brackets wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslateError {
    /// A `[` with no matching `]`. The span points at the earliest one.
    UnmatchedOpen { span: Span },
    /// A `]` with no loop open.
    UnmatchedClose { span: Span },
    /// The finished graph violated a structural invariant.
    MalformedCfg { detail: String },
}

impl TranslateError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            TranslateError::UnmatchedOpen { span } => {
                Diagnostic::error("unmatched `[`".to_string(), *span)
                    .with_note("this loop is never closed".to_string())
                    .with_help("add a matching `]`".to_string())
            }
            TranslateError::UnmatchedClose { span } => {
                Diagnostic::error("unmatched `]`".to_string(), *span)
                    .with_note("there is no open loop to close here".to_string())
                    .with_help("remove it, or open a loop with `[` before it".to_string())
            }
            TranslateError::MalformedCfg { detail } => Diagnostic::error(
                format!("malformed control-flow graph: {}", detail),
                Span::dummy(),
            ),
        }
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TranslateError::UnmatchedOpen { span } => {
                write!(f, "unmatched `[` at byte {}", span.start)
            }
            TranslateError::UnmatchedClose { span } => {
                write!(f, "unmatched `]` at byte {}", span.start)
            }
            TranslateError::MalformedCfg { detail } => {
                write!(f, "malformed control-flow graph: {}", detail)
            }
        }
    }
}

impl std::error::Error for TranslateError {}

// ─────────────────────────── Loop stack ───────────────────────────

/// One open loop: where `]` must jump back to, where code after the loop
/// goes, and the position of the `[` for error reporting.
struct LoopFrame {
    header: BlockId,
    exit: BlockId,
    open: Span,
}

// ─────────────────────────── Translator ───────────────────────────

struct Translator {
    builder: FunctionBuilder,
    stack: Vec<LoopFrame>,
}

impl Translator {
    fn new() -> Self {
        let mut builder = FunctionBuilder::new();
        let entry = builder.new_block();
        builder.set_insert_point(entry);
        Self {
            builder,
            stack: Vec::new(),
        }
    }

    fn command(&mut self, command: Spanned<Command>) -> Result<(), TranslateError> {
        match command.node {
            Command::MoveRight => self.builder.append(Inst::MovePointer(1)),
            Command::MoveLeft => self.builder.append(Inst::MovePointer(-1)),
            Command::Increment => self.builder.append(Inst::AddCell(1)),
            Command::Decrement => self.builder.append(Inst::AddCell(-1)),
            Command::Output => self.builder.append(Inst::Output),
            Command::Input => self.builder.append(Inst::Input),
            Command::LoopOpen => {
                let header = self.builder.new_block();
                let body = self.builder.new_block();
                let exit = self.builder.new_block();
                self.builder.terminate(Term::Jump(header));
                self.builder.set_insert_point(header);
                self.builder.terminate(Term::BranchIfZero {
                    zero: exit,
                    nonzero: body,
                });
                self.builder.set_insert_point(body);
                self.stack.push(LoopFrame {
                    header,
                    exit,
                    open: command.span,
                });
            }
            Command::LoopClose => {
                let frame = self
                    .stack
                    .pop()
                    .ok_or(TranslateError::UnmatchedClose { span: command.span })?;
                self.builder.terminate(Term::Jump(frame.header));
                self.builder.set_insert_point(frame.exit);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Function, TranslateError> {
        self.builder.terminate(Term::Return);
        // Report the earliest bracket still open, not the innermost
        if let Some(frame) = self.stack.first() {
            return Err(TranslateError::UnmatchedOpen { span: frame.open });
        }
        self.builder.finish()
    }
}

/// Translate a whole program into a verified-shape module. Characters other
/// than the eight commands are comments.
pub fn translate(source: &str) -> Result<Module, TranslateError> {
    let mut translator = Translator::new();
    for command in CommandStream::new(source) {
        translator.command(command)?;
    }
    Ok(Module::new(translator.finish()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program_is_one_returning_block() {
        let module = translate("").unwrap();
        assert_eq!(module.function.len(), 1);
        assert_eq!(module.function[BlockId(0)].insts, vec![]);
        assert_eq!(module.function[BlockId(0)].term, Term::Return);
    }

    #[test]
    fn test_straight_line_commands() {
        let module = translate("+-><.,").unwrap();
        assert_eq!(module.function.len(), 1);
        assert_eq!(
            module.function[BlockId(0)].insts,
            vec![
                Inst::AddCell(1),
                Inst::AddCell(-1),
                Inst::MovePointer(1),
                Inst::MovePointer(-1),
                Inst::Output,
                Inst::Input,
            ]
        );
    }

    #[test]
    fn test_loop_lowering_shape() {
        // [-] lowers to entry → header → {body, exit}
        let module = translate("[-]").unwrap();
        let f = &module.function;
        assert_eq!(f.len(), 4);
        assert_eq!(f[BlockId(0)].term, Term::Jump(BlockId(1)));
        assert_eq!(
            f[BlockId(1)].term,
            Term::BranchIfZero {
                zero: BlockId(3),
                nonzero: BlockId(2),
            }
        );
        assert_eq!(f[BlockId(2)].insts, vec![Inst::AddCell(-1)]);
        assert_eq!(f[BlockId(2)].term, Term::Jump(BlockId(1)));
        assert_eq!(f[BlockId(3)].term, Term::Return);
    }

    #[test]
    fn test_nested_loops() {
        let module = translate("[[]]").unwrap();
        let f = &module.function;
        assert_eq!(f.len(), 7);
        // Outer loop: header bb1, body bb2, exit bb3
        assert_eq!(f[BlockId(0)].term, Term::Jump(BlockId(1)));
        assert_eq!(
            f[BlockId(1)].term,
            Term::BranchIfZero {
                zero: BlockId(3),
                nonzero: BlockId(2),
            }
        );
        // Inner loop: header bb4, body bb5, exit bb6
        assert_eq!(f[BlockId(2)].term, Term::Jump(BlockId(4)));
        assert_eq!(
            f[BlockId(4)].term,
            Term::BranchIfZero {
                zero: BlockId(6),
                nonzero: BlockId(5),
            }
        );
        assert_eq!(f[BlockId(5)].term, Term::Jump(BlockId(4)));
        // Inner exit closes the outer loop; outer exit returns
        assert_eq!(f[BlockId(6)].term, Term::Jump(BlockId(1)));
        assert_eq!(f[BlockId(3)].term, Term::Return);
    }

    #[test]
    fn test_unmatched_close_position() {
        assert_eq!(
            translate("]").unwrap_err(),
            TranslateError::UnmatchedClose { span: Span::at(0) }
        );
        assert_eq!(
            translate("+il]").unwrap_err(),
            TranslateError::UnmatchedClose { span: Span::at(3) }
        );
    }

    #[test]
    fn test_unmatched_open_reports_earliest() {
        assert_eq!(
            translate("[").unwrap_err(),
            TranslateError::UnmatchedOpen { span: Span::at(0) }
        );
        // Both brackets are open; the first one is reported
        assert_eq!(
            translate("+[+[").unwrap_err(),
            TranslateError::UnmatchedOpen { span: Span::at(1) }
        );
    }

    #[test]
    fn test_balanced_brackets_succeed() {
        for source in ["", "[]", "[[]]", "[][]", "+[-[+]-]+", "[.,][.,]"] {
            assert!(translate(source).is_ok(), "{:?} should translate", source);
        }
    }

    #[test]
    fn test_error_display() {
        let err = TranslateError::UnmatchedOpen { span: Span::at(7) };
        assert_eq!(err.to_string(), "unmatched `[` at byte 7");
        let err = TranslateError::MalformedCfg {
            detail: "bb2 was allocated but never terminated".to_string(),
        };
        assert!(err.to_string().contains("bb2"));
    }
}
