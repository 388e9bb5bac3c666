//! Runtime byte-I/O contracts and the reference executor.
//!
//! The translator only ever emits instructions that *reference* input and
//! output; it never performs I/O itself. Whatever runs the final IR supplies
//! a [`ByteSink`] and a [`ByteSource`]. The [`Executor`] here is the in-repo
//! implementation of that contract: a direct CFG walk over a 30,000-cell
//! tape, used by the `run` command and by the behavioral-preservation tests.

use std::io::Write;

use crate::ir::{Inst, Module, Term, TAPE_CELLS};

/// Consumer of program output, one byte at a time.
pub trait ByteSink {
    fn write_byte(&mut self, byte: u8);
}

/// Producer of program input. `None` means end of input; the executor
/// zero-fills the cell in that case.
pub trait ByteSource {
    fn read_byte(&mut self) -> Option<u8>;
}

impl ByteSink for Vec<u8> {
    fn write_byte(&mut self, byte: u8) {
        self.push(byte);
    }
}

/// Forwards each byte to a [`Write`] target and flushes immediately, so an
/// interactive program's output appears before its next read blocks.
pub struct WriteSink<W: Write>(pub W);

impl<W: Write> ByteSink for WriteSink<W> {
    fn write_byte(&mut self, byte: u8) {
        // The trait is infallible; a sink that stops accepting bytes loses
        // the rest of the stream rather than aborting the program.
        let _ = self.0.write_all(&[byte]);
        let _ = self.0.flush();
    }
}

impl<I: Iterator<Item = u8>> ByteSource for I {
    fn read_byte(&mut self) -> Option<u8> {
        self.next()
    }
}

/// What a run did and how it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Instructions and terminators executed.
    pub steps: u64,
    /// False when the step limit cut the run short.
    pub completed: bool,
}

/// Reference interpreter for the block IR. Every run starts from the
/// initial state of the data model: a zeroed tape and the pointer at cell 0.
/// Cell arithmetic wraps modulo 256 and pointer movement wraps modulo the
/// tape length. An optional step limit bounds runs of programs that may not
/// halt.
pub struct Executor {
    step_limit: Option<u64>,
}

impl Executor {
    pub fn new() -> Self {
        Self { step_limit: None }
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn run(
        &self,
        module: &Module,
        input: &mut impl ByteSource,
        output: &mut impl ByteSink,
    ) -> ExecutionResult {
        let function = &module.function;
        let mut tape = vec![0u8; TAPE_CELLS];
        let mut ptr: usize = 0;
        let mut steps: u64 = 0;
        let mut block = function.entry();

        loop {
            for &inst in &function[block].insts {
                if self.out_of_budget(steps) {
                    return ExecutionResult {
                        steps,
                        completed: false,
                    };
                }
                steps += 1;
                match inst {
                    Inst::AddCell(delta) => {
                        tape[ptr] = tape[ptr].wrapping_add(delta as u8);
                    }
                    Inst::MovePointer(delta) => {
                        let delta = delta.rem_euclid(TAPE_CELLS as i32) as usize;
                        ptr = (ptr + delta) % TAPE_CELLS;
                    }
                    Inst::Output => output.write_byte(tape[ptr]),
                    Inst::Input => tape[ptr] = input.read_byte().unwrap_or(0),
                }
            }
            if self.out_of_budget(steps) {
                return ExecutionResult {
                    steps,
                    completed: false,
                };
            }
            steps += 1;
            match function[block].term {
                Term::BranchIfZero { zero, nonzero } => {
                    block = if tape[ptr] == 0 { zero } else { nonzero };
                }
                Term::Jump(target) => block = target,
                Term::Return => {
                    return ExecutionResult {
                        steps,
                        completed: true,
                    }
                }
            }
        }
    }

    fn out_of_budget(&self, steps: u64) -> bool {
        self.step_limit.is_some_and(|limit| steps >= limit)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a module over a fixed input slice and collect its output.
pub fn run_collect(module: &Module, input: &[u8]) -> (Vec<u8>, ExecutionResult) {
    let mut source = input.iter().copied();
    let mut output = Vec::new();
    let result = Executor::new().run(module, &mut source, &mut output);
    (output, result)
}
