//! Core IR: a function is a vector of basic blocks, each a run of
//! non-branching instructions closed by exactly one terminator. Blocks are
//! identified by their creation index, so the canonical dump's `bb0`, `bb1`,
//! … names are stable by construction. The instruction set is closed; every
//! consumer matches it exhaustively.

use std::fmt;
use std::ops::{Index, IndexMut};

pub mod builder;
pub mod dump;
pub mod optimize;
pub mod verify;

/// Number of cells on the data tape. Pointer arithmetic wraps modulo this.
pub const TAPE_CELLS: usize = 30_000;

// ─────────────────────────── Identifiers ───────────────────────────

/// Index of a block within its function, in creation order. The entry block
/// is always `bb0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

// ─────────────────────────── Instructions ───────────────────────────

/// Non-branching instruction. Cell arithmetic wraps modulo 256; pointer
/// movement wraps modulo [`TAPE_CELLS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inst {
    /// Add a signed delta to the cell under the pointer.
    AddCell(i8),
    /// Move the pointer by a signed delta.
    MovePointer(i32),
    /// Emit the current cell to the output sink.
    Output,
    /// Replace the current cell with one byte from the input source.
    Input,
}

/// Terminator. Every finalized block ends in exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Term {
    /// Two-way branch on the current cell: `zero` if it is 0, else `nonzero`.
    BranchIfZero { zero: BlockId, nonzero: BlockId },
    /// Unconditional jump.
    Jump(BlockId),
    /// Leave the function.
    Return,
}

impl Term {
    /// Branch targets, in dump order (zero target first).
    pub fn successors(&self) -> Vec<BlockId> {
        match *self {
            Term::BranchIfZero { zero, nonzero } => vec![zero, nonzero],
            Term::Jump(target) => vec![target],
            Term::Return => vec![],
        }
    }

    /// Rewrite every branch target in place.
    pub fn map_targets(&mut self, mut f: impl FnMut(BlockId) -> BlockId) {
        match self {
            Term::BranchIfZero { zero, nonzero } => {
                *zero = f(*zero);
                *nonzero = f(*nonzero);
            }
            Term::Jump(target) => *target = f(*target),
            Term::Return => {}
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Inst::AddCell(delta) => write!(f, "add_cell {:+}", delta),
            Inst::MovePointer(delta) => write!(f, "move_ptr {:+}", delta),
            Inst::Output => write!(f, "output"),
            Inst::Input => write!(f, "input"),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Term::BranchIfZero { zero, nonzero } => {
                write!(f, "branch_if_zero {} {}", zero, nonzero)
            }
            Term::Jump(target) => write!(f, "jump {}", target),
            Term::Return => write!(f, "return"),
        }
    }
}

// ─────────────────────────── Blocks & functions ───────────────────────────

/// A basic block: straight-line instructions closed by one terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub insts: Vec<Inst>,
    pub term: Term,
}

/// A function: blocks in creation order, entered at `bb0`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Function {
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Index<BlockId> for Function {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }
}

impl IndexMut<BlockId> for Function {
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }
}

/// A module owns exactly one function. The unit handed to the verifier, the
/// optimizer, the dumper, and the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    pub function: Function,
}

impl Module {
    pub fn new(function: Function) -> Self {
        Self { function }
    }
}
