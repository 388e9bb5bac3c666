//! Function builder: allocates blocks, threads an explicit insertion point,
//! and guarantees every finalized block carries exactly one terminator.
//! Misuse (appending without an open block, terminating twice, moving the
//! insertion point while a block is open) is a defect in the caller, not in
//! user input, and panics with a descriptive message.

use crate::ir::{Block, BlockId, Function, Inst, Term};
use crate::translate::TranslateError;

/// Assembles a [`Function`] block by block. Blocks are numbered in
/// allocation order; the first allocated block is the entry.
pub struct FunctionBuilder {
    // One slot per allocated block; filled when the block is terminated.
    blocks: Vec<Option<Block>>,
    current: Option<(BlockId, Vec<Inst>)>,
}

impl FunctionBuilder {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            current: None,
        }
    }

    /// Allocate a fresh, empty block. Does not change the insertion point.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(None);
        id
    }

    /// Direct subsequent appends at `block`.
    ///
    /// The previous block must have been terminated first, and `block` must
    /// not have been terminated already.
    pub fn set_insert_point(&mut self, block: BlockId) {
        if let Some((open, _)) = self.current {
            panic!("set_insert_point({}) while {} is still open", block, open);
        }
        if self.blocks[block.index()].is_some() {
            panic!("set_insert_point({}) but it is already terminated", block);
        }
        self.current = Some((block, Vec::new()));
    }

    /// Append a non-branching instruction to the open block.
    pub fn append(&mut self, inst: Inst) {
        match &mut self.current {
            Some((_, insts)) => insts.push(inst),
            None => panic!("append({}) with no open block", inst),
        }
    }

    /// Close the open block with `term`.
    pub fn terminate(&mut self, term: Term) {
        match self.current.take() {
            Some((id, insts)) => {
                debug_assert!(self.blocks[id.index()].is_none());
                self.blocks[id.index()] = Some(Block { insts, term });
            }
            None => panic!("terminate({}) with no open block", term),
        }
    }

    /// Finalize into a [`Function`]. Fails if any allocated block was never
    /// terminated.
    pub fn finish(self) -> Result<Function, TranslateError> {
        if let Some((open, _)) = self.current {
            return Err(TranslateError::MalformedCfg {
                detail: format!("block {} was left open at the end of translation", open),
            });
        }
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (index, slot) in self.blocks.into_iter().enumerate() {
            match slot {
                Some(block) => blocks.push(block),
                None => {
                    return Err(TranslateError::MalformedCfg {
                        detail: format!("bb{} was allocated but never terminated", index),
                    })
                }
            }
        }
        Ok(Function { blocks })
    }
}

impl Default for FunctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
