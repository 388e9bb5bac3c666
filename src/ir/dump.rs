//! Canonical text form of a module: blocks in creation order, each printed
//! as a `bbN:` header followed by its instructions and terminator, two-space
//! indented, one per line. This is the `build` command's output, the golden
//! form the snapshot tests pin down, and the byte string the content hash
//! covers.

use std::fmt;

use crate::ir::{Function, Module};

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, block) in self.blocks.iter().enumerate() {
            writeln!(f, "bb{}:", index)?;
            for inst in &block.insts {
                writeln!(f, "  {}", inst)?;
            }
            writeln!(f, "  {}", block.term)?;
        }
        Ok(())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.function.fmt(f)
    }
}

/// Render the canonical dump as a string.
pub fn dump(module: &Module) -> String {
    module.to_string()
}
