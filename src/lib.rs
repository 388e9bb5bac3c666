pub mod diagnostic;
pub mod hash;
pub mod ir;
pub mod runtime;
pub mod scan;
pub mod span;
pub mod translate;

// Re-exports: the surface the CLI and tests drive
pub use hash::ContentHash;
pub use ir::dump::dump;
pub use ir::optimize::optimize;
pub use ir::verify::verify;
pub use ir::{Block, BlockId, Function, Inst, Module, Term, TAPE_CELLS};
pub use runtime::{ByteSink, ByteSource, ExecutionResult, Executor, WriteSink};
pub use translate::{translate, TranslateError};

/// Options controlling compilation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Run the optimization pipeline over the verified CFG.
    pub optimize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Translate a source program, verify the CFG, and run the optimization
/// pipeline over it.
pub fn compile(source: &str) -> Result<Module, TranslateError> {
    compile_with_options(source, &CompileOptions::default())
}

/// Like [`compile`], but the caller picks what runs.
pub fn compile_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<Module, TranslateError> {
    let mut module = translate::translate(source)?;
    ir::verify::verify(&module)?;
    if options.optimize {
        ir::optimize::optimize(&mut module);
    }
    Ok(module)
}

/// Translate and verify without optimizing, reporting only success.
pub fn check(source: &str) -> Result<(), TranslateError> {
    let module = translate::translate(source)?;
    ir::verify::verify(&module)
}
