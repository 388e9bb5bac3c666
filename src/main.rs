use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process;

use bracken::{
    check, compile, compile_with_options, dump, ByteSource, CompileOptions, ContentHash, Executor,
    WriteSink,
};

#[derive(Parser)]
#[command(
    name = "bracken",
    version,
    about = "Tape-language compiler — translate, verify, optimize"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a program and print the canonical IR dump
    Build {
        /// Input source file
        input: Option<PathBuf>,
        /// Inline program text instead of a file
        #[arg(long, value_name = "PROGRAM", allow_hyphen_values = true)]
        source: Option<String>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip the optimization pipeline
        #[arg(long)]
        no_opt: bool,
    },
    /// Translate and verify without printing IR
    Check {
        /// Input source file
        input: Option<PathBuf>,
        /// Inline program text instead of a file
        #[arg(long, value_name = "PROGRAM", allow_hyphen_values = true)]
        source: Option<String>,
    },
    /// Compile and execute on the reference executor
    Run {
        /// Input source file
        input: Option<PathBuf>,
        /// Inline program text instead of a file
        #[arg(long, value_name = "PROGRAM", allow_hyphen_values = true)]
        source: Option<String>,
        /// Skip the optimization pipeline
        #[arg(long)]
        no_opt: bool,
        /// Stop after this many executed instructions
        #[arg(long, value_name = "N")]
        steps: Option<u64>,
    },
    /// Show the content hash of the compiled module (BLAKE3)
    Hash {
        /// Input source file
        input: Option<PathBuf>,
        /// Inline program text instead of a file
        #[arg(long, value_name = "PROGRAM", allow_hyphen_values = true)]
        source: Option<String>,
        /// Show the full 256-bit hash instead of the short form
        #[arg(long)]
        full: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            source,
            output,
            no_opt,
        } => cmd_build(input, source, output, no_opt),
        Command::Check { input, source } => cmd_check(input, source),
        Command::Run {
            input,
            source,
            no_opt,
            steps,
        } => cmd_run(input, source, no_opt, steps),
        Command::Hash {
            input,
            source,
            full,
        } => cmd_hash(input, source, full),
    }
}

// --- source loading ---

fn load_source(input: Option<PathBuf>, literal: Option<String>) -> (String, String) {
    match (input, literal) {
        (None, Some(text)) => (text, "<source>".to_string()),
        (Some(path), None) => {
            let source = match std::fs::read_to_string(&path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: cannot read '{}': {}", path.display(), e);
                    process::exit(1);
                }
            };
            (source, path.display().to_string())
        }
        (Some(_), Some(_)) => {
            eprintln!("error: pass a file or --source, not both");
            process::exit(1);
        }
        (None, None) => {
            eprintln!("error: no input; pass a file or --source");
            process::exit(1);
        }
    }
}

// --- bracken build ---

fn cmd_build(
    input: Option<PathBuf>,
    source: Option<String>,
    output: Option<PathBuf>,
    no_opt: bool,
) {
    let (source, filename) = load_source(input, source);
    let options = CompileOptions { optimize: !no_opt };
    let module = match compile_with_options(&source, &options) {
        Ok(module) => module,
        Err(e) => {
            e.to_diagnostic().render(&filename, &source);
            process::exit(1);
        }
    };

    let text = dump(&module);
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &text) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!("Compiled -> {}", path.display());
        }
        None => print!("{}", text),
    }
}

// --- bracken check ---

fn cmd_check(input: Option<PathBuf>, source: Option<String>) {
    let (source, filename) = load_source(input, source);
    match check(&source) {
        Ok(()) => eprintln!("OK: {}", filename),
        Err(e) => {
            e.to_diagnostic().render(&filename, &source);
            process::exit(1);
        }
    }
}

// --- bracken run ---

/// Reads standard input one byte at a time, so programs that never ask for
/// input never block on it.
struct StdinSource {
    stdin: std::io::Stdin,
}

impl ByteSource for StdinSource {
    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.stdin.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }
}

fn cmd_run(input: Option<PathBuf>, source: Option<String>, no_opt: bool, steps: Option<u64>) {
    let (source, filename) = load_source(input, source);
    let options = CompileOptions { optimize: !no_opt };
    let module = match compile_with_options(&source, &options) {
        Ok(module) => module,
        Err(e) => {
            e.to_diagnostic().render(&filename, &source);
            process::exit(1);
        }
    };

    let mut executor = Executor::new();
    if let Some(limit) = steps {
        executor = executor.with_step_limit(limit);
    }
    let mut stdin = StdinSource {
        stdin: std::io::stdin(),
    };
    // Stream output as it is produced; an interactive program must show its
    // prompt before it blocks on the next read.
    let mut stdout = WriteSink(std::io::stdout().lock());
    let result = executor.run(&module, &mut stdin, &mut stdout);

    if !result.completed {
        eprintln!(
            "error: stopped after {} steps without returning",
            result.steps
        );
        process::exit(1);
    }
}

// --- bracken hash ---

fn cmd_hash(input: Option<PathBuf>, source: Option<String>, full: bool) {
    let (source, filename) = load_source(input, source);
    let module = match compile(&source) {
        Ok(module) => module,
        Err(e) => {
            e.to_diagnostic().render(&filename, &source);
            process::exit(1);
        }
    };

    let hash = ContentHash::of_module(&module);
    if full {
        println!("{}", hash.to_hex());
    } else {
        println!("{}", hash);
    }
}
