//! monkeyc - Monkey language front end and bytecode compiler CLI.
//!
//! Command-line interface shaped like `seqc`'s binary: one `clap::Parser`
//! with a subcommand per mode (`run`, `eval`, `build`, `disasm`) rather than
//! a flag-driven single command.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser as ClapParser, Subcommand};

use monkey_vm::Vm;
use monkeyc::compiler::Compiler;
use monkeyc::evaluator::eval_program;
use monkeyc::parser::parse;

#[derive(ClapParser)]
#[command(name = "monkeyc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Monkey language compiler and bytecode inspector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Monkey source file and run it on the stack VM
    Run {
        /// Input .monkey source file
        input: PathBuf,
    },

    /// Run a Monkey source file on the tree-walking evaluator
    Eval {
        /// Input .monkey source file
        input: PathBuf,
    },

    /// Compile a Monkey source file without running it, reporting size
    Build {
        /// Input .monkey source file
        input: PathBuf,

        /// Write the raw instruction bytes to this path instead of just
        /// reporting their size
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a Monkey source file and print its disassembled bytecode
    Disasm {
        /// Input .monkey source file
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { input } => run(&input),
        Commands::Eval { input } => eval(&input),
        Commands::Build { input, output } => build(&input, output.as_deref()),
        Commands::Disasm { input } => disasm(&input),
    };

    if let Err(message) = result {
        eprintln!("{message}");
        process::exit(1);
    }
}

fn read_source(path: &std::path::Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("could not read {}: {e}", path.display()))
}

fn run(input: &std::path::Path) -> Result<(), String> {
    let source = read_source(input)?;
    let program = parse(&source).map_err(|e| e.to_string())?;
    let mut compiler = Compiler::new();
    compiler
        .compile_program(&program)
        .map_err(|e| format!("compile error: {e}"))?;
    let mut vm = Vm::new(compiler.bytecode());
    vm.run().map_err(|e| format!("runtime error: {e}"))?;
    println!("{}", vm.last_popped());
    Ok(())
}

fn eval(input: &std::path::Path) -> Result<(), String> {
    let source = read_source(input)?;
    let program = parse(&source).map_err(|e| e.to_string())?;
    let env = monkey_core::environment::Environment::new();
    let result = eval_program(&program, &env);
    println!("{result}");
    Ok(())
}

fn build(input: &std::path::Path, output: Option<&std::path::Path>) -> Result<(), String> {
    let source = read_source(input)?;
    let program = parse(&source).map_err(|e| e.to_string())?;
    let mut compiler = Compiler::new();
    compiler
        .compile_program(&program)
        .map_err(|e| format!("compile error: {e}"))?;
    let bytecode = compiler.bytecode();

    match output {
        Some(path) => {
            fs::write(path, &bytecode.instructions.0)
                .map_err(|e| format!("could not write {}: {e}", path.display()))?;
            println!(
                "wrote {} bytes, {} constants to {}",
                bytecode.instructions.len(),
                bytecode.constants.len(),
                path.display()
            );
        }
        None => {
            println!(
                "compiled {} bytes of bytecode, {} constants",
                bytecode.instructions.len(),
                bytecode.constants.len()
            );
        }
    }
    Ok(())
}

fn disasm(input: &std::path::Path) -> Result<(), String> {
    let source = read_source(input)?;
    let program = parse(&source).map_err(|e| e.to_string())?;
    let mut compiler = Compiler::new();
    compiler
        .compile_program(&program)
        .map_err(|e| format!("compile error: {e}"))?;
    let bytecode = compiler.bytecode();
    print!("{}", bytecode.instructions);
    Ok(())
}
