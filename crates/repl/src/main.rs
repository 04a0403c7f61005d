//! monkeyr - interactive prompt for the Monkey language.
//!
//! `repl/repl.go` and `repl/repl-compiler.go` read a `>>` prompt one line at
//! a time, keeping persistent state across lines rather than reparsing the
//! whole session's history on each new line; this follows the same shape.
//! The `--engine` flag picks which execution path a line runs on; both
//! paths are plain stdio, reporting with `println!`/`eprintln!` rather than
//! a TUI.

use std::io::{self, BufRead, Write};

use clap::{Parser as ClapParser, ValueEnum};

use monkey_core::environment::Environment;
use monkey_core::object::Object;
use monkey_vm::Vm;
use monkeyc::compiler::Compiler;
use monkeyc::evaluator::eval_program;
use monkeyc::parser::parse;
use monkeyc::symbol_table::SymbolTable;

const PROMPT: &str = ">> ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Compile each line and run it on the stack VM.
    Vm,
    /// Walk each line's AST directly with the tree-walking evaluator.
    Eval,
}

#[derive(ClapParser)]
#[command(name = "monkeyr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive prompt for the Monkey language", long_about = None)]
struct Cli {
    /// Execution engine to run each line on
    #[arg(long, value_enum, default_value_t = Engine::Vm)]
    engine: Engine,
}

fn main() {
    let cli = Cli::parse();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    match cli.engine {
        Engine::Vm => run_vm_repl(stdin.lock(), &mut stdout),
        Engine::Eval => run_eval_repl(stdin.lock(), &mut stdout),
    }
}

fn new_symbol_table_with_builtins() -> SymbolTable {
    let mut symbol_table = SymbolTable::new();
    for (index, (name, _)) in monkey_core::builtins::BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(index, name);
    }
    symbol_table
}

/// Exit code is always 0 on EOF.
fn run_vm_repl(mut input: impl BufRead, output: &mut impl Write) {
    let mut symbol_table = new_symbol_table_with_builtins();
    let mut constants = Vec::new();
    let mut globals = vec![Object::Null; monkey_vm::GLOBALS_SIZE];

    let mut line = String::new();
    loop {
        let _ = write!(output, "{PROMPT}");
        let _ = output.flush();
        line.clear();
        if input.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }

        let program = match parse(&line) {
            Ok(program) => program,
            Err(err) => {
                print_parse_errors(output, &err);
                continue;
            }
        };

        let mut compiler = Compiler::new_with_state(symbol_table, constants);
        if let Err(err) = compiler.compile_program(&program) {
            let _ = writeln!(output, "Woops! Compilation failed:\n {err}");
            (constants, symbol_table) = {
                let (bytecode, table) = compiler.into_bytecode_and_symbols();
                (bytecode.constants, table)
            };
            continue;
        }

        let (bytecode, table) = compiler.into_bytecode_and_symbols();
        constants = bytecode.constants.clone();
        symbol_table = table;

        let mut vm = Vm::new_with_globals_store(bytecode, globals);
        if let Err(err) = vm.run() {
            let _ = writeln!(output, "Woops! Executing bytecode failed:\n {err}");
            globals = vm.into_globals();
            continue;
        }
        let _ = writeln!(output, "{}", vm.last_popped());
        globals = vm.into_globals();
    }
}

fn run_eval_repl(mut input: impl BufRead, output: &mut impl Write) {
    let env = Environment::new();
    let mut line = String::new();
    loop {
        let _ = write!(output, "{PROMPT}");
        let _ = output.flush();
        line.clear();
        if input.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }

        let program = match parse(&line) {
            Ok(program) => program,
            Err(err) => {
                print_parse_errors(output, &err);
                continue;
            }
        };

        let result = eval_program(&program, &env);
        let _ = writeln!(output, "{result}");
    }
}

const MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

fn print_parse_errors(output: &mut impl Write, err: &monkeyc::ParseError) {
    let _ = write!(output, "{MONKEY_FACE}");
    let _ = writeln!(output, "Woops! We ran into some monkey business here!");
    let _ = writeln!(output, " parser errors:");
    for message in &err.0 {
        let _ = writeln!(output, "\t{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vm_repl_carries_global_bindings_across_lines() {
        let input = "let a = 5;\na + 1;\n";
        let mut output = Vec::new();
        run_vm_repl(input.as_bytes(), &mut output);
        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains('6'));
    }

    #[test]
    fn eval_repl_carries_bindings_across_lines() {
        let input = "let a = 5;\na + 1;\n";
        let mut output = Vec::new();
        run_eval_repl(input.as_bytes(), &mut output);
        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains('6'));
    }

    #[test]
    fn vm_repl_reports_parse_errors_without_stopping() {
        let input = "let x 5;\nlet y = 10;\ny;\n";
        let mut output = Vec::new();
        run_vm_repl(input.as_bytes(), &mut output);
        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("parser errors"));
        assert!(rendered.contains("10"));
    }
}
