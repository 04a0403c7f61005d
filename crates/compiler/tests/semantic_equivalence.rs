//! End-to-end checks that the evaluator and the compiler/VM path agree on
//! every program both engines can run.

use monkey_core::environment::Environment;
use monkey_vm::Vm;
use monkeyc::compiler::Compiler;
use monkeyc::evaluator::eval_program;
use monkeyc::parser::parse;

fn eval_inspect(input: &str) -> String {
    let program = parse(input).unwrap();
    let env = Environment::new();
    eval_program(&program, &env).to_string()
}

fn vm_inspect(input: &str) -> String {
    let program = parse(input).unwrap();
    let mut compiler = Compiler::new();
    compiler.compile_program(&program).unwrap();
    let mut vm = Vm::new(compiler.bytecode());
    vm.run().unwrap();
    vm.last_popped().to_string()
}

fn assert_both_engines_agree(input: &str, expected: &str) {
    assert_eq!(eval_inspect(input), expected, "evaluator mismatch for {input}");
    assert_eq!(vm_inspect(input), expected, "vm mismatch for {input}");
}

#[test]
fn simple_let_bindings() {
    assert_both_engines_agree("let a = 5; let b = 10; a + b;", "15");
}

#[test]
fn function_call() {
    assert_both_engines_agree("let add = fn(x, y) { x + y; }; add(1, 2);", "3");
}

#[test]
fn closures_capture_the_outer_binding_at_creation_time() {
    assert_both_engines_agree(
        "let newAdder = fn(x){ fn(y){ x + y } }; let addTwo = newAdder(2); addTwo(3);",
        "5",
    );
}

#[test]
fn recursive_fibonacci() {
    assert_both_engines_agree(
        "let fib = fn(n){ if (n<2){ n } else { fib(n-1)+fib(n-2) } }; fib(10);",
        "55",
    );
}

#[test]
fn push_does_not_mutate_the_original_array() {
    assert_both_engines_agree("let a = [1,2,3]; push(a, 4)[3];", "4");
    assert_both_engines_agree("let a = [1,2,3]; push(a, 4); a[0]+a[1]+a[2];", "6");
}

#[test]
fn if_false_with_no_else_is_null() {
    assert_both_engines_agree("if (false) { 10 };", "null");
}

#[test]
fn array_index_out_of_bounds_is_null() {
    assert_both_engines_agree("[1, 2, 3][10];", "null");
}

#[test]
fn empty_program_is_null() {
    assert_both_engines_agree("", "null");
}

#[test]
fn string_concatenation_through_functions() {
    assert_both_engines_agree(
        r#"let makeGreeting = fn(name) { "Hello, " + name + "!" }; makeGreeting("Monkey");"#,
        "Hello, Monkey!",
    );
}

#[test]
fn deeply_nested_free_variable_capture() {
    // `c` is free three scopes deep from where it's used; the symbol table's
    // transitive promotion must thread it through every intermediate
    // closure for both engines to agree.
    let input = "
        let outer = fn() {
            let a = 1;
            fn() {
                let b = 2;
                fn() {
                    let c = 3;
                    a + b + c;
                };
            };
        };
        outer()()();
    ";
    assert_both_engines_agree(input, "6");
}

#[test]
fn precedence_canonical_form_matches_spec_example() {
    let program = parse("a * [1, 2, 3, 4][b * c] * d").unwrap();
    assert_eq!(
        program.to_string(),
        "((a * ([1, 2, 3, 4][(b * c)])) * d)"
    );
}
