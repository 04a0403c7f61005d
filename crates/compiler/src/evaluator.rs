//! Tree-walking evaluator: the alternate execution path that runs directly
//! against the AST instead of going through the compiler/VM.
//!
//! `evaluator/evaluator.go` dispatches on a `node.(type)` switch over an
//! `ast.Node` interface; here the same recursion is exhaustive `match` over
//! the `Statement`/`Expression` enums, so there is no `default: return nil`
//! catch-all to silently fall through.

use std::rc::Rc;

use monkey_core::ast::*;
use monkey_core::builtins::lookup_builtin_fn;
use monkey_core::environment::Environment;
use monkey_core::object::{FunctionObject, Object};

/// Evaluates a whole program in `env`, returning the value of its last
/// expression statement (or `Null` for an empty program).
pub fn eval_program(program: &Program, env: &Environment) -> Object {
    let mut result = Object::Null;
    for stmt in &program.statements {
        result = eval_statement(stmt, env);
        match result {
            Object::ReturnValue(value) => return (*value).clone(),
            Object::Error(_) => return result,
            _ => {}
        }
    }
    result
}

fn eval_statement(stmt: &Statement, env: &Environment) -> Object {
    match stmt {
        Statement::Expression(s) => eval_expression(&s.expression, env),
        Statement::Let(s) => {
            let value = eval_expression(&s.value, env);
            if value.is_error() {
                return value;
            }
            env.set(s.name.name.clone(), value.clone());
            value
        }
        Statement::Return(s) => match &s.value {
            Some(expr) => {
                let value = eval_expression(expr, env);
                if value.is_error() {
                    return value;
                }
                Object::ReturnValue(Rc::new(value))
            }
            None => Object::ReturnValue(Rc::new(Object::Null)),
        },
    }
}

/// Evaluates a `{ ... }` block. Unlike `eval_program`, a `ReturnValue` is
/// left *wrapped* here: an outer block (or the call boundary, in
/// `apply_function`) needs to see the wrapper to keep propagating it past
/// its own remaining statements.
fn eval_block(block: &BlockStatement, env: &Environment) -> Object {
    let mut result = Object::Null;
    for stmt in &block.statements {
        result = eval_statement(stmt, env);
        if matches!(result, Object::ReturnValue(_) | Object::Error(_)) {
            return result;
        }
    }
    result
}

fn eval_expression(expr: &Expression, env: &Environment) -> Object {
    match expr {
        Expression::IntegerLiteral(v) => Object::Integer(*v),
        Expression::StringLiteral(s) => Object::String(Rc::from(s.as_str())),
        Expression::Boolean(b) => Object::Boolean(*b),
        Expression::Identifier(ident) => eval_identifier(ident, env),
        Expression::Prefix(e) => {
            let operand = eval_expression(&e.operand, env);
            if operand.is_error() {
                return operand;
            }
            eval_prefix(&e.operator, operand)
        }
        Expression::Infix(e) => {
            let left = eval_expression(&e.left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(&e.right, env);
            if right.is_error() {
                return right;
            }
            eval_infix(&e.operator, left, right)
        }
        Expression::If(e) => eval_if(e, env),
        Expression::FunctionLiteral(e) => Object::Function(Rc::new(FunctionObject {
            parameters: e.parameters.clone(),
            body: e.body.clone(),
            env: env.clone(),
        })),
        Expression::Call(e) => eval_call(e, env),
        Expression::Array(e) => {
            let elements = eval_expressions(&e.elements, env);
            match elements {
                Ok(elems) => Object::Array(Rc::new(elems)),
                Err(err) => err,
            }
        }
        Expression::Index(e) => {
            let left = eval_expression(&e.left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(&e.index, env);
            if index.is_error() {
                return index;
            }
            eval_index(left, index)
        }
    }
}

fn eval_identifier(ident: &Identifier, env: &Environment) -> Object {
    if let Some(value) = env.get(&ident.name) {
        return value;
    }
    if let Some(builtin) = lookup_builtin_fn(&ident.name) {
        return Object::Builtin(builtin);
    }
    Object::Error(format!("identifier not found: {}", ident.name))
}

fn eval_prefix(operator: &str, operand: Object) -> Object {
    match operator {
        "!" => Object::Boolean(!operand.is_truthy()),
        "-" => match operand {
            Object::Integer(v) => Object::Integer(-v),
            other => Object::Error(format!("unknown operator: -{}", other.type_name())),
        },
        op => Object::Error(format!("unknown operator: {op}{}", operand.type_name())),
    }
}

fn eval_infix(operator: &str, left: Object, right: Object) -> Object {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, *l, *r),
        (Object::String(l), Object::String(r)) => eval_string_infix(operator, l, r),
        _ if operator == "==" => Object::Boolean(left == right),
        _ if operator == "!=" => Object::Boolean(left != right),
        _ if left.type_name() != right.type_name() => Object::Error(format!(
            "type mismatch: {} {operator} {}",
            left.type_name(),
            right.type_name()
        )),
        _ => Object::Error(format!(
            "unknown operator: {} {operator} {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

fn eval_integer_infix(operator: &str, l: i64, r: i64) -> Object {
    match operator {
        "+" => Object::Integer(l + r),
        "-" => Object::Integer(l - r),
        "*" => Object::Integer(l * r),
        "/" => {
            if r == 0 {
                Object::Error("division by zero".to_string())
            } else {
                Object::Integer(l / r)
            }
        }
        "<" => Object::Boolean(l < r),
        ">" => Object::Boolean(l > r),
        "==" => Object::Boolean(l == r),
        "!=" => Object::Boolean(l != r),
        op => Object::Error(format!("unknown operator: INTEGER {op} INTEGER")),
    }
}

fn eval_string_infix(operator: &str, l: &str, r: &str) -> Object {
    if operator != "+" {
        return Object::Error(format!("unknown operator: STRING {operator} STRING"));
    }
    Object::String(Rc::from(format!("{l}{r}")))
}

fn eval_if(e: &IfExpression, env: &Environment) -> Object {
    let condition = eval_expression(&e.condition, env);
    if condition.is_error() {
        return condition;
    }
    if condition.is_truthy() {
        eval_block(&e.consequence, env)
    } else if let Some(alt) = &e.alternative {
        eval_block(alt, env)
    } else {
        Object::Null
    }
}

fn eval_expressions(exprs: &[Expression], env: &Environment) -> Result<Vec<Object>, Object> {
    let mut result = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let value = eval_expression(expr, env);
        if value.is_error() {
            return Err(value);
        }
        result.push(value);
    }
    Ok(result)
}

fn eval_call(e: &CallExpression, env: &Environment) -> Object {
    let function = eval_expression(&e.function, env);
    if function.is_error() {
        return function;
    }
    let args = match eval_expressions(&e.arguments, env) {
        Ok(args) => args,
        Err(err) => return err,
    };
    apply_function(function, &args)
}

fn apply_function(function: Object, args: &[Object]) -> Object {
    match function {
        Object::Function(func) => {
            if args.len() != func.parameters.len() {
                return Object::Error(format!(
                    "wrong number of arguments: want={}, got={}",
                    func.parameters.len(),
                    args.len()
                ));
            }
            let call_env = Environment::new_enclosed(&func.env);
            for (param, arg) in func.parameters.iter().zip(args) {
                call_env.set(param.name.clone(), arg.clone());
            }
            let evaluated = eval_block(&func.body, &call_env);
            unwrap_return_value(evaluated)
        }
        Object::Builtin(builtin) => builtin(args),
        other => Object::Error(format!("not a function: {}", other.type_name())),
    }
}

/// Strips the `ReturnValue` wrapper at the call boundary so it never
/// escapes into a caller's own block evaluation.
fn unwrap_return_value(obj: Object) -> Object {
    match obj {
        Object::ReturnValue(value) => (*value).clone(),
        other => other,
    }
}

fn eval_index(left: Object, index: Object) -> Object {
    match (&left, &index) {
        (Object::Array(elems), Object::Integer(i)) => {
            if *i < 0 || *i as usize >= elems.len() {
                Object::Null
            } else {
                elems[*i as usize].clone()
            }
        }
        _ => Object::Error(format!("index operator not supported: {}", left.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval(input: &str) -> Object {
        let program = parse(input).unwrap();
        let env = Environment::new();
        eval_program(&program, &env)
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(eval("5 + 5 + 5 + 5 - 10"), Object::Integer(10));
        assert_eq!(eval("2 * 2 * 2 * 2 * 2"), Object::Integer(32));
        assert_eq!(eval("(5 + 10 * 2 + 15 / 3) * 2 + -10"), Object::Integer(50));
    }

    #[test]
    fn boolean_expressions() {
        assert_eq!(eval("1 < 2"), Object::Boolean(true));
        assert_eq!(eval("1 == 1"), Object::Boolean(true));
        assert_eq!(eval("(1 < 2) == true"), Object::Boolean(true));
    }

    #[test]
    fn bang_operator() {
        assert_eq!(eval("!true"), Object::Boolean(false));
        assert_eq!(eval("!!5"), Object::Boolean(true));
    }

    #[test]
    fn if_else_expressions() {
        assert_eq!(eval("if (true) { 10 }"), Object::Integer(10));
        assert_eq!(eval("if (false) { 10 }"), Object::Null);
        assert_eq!(eval("if (1 < 2) { 10 } else { 20 }"), Object::Integer(10));
    }

    #[test]
    fn return_statements() {
        assert_eq!(eval("return 10; 9;"), Object::Integer(10));
        assert_eq!(
            eval("if (10 > 1) { if (10 > 1) { return 10; } return 1; }"),
            Object::Integer(10)
        );
    }

    #[test]
    fn error_handling() {
        let cases = [
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { true + false; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
        ];
        for (input, expected) in cases {
            match eval(input) {
                Object::Error(msg) => assert_eq!(msg, expected, "input: {input}"),
                other => panic!("expected error for {input}, got {other:?}"),
            }
        }
    }

    #[test]
    fn let_statements() {
        assert_eq!(eval("let a = 5; a;"), Object::Integer(5));
        assert_eq!(eval("let a = 5 * 5; a;"), Object::Integer(25));
        assert_eq!(eval("let a = 5; let b = a; b;"), Object::Integer(5));
    }

    #[test]
    fn function_application() {
        assert_eq!(
            eval("let identity = fn(x) { x; }; identity(5);"),
            Object::Integer(5)
        );
        assert_eq!(
            eval("let add = fn(x, y) { x + y; }; add(5, 5);"),
            Object::Integer(10)
        );
        assert_eq!(
            eval("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));"),
            Object::Integer(20)
        );
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let input = "
            let newAdder = fn(x) {
                fn(y) { x + y };
            };
            let addTwo = newAdder(2);
            addTwo(3);
        ";
        assert_eq!(eval(input), Object::Integer(5));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            eval(r#"let greet = fn(name) { "Hello, " + name + "!" }; greet("World")"#),
            Object::String(Rc::from("Hello, World!"))
        );
    }

    #[test]
    fn array_literals_and_indexing() {
        assert_eq!(
            eval("let a = [1, 2 * 2, 3 + 3]; a[1];"),
            Object::Integer(4)
        );
        assert_eq!(eval("[1, 2, 3][3]"), Object::Null);
        assert_eq!(eval("[1, 2, 3][-1]"), Object::Null);
    }

    #[test]
    fn builtin_functions() {
        assert_eq!(eval(r#"len("")"#), Object::Integer(0));
        assert_eq!(eval(r#"len("four")"#), Object::Integer(4));
        assert_eq!(eval("len([1, 2, 3])"), Object::Integer(3));
        match eval("len(1)") {
            Object::Error(msg) => assert_eq!(msg, "argument to `len` not supported, got INTEGER"),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(
            eval("let a = [1, 2, 3]; push(a, 4)[3];"),
            Object::Integer(4)
        );
        assert_eq!(
            eval("let a = [1, 2, 3]; push(a, 4); a[0] + a[1] + a[2];"),
            Object::Integer(6)
        );
    }

    #[test]
    fn fibonacci_matches_vm_scenario_in_spec() {
        let input = "
            let fib = fn(n) {
                if (n < 2) { n } else { fib(n - 1) + fib(n - 2) }
            };
            fib(10);
        ";
        assert_eq!(eval(input), Object::Integer(55));
    }
}
