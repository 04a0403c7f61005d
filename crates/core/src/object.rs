//! Runtime value representation shared by the evaluator and the VM.
//!
//! `Object` is a tagged-variant sum type rather than a `dyn Trait` object:
//! both execution engines need exhaustive, panic-free matching over every
//! value kind, and a trait-object hierarchy would need downcasting to get
//! back the concrete payload (spec Design Notes).

use std::fmt;
use std::rc::Rc;

use crate::ast::{BlockStatement, Identifier};
use crate::code::Instructions;
use crate::environment::Environment;

pub type BuiltinFn = fn(&[Object]) -> Object;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Array(Rc<Vec<Object>>),
    Null,
    /// Wraps the result of a `return` statement so block evaluation can
    /// short-circuit before the wrapper is stripped at the call boundary.
    ReturnValue(Rc<Object>),
    /// An in-band error value. Propagates through the tree-walking evaluator
    /// like `ReturnValue`, short-circuiting further evaluation.
    Error(String),
    Function(Rc<FunctionObject>),
    Builtin(BuiltinFn),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
}

/// A function value on the tree-walking evaluator's path: body plus the
/// environment active at the point of definition (its lexical closure).
#[derive(Debug)]
pub struct FunctionObject {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Environment,
}

impl PartialEq for FunctionObject {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// A function value on the compiled path: instructions plus the frame shape
/// the VM needs to set up a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A `CompiledFunction` plus the values of its free variables, captured by
/// value at the moment `OpClosure` executes (spec Design Notes: closures
/// capture by value, not by reference, on the VM path).
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Object>,
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Null => "NULL",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::CompiledFunction(_) => "COMPILED_FUNCTION",
            Object::Closure(_) => "CLOSURE",
        }
    }

    /// True for every value except `Null` and `Boolean(false)`, the only
    /// two falsy values in conditionals.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(v) => write!(f, "{v}"),
            Object::Boolean(b) => write!(f, "{b}"),
            Object::String(s) => write!(f, "{s}"),
            Object::Array(elems) => {
                let rendered: Vec<String> = elems.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Object::Null => write!(f, "null"),
            Object::ReturnValue(v) => write!(f, "{v}"),
            Object::Error(msg) => write!(f, "ERROR: {msg}"),
            Object::Function(func) => {
                let params: Vec<String> = func.parameters.iter().map(|p| p.name.clone()).collect();
                write!(f, "fn({}) {{\n{}\n}}", params.join(", "), func.body)
            }
            Object::Builtin(_) => write!(f, "builtin function"),
            Object::CompiledFunction(func) => write!(f, "CompiledFunction[{func:p}]"),
            Object::Closure(closure) => write!(f, "Closure[{closure:p}]"),
        }
    }
}
