//! Built-in functions shared by the evaluator and the VM.
//!
//! Kept as an order-stable table, not a `HashMap`: the VM's `OpGetBuiltin`
//! addresses a builtin by its position in this table, so the order here is
//! part of the bytecode contract and must never be reshuffled — only
//! appended to.

use std::rc::Rc;

use crate::object::{BuiltinFn, Object};

fn len(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity("len", 1, args.len());
    }
    match &args[0] {
        Object::String(s) => Object::Integer(s.chars().count() as i64),
        Object::Array(elems) => Object::Integer(elems.len() as i64),
        other => Object::Error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn first(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity("first", 1, args.len());
    }
    match &args[0] {
        Object::Array(elems) => elems.first().cloned().unwrap_or(Object::Null),
        other => Object::Error(format!(
            "argument to `first` must be ARRAY, got {}",
            other.type_name()
        )),
    }
}

fn last(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity("last", 1, args.len());
    }
    match &args[0] {
        Object::Array(elems) => elems.last().cloned().unwrap_or(Object::Null),
        other => Object::Error(format!(
            "argument to `last` must be ARRAY, got {}",
            other.type_name()
        )),
    }
}

fn push(args: &[Object]) -> Object {
    if args.len() != 2 {
        return wrong_arity("push", 2, args.len());
    }
    match &args[0] {
        Object::Array(elems) => {
            let mut new_elems = (**elems).clone();
            new_elems.push(args[1].clone());
            Object::Array(Rc::new(new_elems))
        }
        other => Object::Error(format!(
            "argument to `push` must be ARRAY, got {}",
            other.type_name()
        )),
    }
}

fn rest(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity("rest", 1, args.len());
    }
    match &args[0] {
        Object::Array(elems) => {
            if elems.is_empty() {
                Object::Null
            } else {
                Object::Array(Rc::new(elems[1..].to_vec()))
            }
        }
        other => Object::Error(format!(
            "argument to `rest` must be ARRAY, got {}",
            other.type_name()
        )),
    }
}

/// The only builtin with an observable side effect: prints each argument on
/// its own line and returns `Null`.
fn puts(args: &[Object]) -> Object {
    for arg in args {
        println!("{arg}");
    }
    Object::Null
}

fn wrong_arity(name: &str, want: usize, got: usize) -> Object {
    Object::Error(format!(
        "wrong number of arguments to `{name}`: want={want}, got={got}"
    ))
}

/// Name-to-function table, in the fixed order the bytecode format depends
/// on. Never reorder existing entries; only append new builtins at the end.
pub const BUILTINS: &[(&str, fn(&[Object]) -> Object)] = &[
    ("len", len),
    ("first", first),
    ("last", last),
    ("push", push),
    ("rest", rest),
    ("puts", puts),
];

pub fn lookup_builtin(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|(n, _)| *n == name)
}

pub fn builtin_by_index(index: usize) -> Option<(&'static str, fn(&[Object]) -> Object)> {
    BUILTINS.get(index).copied()
}

/// Looks up a builtin by name directly, for the evaluator path (which has no
/// symbol table and so never goes through `OpGetBuiltin`/`lookup_builtin`).
pub fn lookup_builtin_fn(name: &str) -> Option<BuiltinFn> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(values: Vec<i64>) -> Object {
        Object::Array(Rc::new(values.into_iter().map(Object::Integer).collect()))
    }

    #[test]
    fn len_counts_string_chars_and_array_elements() {
        assert_eq!(len(&[Object::String("café".into())]), Object::Integer(4));
        assert_eq!(len(&[arr(vec![1, 2, 3])]), Object::Integer(3));
    }

    #[test]
    fn push_returns_new_array_without_mutating_original() {
        let original = arr(vec![1, 2]);
        let Object::Array(original_elems) = original.clone() else {
            unreachable!()
        };
        let pushed = push(&[original, Object::Integer(3)]);
        assert_eq!(pushed, arr(vec![1, 2, 3]));
        assert_eq!(*original_elems, vec![Object::Integer(1), Object::Integer(2)]);
    }

    #[test]
    fn rest_of_empty_array_is_null() {
        assert_eq!(rest(&[arr(vec![])]), Object::Null);
    }

    #[test]
    fn builtin_order_is_len_first_last_push_rest_puts() {
        let names: Vec<&str> = BUILTINS.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["len", "first", "last", "push", "rest", "puts"]);
    }
}
