//! Lexical environment for the tree-walking evaluator.
//!
//! A chain of scopes, each an owned map plus an optional link to its
//! enclosing scope. Cloning an `Environment` clones the handle, not the
//! bindings — this is what lets a `Function` object capture "its"
//! environment cheaply and share mutations with whatever scope defined it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;

struct EnvInner {
    store: HashMap<String, Object>,
    outer: Option<Environment>,
}

#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvInner>>);

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment")
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(EnvInner {
            store: HashMap::new(),
            outer: None,
        })))
    }

    /// A new scope nested inside `self`, e.g. entered for a function call.
    pub fn new_enclosed(outer: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(EnvInner {
            store: HashMap::new(),
            outer: Some(outer.clone()),
        })))
    }

    /// Looks up `name`, walking outward through enclosing scopes.
    pub fn get(&self, name: &str) -> Option<Object> {
        let inner = self.0.borrow();
        if let Some(val) = inner.store.get(name) {
            return Some(val.clone());
        }
        inner.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Binds `name` to `value` in this scope only, shadowing any outer
    /// binding of the same name.
    pub fn set(&self, name: impl Into<String>, value: Object) {
        self.0.borrow_mut().store.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scope_falls_back_to_outer() {
        let outer = Environment::new();
        outer.set("x", Object::Integer(1));
        let inner = Environment::new_enclosed(&outer);
        assert_eq!(inner.get("x"), Some(Object::Integer(1)));
        inner.set("x", Object::Integer(2));
        assert_eq!(inner.get("x"), Some(Object::Integer(2)));
        assert_eq!(outer.get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn unknown_identifier_is_none() {
        let env = Environment::new();
        assert_eq!(env.get("missing"), None);
    }
}
