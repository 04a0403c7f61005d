//! Scope-chain symbol table with transitive free-variable capture.
//!
//! Resolving a name that lives in an enclosing function's locals promotes it
//! to a `Free` symbol in every scope between its definition and its use,
//! not just the innermost one — a closure three scopes deep that reaches
//! into its grandparent's locals needs each intermediate closure to also
//! capture and re-expose that value, since the VM can only address a
//! closure's *own* free-variable slots with `OpGetFree`.
//! This is the one place this repo deliberately does not follow
//! `original_source/`'s symbol table as found on disk, which only carries
//! `Global`/`Local`/`Builtin` scopes with no promotion step at all — see
//! DESIGN.md.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    Free,
    /// The self-reference of a named function literal, usable only from
    /// directly inside that literal's own body. Resolved to
    /// `OpCurrentClosure` rather than a load from any frame slot.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    num_definitions: usize,
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            store: HashMap::new(),
            num_definitions: 0,
            free_symbols: Vec::new(),
        }
    }

    /// Releases the enclosing table this one was built on top of, e.g. when
    /// leaving a function scope during compilation.
    pub fn into_outer(self) -> Option<SymbolTable> {
        self.outer.map(|b| *b)
    }

    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Binds `name` to the enclosing `Function` literal itself, so the body
    /// can refer to itself by name for direct recursion.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(original.name, symbol.clone());
        symbol
    }

    /// Looks a name up, walking outward through enclosing scopes. A name
    /// found in an enclosing scope other than `Global`/`Builtin` is
    /// promoted to `Free` in every scope between its home and here.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }
        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        if matches!(symbol.scope, SymbolScope::Global | SymbolScope::Builtin) {
            return Some(symbol);
        }
        Some(self.define_free(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_global() {
        let mut table = SymbolTable::new();
        table.define("a");
        table.define("b");
        let a = table.resolve("a").unwrap();
        assert_eq!(a.scope, SymbolScope::Global);
        assert_eq!(a.index, 0);
    }

    #[test]
    fn resolve_local_shadows_global() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut local = SymbolTable::new_enclosed(global);
        local.define("a");
        let resolved = local.resolve("a").unwrap();
        assert_eq!(resolved.scope, SymbolScope::Local);
    }

    #[test]
    fn resolve_free_promotes_through_nested_scopes() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut first = SymbolTable::new_enclosed(global);
        first.define("b");
        let mut second = SymbolTable::new_enclosed(first);
        second.define("c");

        let a = second.resolve("a").unwrap();
        assert_eq!(a.scope, SymbolScope::Global);
        let b = second.resolve("b").unwrap();
        assert_eq!(b.scope, SymbolScope::Free);
        assert_eq!(b.index, 0);
        let c = second.resolve("c").unwrap();
        assert_eq!(c.scope, SymbolScope::Local);
        assert_eq!(second.free_symbols.len(), 1);
        assert_eq!(second.free_symbols[0].name, "b");
    }

    #[test]
    fn resolve_builtin_is_not_promoted() {
        let mut global = SymbolTable::new();
        global.define_builtin(0, "len");
        let mut local = SymbolTable::new_enclosed(global);
        let resolved = local.resolve("len").unwrap();
        assert_eq!(resolved.scope, SymbolScope::Builtin);
        assert!(local.free_symbols.is_empty());
    }

    #[test]
    fn resolve_function_self_reference() {
        let mut table = SymbolTable::new();
        table.define_function_name("fib");
        let resolved = table.resolve("fib").unwrap();
        assert_eq!(resolved.scope, SymbolScope::Function);
    }
}
