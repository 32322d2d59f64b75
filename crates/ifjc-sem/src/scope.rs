//! The scope tree.
//!
//! Scopes live in an arena addressed by [`ScopeId`]; each scope owns a
//! balanced ordered map from symbol key to symbol record plus a parent
//! reference (none for the global scope). Lookup walks the parent chain.
//! The ordered map gives two things the analyzer relies on: deterministic
//! sorted iteration (the emitter walks the global scope to declare
//! globals) and range scans for the `name$*` any-arity search.

use std::collections::BTreeMap;
use std::ops::Bound;

use ifjc_util::{IndexVec, ScopeId};

use crate::symbol::Symbol;

/// A single lexical scope.
#[derive(Debug)]
pub struct Scope {
    /// Symbols keyed by their encoded name, in sorted key order.
    pub symbols: BTreeMap<String, Symbol>,
    /// Enclosing scope; `None` for the global scope.
    pub parent: Option<ScopeId>,
}

/// Arena of all scopes created during analysis.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: IndexVec<ScopeId, Scope>,
}

impl ScopeTree {
    /// Creates a tree holding only the global scope and returns its id.
    pub fn new() -> (Self, ScopeId) {
        let mut tree = Self {
            scopes: IndexVec::new(),
        };
        let global = tree.scopes.push(Scope {
            symbols: BTreeMap::new(),
            parent: None,
        });
        (tree, global)
    }

    /// Creates a child scope of `parent`.
    pub fn new_child(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            symbols: BTreeMap::new(),
            parent: Some(parent),
        })
    }

    /// The scope record for `id`.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Inserts a symbol; rejects an already-occupied key.
    pub fn insert(&mut self, scope: ScopeId, key: impl Into<String>, symbol: Symbol) -> bool {
        let key = key.into();
        let table = &mut self.scopes[scope].symbols;
        if table.contains_key(&key) {
            return false;
        }
        table.insert(key, symbol);
        true
    }

    /// Looks a key up in `scope` only, without walking parents.
    pub fn lookup_local(&self, scope: ScopeId, key: &str) -> Option<&Symbol> {
        self.scopes[scope].symbols.get(key)
    }

    /// Looks a key up in `scope` and its ancestors; returns the owning
    /// scope along with the symbol.
    pub fn lookup(&self, scope: ScopeId, key: &str) -> Option<(ScopeId, &Symbol)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(symbol) = self.scopes[id].symbols.get(key) {
                return Some((id, symbol));
            }
            current = self.scopes[id].parent;
        }
        None
    }

    /// Mutable lookup through the parent chain.
    pub fn lookup_mut(&mut self, scope: ScopeId, key: &str) -> Option<&mut Symbol> {
        let owner = self.lookup(scope, key)?.0;
        self.scopes[owner].symbols.get_mut(key)
    }

    /// Whether any function overload `name$*` exists in `scope` or an
    /// ancestor. Distinguishes "wrong argument count" from "undefined".
    pub fn any_arity_exists(&self, scope: ScopeId, name: &str) -> bool {
        let prefix = format!("{name}$");
        let mut current = Some(scope);
        while let Some(id) = current {
            let range = self.scopes[id]
                .symbols
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));
            for (key, symbol) in range {
                if !key.starts_with(&prefix) {
                    break;
                }
                if matches!(symbol, Symbol::Func(_)) {
                    return true;
                }
            }
            current = self.scopes[id].parent;
        }
        false
    }

    /// Length of the scope chain from `scope` to the root, inclusive.
    /// The global scope has depth 1; the emitter suffixes local frame
    /// names with this number to disambiguate shadowed names.
    pub fn depth(&self, scope: ScopeId) -> u32 {
        let mut depth = 0;
        let mut current = Some(scope);
        while let Some(id) = current {
            depth += 1;
            current = self.scopes[id].parent;
        }
        depth
    }
}
