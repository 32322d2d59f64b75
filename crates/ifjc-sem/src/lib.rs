//! ifjc-sem - Semantic analysis for IFJ25.
//!
//! Two passes over the AST. Pass 1 registers every top-level definition in
//! the global scope under its overload-encoded key, creates and seeds the
//! definition scopes, retags `main`, and infers getter return types. Pass 2
//! walks every statement: it resolves identifiers (attaching their
//! declaration scopes for the emitter), infers and checks types, rewrites
//! setter assignments and getter references, and collects each definition's
//! local variables for frame allocation.

pub mod analysis;
mod edge_cases;
pub mod infer;
pub mod scope;
pub mod symbol;

pub use analysis::{Analysis, SemanticAnalyzer};
pub use scope::{Scope, ScopeTree};
pub use symbol::{
    builtins, func_key, getter_key, setter_key, FuncSymbol, GetterSymbol, SetterSymbol, Symbol,
    VarSymbol,
};
