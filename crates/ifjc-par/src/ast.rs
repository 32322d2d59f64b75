//! Statement AST node definitions.
//!
//! The parser builds these nodes; the semantic analyzer annotates them in
//! place (scope references, inferred types, overload-encoded names) and
//! performs two node replacements: a `FuncDef` named `main` with no
//! parameters becomes a `Def::Main`, and an `Assign` whose target resolves
//! to a setter becomes a `Stmt::SetterCall`.

use ifjc_util::{DataType, ScopeId};

use crate::expr::Expr;

/// Root of a parsed compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub defs: Vec<Def>,
}

/// A top-level `static` definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Def {
    /// `main` with zero parameters, retagged from `Function` by the
    /// semantic analyzer.
    Main(FuncDef),
    Function(FuncDef),
    Getter(GetterDef),
    Setter(SetterDef),
}

/// Function definition (including `main`).
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    /// Function name; rewritten to the overload key `name$arity` by the
    /// semantic analyzer so the emitter can key labels directly.
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    /// Every variable declared anywhere in the body, collected by the
    /// analyzer so the emitter can issue frame allocations at entry.
    pub locals: Vec<LocalDecl>,
}

/// Getter definition: a body only, no parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GetterDef {
    pub name: String,
    pub body: Block,
    pub locals: Vec<LocalDecl>,
}

/// Setter definition: exactly one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SetterDef {
    pub name: String,
    pub param: Param,
    pub body: Block,
    pub locals: Vec<LocalDecl>,
}

/// A declared parameter. Source parameters carry no type annotation, so
/// `ty` starts as `Undef` and may be refined by the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: DataType,
    pub scope: Option<ScopeId>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: DataType::Undef,
            scope: None,
        }
    }
}

/// A variable declaration hoisted to its enclosing definition's entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    pub name: String,
    pub scope: ScopeId,
}

/// A brace-delimited statement list. The analyzer binds a scope to every
/// block: function bodies get the scope seeded with their parameters,
/// nested blocks get fresh child scopes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub scope: Option<ScopeId>,
}

/// The right-hand side of an assignment, a `return` value, or a condition:
/// either a plain expression or a (user or `Ifj`) call.
#[derive(Debug, Clone, PartialEq)]
pub enum Rhs {
    Expr(Expr),
    Call(FuncCall),
}

/// A function call. Built-in calls carry an `Ifj.` name prefix so their
/// overload keys match the preloaded built-in table.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    /// Call target; rewritten to the overload key `name$arity` by the
    /// semantic analyzer.
    pub name: String,
    pub args: Vec<Expr>,
    /// Result type, filled in from the callee's return type.
    pub result: DataType,
}

impl FuncCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
            result: DataType::Undef,
        }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var name` - declaration only; initialization happens via a
    /// following `Assign`.
    VarDecl {
        name: String,
        scope: Option<ScopeId>,
    },
    /// `name = rhs` where `name` is a variable (possibly a lazily-declared
    /// global).
    Assign {
        target: String,
        scope: Option<ScopeId>,
        rhs: Rhs,
    },
    /// `name = rhs` rewritten by the analyzer when `name` resolves to a
    /// setter.
    SetterCall { name: String, arg: Rhs },
    /// Statement-level call, evaluated for effect; the pushed result is
    /// discarded by the program epilogue.
    Call(FuncCall),
    If {
        cond: Rhs,
        then_block: Block,
        else_block: Block,
    },
    While {
        cond: Rhs,
        body: Block,
    },
    /// `return` with an optional value; a void return is typed `Null` by
    /// the analyzer.
    Return {
        value: Option<Rhs>,
        ty: DataType,
    },
    /// A nested brace block.
    Block(Block),
}
