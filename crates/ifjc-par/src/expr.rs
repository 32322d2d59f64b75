//! Expression AST node definitions.

use ifjc_util::ScopeId;

/// Binary operators of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Is,
}

/// The type names usable as the right operand of `is`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Num,
    String,
    Null,
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal; integers and decimals both live here as `f64`.
    Num(f64),
    /// String literal with decoded escape sequences.
    Str(Vec<u8>),
    /// The `null` literal.
    Null,
    /// A type name (`Num`, `String`, `Null`) used as an `is` operand.
    TypeLit(TypeTag),
    /// Variable reference; `scope` is resolved by the semantic analyzer.
    Ident {
        name: String,
        scope: Option<ScopeId>,
    },
    /// Call of a getter, materialized by the semantic analyzer when a plain
    /// identifier resolves to one.
    GetterCall { name: String },
    /// Binary operation.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Convenience constructor for binary nodes.
    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Convenience constructor for unresolved identifiers.
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident {
            name: name.into(),
            scope: None,
        }
    }
}
