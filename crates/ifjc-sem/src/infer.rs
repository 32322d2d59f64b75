//! Expression type inference.
//!
//! Inference is where most of the dynamic-typing machinery lives: plain
//! identifiers resolve through the scope chain (rewriting themselves into
//! getter calls when they name a getter, lazily declaring `__` globals),
//! and binary operators follow the fixed compatibility table. An `Undef`
//! operand makes the whole expression `Undef`, deferring the check to the
//! generated code's runtime type tests.

use ifjc_par::expr::{BinOp, Expr, TypeTag};
use ifjc_util::{CompileError, DataType, Result, ScopeId};

use crate::analysis::SemanticAnalyzer;
use crate::symbol::{getter_key, Symbol, VarSymbol};

impl SemanticAnalyzer {
    /// Infers the type of `expr`, resolving and annotating identifiers on
    /// the way and rewriting getter references in place.
    pub(crate) fn infer_expr(&mut self, expr: &mut Expr, scope: ScopeId) -> Result<DataType> {
        match expr {
            Expr::Num(_) => Ok(DataType::Num),
            Expr::Str(_) => Ok(DataType::String),
            Expr::Null => Ok(DataType::Null),
            // A bare type name carries no value type of its own.
            Expr::TypeLit(_) => Ok(DataType::Undef),
            Expr::Ident { .. } => self.infer_ident(expr, scope),
            Expr::GetterCall { name } => {
                let key = getter_key(name);
                match self.scopes.lookup(scope, &key) {
                    Some((_, Symbol::Getter(g))) => Ok(g.return_type),
                    Some(_) => Err(CompileError::Semantic(format!("'{name}' is not a getter"))),
                    None => Err(CompileError::Undefined(format!("getter '{name}'"))),
                }
            }
            Expr::Binary { .. } => self.infer_binary(expr, scope),
        }
    }

    /// Resolves an identifier: variable first, then getter (with the node
    /// rewritten to a [`Expr::GetterCall`]), then lazy global declaration
    /// for `__` names.
    fn infer_ident(&mut self, expr: &mut Expr, scope: ScopeId) -> Result<DataType> {
        let name = match expr {
            Expr::Ident { name, .. } => name.clone(),
            _ => return Err(CompileError::Internal("infer_ident on a non-identifier".into())),
        };

        if let Some((_, Symbol::Var(v))) = self.scopes.lookup(scope, &name) {
            let (var_scope, ty, initialized) = (v.scope, v.ty, v.initialized);
            if !initialized {
                return Err(CompileError::Semantic(format!(
                    "variable '{name}' used before initialization"
                )));
            }
            if let Expr::Ident { scope: s, .. } = expr {
                *s = Some(var_scope);
            }
            return Ok(ty);
        }

        if let Some((_, Symbol::Getter(g))) = self.scopes.lookup(scope, &getter_key(&name)) {
            let return_type = g.return_type;
            *expr = Expr::GetterCall { name };
            return Ok(return_type);
        }

        if name.starts_with("__") {
            // First mention declares the global; it is still uninitialized,
            // so reading it here is an error all the same.
            let global = self.global;
            self.scopes.insert(
                global,
                name.clone(),
                Symbol::Var(VarSymbol {
                    ty: DataType::Undef,
                    defined: true,
                    initialized: false,
                    scope: global,
                }),
            );
            return Err(CompileError::Semantic(format!(
                "variable '{name}' used before initialization"
            )));
        }

        Err(CompileError::Undefined(format!("variable '{name}'")))
    }

    fn infer_binary(&mut self, expr: &mut Expr, scope: ScopeId) -> Result<DataType> {
        let Expr::Binary { op, left, right } = expr else {
            return Err(CompileError::Internal("infer_binary on a non-binary".into()));
        };
        let op = *op;

        // `is` never evaluates its right operand as a value; it must be a
        // type literal and the expression takes the matched type.
        if op == BinOp::Is {
            let tag = match right.as_ref() {
                Expr::TypeLit(tag) => *tag,
                _ => {
                    return Err(CompileError::Semantic(
                        "right operand of 'is' must be a type name".into(),
                    ));
                }
            };
            self.infer_expr(left, scope)?;
            return Ok(match tag {
                TypeTag::Num => DataType::Num,
                TypeTag::String => DataType::String,
                TypeTag::Null => DataType::Null,
            });
        }

        let lt = self.infer_expr(left, scope)?;
        let rt = self.infer_expr(right, scope)?;
        if lt == DataType::Undef || rt == DataType::Undef {
            return Ok(DataType::Undef);
        }

        let incompatible = || {
            CompileError::TypeCompat(format!("operator {op:?} cannot combine {lt} and {rt}"))
        };

        match op {
            BinOp::Eq | BinOp::NotEq => Ok(DataType::Num),
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
                if lt == DataType::Num && rt == DataType::Num {
                    Ok(DataType::Num)
                } else {
                    Err(incompatible())
                }
            }
            BinOp::Add => match (lt, rt) {
                (DataType::Num, DataType::Num) => Ok(DataType::Num),
                (DataType::String, DataType::String) => Ok(DataType::String),
                _ => Err(incompatible()),
            },
            BinOp::Sub | BinOp::Div => {
                if lt == DataType::Num && rt == DataType::Num {
                    Ok(DataType::Num)
                } else {
                    Err(incompatible())
                }
            }
            BinOp::Mul => match (lt, rt) {
                (DataType::Num, DataType::Num) => Ok(DataType::Num),
                // String repetition.
                (DataType::String, DataType::Num) => Ok(DataType::String),
                _ => Err(incompatible()),
            },
            BinOp::Is => Err(CompileError::Internal("'is' handled above".into())),
        }
    }
}
