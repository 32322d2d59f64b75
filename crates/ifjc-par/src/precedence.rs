//! Operator-precedence expression parsing.
//!
//! A bottom-up shift/reduce parser over the terminal alphabet
//! `{term, +, -, *, /, (, ), <, >, <=, >=, is, ==, !=, $}` driven by a
//! fixed 15x15 table. Three reductions exist:
//!
//! * `term -> E`
//! * `( E ) -> E`
//! * `E op E -> E`
//!
//! The table entry for the topmost stack terminal and the incoming terminal
//! decides whether to shift, reduce, shift-and-reduce (for `( E )`), stop,
//! or fail. Parsing runs until a hard boundary token (end-of-line, comma,
//! end-of-input, `}`) or the `$`/`)` stop entry, then residual reductions
//! drain the stack down to exactly `$ E`.

use std::io::Read;

use ifjc_lex::{Keyword, Token};
use ifjc_util::{CompileError, Result};

use crate::expr::{BinOp, Expr, TypeTag};
use crate::parser::Parser;
use crate::stack::{ParseStack, StackEntry};

/// Terminal symbols of the precedence grammar, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecSym {
    Term = 0,
    Plus,
    Minus,
    Mul,
    Div,
    LParen,
    RParen,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Is,
    Eq,
    NotEq,
    Dollar,
}

/// What the table tells the parser to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// `<` - push the incoming terminal and advance.
    Shift,
    /// `=` - push, advance, then immediately reduce (closes `( E )`).
    Match,
    /// `>` - apply one reduction to the stack.
    Reduce,
    /// Statement-level call arguments end here (`$` meets `)`).
    Stop,
    /// Blank entry - syntax error.
    Err,
}

// Single-letter aliases keep the table readable: S = shift, M = match,
// R = reduce, T = stop (terminate), E = error.
const S: Action = Action::Shift;
const M: Action = Action::Match;
const R: Action = Action::Reduce;
const T: Action = Action::Stop;
const E: Action = Action::Err;

/// The precedence table, kept verbatim from the language definition.
/// Rows are the topmost stack terminal, columns the incoming terminal.
#[rustfmt::skip]
const PREC_TABLE: [[Action; 15]; 15] = [
    //          term +  -  *  /  (  )  <  >  <= >= is == != $
    /* term */ [E,   R, R, R, R, E, R, R, R, R, R, R, R, R, R],
    /* +    */ [S,   R, R, S, S, S, R, R, R, R, R, R, R, R, R],
    /* -    */ [S,   R, R, S, S, S, R, R, R, R, R, R, R, R, R],
    /* *    */ [S,   R, R, R, R, S, R, R, R, R, R, R, R, R, R],
    /* /    */ [S,   R, R, R, R, S, R, R, R, R, R, R, R, R, R],
    /* (    */ [S,   S, S, S, S, S, M, E, E, E, E, E, E, E, E],
    /* )    */ [E,   R, R, R, R, E, R, R, R, R, R, R, R, R, R],
    /* <    */ [S,   S, S, S, S, S, R, R, R, R, R, R, R, R, R],
    /* >    */ [S,   S, S, S, S, S, R, R, R, R, R, R, R, R, R],
    /* <=   */ [S,   S, S, S, S, S, R, R, R, R, R, R, R, R, R],
    /* >=   */ [S,   S, S, S, S, S, R, R, R, R, R, R, R, R, R],
    /* is   */ [S,   S, S, S, S, S, R, R, R, R, R, R, R, R, R],
    /* ==   */ [S,   S, S, S, S, S, R, R, R, R, R, R, R, R, R],
    /* !=   */ [S,   S, S, S, S, S, R, R, R, R, R, R, R, R, R],
    /* $    */ [S,   S, S, S, S, S, T, S, S, S, S, S, S, S, E],
];

/// What the expression parser hands back to the statement parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprOutcome {
    /// A complete expression tree.
    Expr(Expr),
    /// An identifier immediately followed by `(`: a call. The `(` is the
    /// current token; the statement parser completes the argument list.
    Call(String),
}

/// Maps a lexer token to its precedence-grammar terminal. Boundary tokens
/// map to `$`; tokens that can never start or continue an expression map to
/// `term` and fail later inside the term reduction, which keeps the error
/// path uniform.
fn prec_sym_of(token: &Token) -> PrecSym {
    match token {
        Token::Plus => PrecSym::Plus,
        Token::Minus => PrecSym::Minus,
        Token::Star => PrecSym::Mul,
        Token::Slash => PrecSym::Div,
        Token::Lt => PrecSym::Lt,
        Token::Gt => PrecSym::Gt,
        Token::LtEq => PrecSym::LtEq,
        Token::GtEq => PrecSym::GtEq,
        Token::Eq => PrecSym::Eq,
        Token::NotEq => PrecSym::NotEq,
        Token::LParen => PrecSym::LParen,
        Token::RParen => PrecSym::RParen,
        Token::Keyword(Keyword::Is) => PrecSym::Is,
        Token::Eol | Token::Eof | Token::Comma | Token::RBrace => PrecSym::Dollar,
        _ => PrecSym::Term,
    }
}

/// True for the tokens that hard-terminate an expression.
fn is_boundary(token: &Token) -> bool {
    matches!(token, Token::Eol | Token::Eof | Token::Comma | Token::RBrace)
}

/// Converts a shifted terminal into its leaf expression.
fn term_to_expr(token: &Token) -> Option<Expr> {
    match token {
        Token::Ident(name) | Token::GlobalIdent(name) => Some(Expr::ident(name.clone())),
        Token::Number(value) => Some(Expr::Num(*value)),
        Token::Str(bytes) => Some(Expr::Str(bytes.clone())),
        Token::Keyword(Keyword::NullLit) => Some(Expr::Null),
        Token::Keyword(Keyword::NullType) => Some(Expr::TypeLit(TypeTag::Null)),
        Token::Keyword(Keyword::Num) => Some(Expr::TypeLit(TypeTag::Num)),
        Token::Keyword(Keyword::String) => Some(Expr::TypeLit(TypeTag::String)),
        _ => None,
    }
}

fn binop_of(sym: PrecSym) -> Option<BinOp> {
    match sym {
        PrecSym::Plus => Some(BinOp::Add),
        PrecSym::Minus => Some(BinOp::Sub),
        PrecSym::Mul => Some(BinOp::Mul),
        PrecSym::Div => Some(BinOp::Div),
        PrecSym::Lt => Some(BinOp::Lt),
        PrecSym::Gt => Some(BinOp::Gt),
        PrecSym::LtEq => Some(BinOp::LtEq),
        PrecSym::GtEq => Some(BinOp::GtEq),
        PrecSym::Eq => Some(BinOp::Eq),
        PrecSym::NotEq => Some(BinOp::NotEq),
        PrecSym::Is => Some(BinOp::Is),
        _ => None,
    }
}

/// Applies one reduction, chosen by the shape at the top of the stack.
fn reduce(stack: &mut ParseStack) -> Result<()> {
    let syntax = |msg: &str| CompileError::Syntax(format!("malformed expression: {msg}"));

    match stack.top() {
        None => Err(syntax("nothing to reduce")),

        // ( E ) -> E
        Some(StackEntry::Term {
            sym: PrecSym::RParen,
            ..
        }) => {
            stack.pop();
            let inner = match stack.pop() {
                Some(StackEntry::NonTerm(expr)) => expr,
                _ => return Err(syntax("empty parentheses")),
            };
            match stack.pop() {
                Some(StackEntry::Term {
                    sym: PrecSym::LParen,
                    ..
                }) => {}
                _ => return Err(syntax("unmatched ')'")),
            }
            stack.push_nonterm(inner);
            Ok(())
        }

        // term -> E
        Some(StackEntry::Term { sym, token }) => {
            if binop_of(*sym).is_some() {
                return Err(syntax("operator with a missing operand"));
            }
            let expr = term_to_expr(token)
                .ok_or_else(|| syntax(&format!("{token} cannot appear in an expression")))?;
            stack.pop();
            stack.push_nonterm(expr);
            Ok(())
        }

        // E op E -> E
        Some(StackEntry::NonTerm(_)) => {
            let right = match stack.pop() {
                Some(StackEntry::NonTerm(expr)) => expr,
                _ => return Err(syntax("missing right operand")),
            };
            let op = match stack.pop() {
                Some(StackEntry::Term { sym, .. }) => {
                    binop_of(sym).ok_or_else(|| syntax("expected a binary operator"))?
                }
                _ => return Err(syntax("expected a binary operator")),
            };
            let left = match stack.pop() {
                Some(StackEntry::NonTerm(expr)) => expr,
                _ => return Err(syntax("missing left operand")),
            };
            stack.push_nonterm(Expr::binary(op, left, right));
            Ok(())
        }
    }
}

impl<R: Read> Parser<R> {
    /// Parses one expression starting at the current token.
    ///
    /// Returns [`ExprOutcome::Call`] when the expression is an identifier
    /// immediately followed by `(`; the statement parser takes over from
    /// the parenthesis. Otherwise runs the shift/reduce loop to a boundary
    /// token and drains the stack to a single expression.
    pub(crate) fn parse_expression(&mut self) -> Result<ExprOutcome> {
        let mut stack = ParseStack::new();

        if let Token::Ident(name) = self.token.clone() {
            self.advance()?;
            if self.token == Token::LParen {
                return Ok(ExprOutcome::Call(name));
            }
            stack.push_term(PrecSym::Term, Token::Ident(name));
        }

        loop {
            if is_boundary(&self.token) {
                break;
            }
            let stack_sym = stack.topmost_terminal().unwrap_or(PrecSym::Dollar);
            let input_sym = prec_sym_of(&self.token);

            match PREC_TABLE[stack_sym as usize][input_sym as usize] {
                Action::Shift => {
                    stack.push_term(input_sym, self.token.clone());
                    self.advance()?;
                }
                Action::Match => {
                    stack.push_term(input_sym, self.token.clone());
                    self.advance()?;
                    reduce(&mut stack)?;
                }
                Action::Reduce => reduce(&mut stack)?,
                Action::Stop => break,
                Action::Err => {
                    return Err(CompileError::Syntax(format!(
                        "line {}: unexpected {} in expression",
                        self.line(),
                        self.token
                    )))
                }
            }
        }

        // Residual reductions: collapse the stack down to `$ E`.
        while !stack.is_reduced() {
            if stack.is_empty() {
                return Err(CompileError::Syntax(format!(
                    "line {}: expected an expression, found {}",
                    self.line(),
                    self.token
                )));
            }
            let stack_sym = stack.topmost_terminal().unwrap_or(PrecSym::Dollar);
            match PREC_TABLE[stack_sym as usize][PrecSym::Dollar as usize] {
                Action::Reduce => reduce(&mut stack)?,
                _ => {
                    return Err(CompileError::Syntax(format!(
                        "line {}: incomplete expression",
                        self.line()
                    )))
                }
            }
        }

        let expr = stack
            .into_expr()
            .ok_or_else(|| CompileError::Syntax("incomplete expression".into()))?;
        Ok(ExprOutcome::Expr(expr))
    }
}
