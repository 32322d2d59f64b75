//! Recursive-descent statement parser.
//!
//! Grammar (informally):
//!
//! ```text
//! program      := prolog class-body
//! prolog       := 'import' "ifj25" 'for' 'Ifj' EOL
//! class-body   := 'class' 'Program' '{' EOL (def-fn)* '}'
//! def-fn       := 'static' IDENT ( getter | setter | function )
//! getter       := block
//! setter       := '=' '(' IDENT ')' block
//! function     := '(' params? ')' block
//! block        := '{' EOL stmt* '}'
//! stmt         := var-decl | assign-or-call | if | while | return | ifj-call | block
//! ```
//!
//! Every statement rule leaves the separating end-of-line to its caller;
//! expressions are delegated to the precedence parser in
//! [`crate::precedence`].

use std::io::Read;

use ifjc_lex::{Keyword, Lexer, Token};
use ifjc_util::{CompileError, Result};

use crate::ast::{Block, Def, FuncCall, FuncDef, GetterDef, Param, Program, Rhs, SetterDef, Stmt};
use crate::expr::Expr;
use crate::precedence::ExprOutcome;

/// The statement parser. Pulls tokens from the lexer one at a time and
/// keeps exactly one token of lookahead in `token`.
pub struct Parser<R> {
    lexer: Lexer<R>,
    pub(crate) token: Token,
}

impl<R: Read> Parser<R> {
    /// Creates a parser over the given lexer.
    pub fn new(lexer: Lexer<R>) -> Self {
        Self {
            lexer,
            token: Token::Eol,
        }
    }

    /// Parses a whole compilation unit.
    pub fn parse(mut self) -> Result<Program> {
        self.advance()?;
        self.skip_eols()?;
        self.parse_prolog()?;
        self.expect_eol()?;

        let defs = self.parse_class_body()?;

        self.skip_eols()?;
        if self.token != Token::Eof {
            return Err(self.unexpected("end of input"));
        }
        Ok(Program { defs })
    }

    pub(crate) fn line(&self) -> u32 {
        self.lexer.line()
    }

    pub(crate) fn advance(&mut self) -> Result<()> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    fn unexpected(&self, wanted: &str) -> CompileError {
        CompileError::Syntax(format!(
            "line {}: expected {}, found {}",
            self.line(),
            wanted,
            self.token
        ))
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.token != expected {
            return Err(self.unexpected(&expected.to_string()));
        }
        self.advance()
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.token != Token::Keyword(keyword) {
            return Err(self.unexpected(&format!("keyword '{keyword:?}'")));
        }
        self.advance()
    }

    fn expect_ident(&mut self) -> Result<String> {
        match std::mem::replace(&mut self.token, Token::Eol) {
            Token::Ident(name) => {
                self.advance()?;
                Ok(name)
            }
            other => {
                self.token = other;
                Err(self.unexpected("an identifier"))
            }
        }
    }

    /// Requires at least one end-of-line, then swallows any blank lines.
    fn expect_eol(&mut self) -> Result<()> {
        if self.token != Token::Eol {
            return Err(self.unexpected("end of line"));
        }
        self.skip_eols()
    }

    fn skip_eols(&mut self) -> Result<()> {
        while self.token == Token::Eol {
            self.advance()?;
        }
        Ok(())
    }

    /// `import "ifj25" for Ifj`
    fn parse_prolog(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Import)?;
        match &self.token {
            Token::Str(s) if s.as_slice() == b"ifj25" => self.advance()?,
            _ => return Err(self.unexpected("the string \"ifj25\"")),
        }
        self.expect_keyword(Keyword::For)?;
        self.expect_keyword(Keyword::Ifj)?;
        Ok(())
    }

    /// `class Program { EOL (def-fn)* }`
    fn parse_class_body(&mut self) -> Result<Vec<Def>> {
        self.expect_keyword(Keyword::Class)?;
        let class_name = self.expect_ident()?;
        if class_name != "Program" {
            return Err(CompileError::Syntax(format!(
                "line {}: the class must be named 'Program', found '{class_name}'",
                self.line()
            )));
        }
        self.expect(Token::LBrace)?;
        self.expect_eol()?;

        let mut defs = Vec::new();
        while self.token == Token::Keyword(Keyword::Static) {
            defs.push(self.parse_def()?);
        }

        self.expect(Token::RBrace)?;
        Ok(defs)
    }

    /// `static IDENT ( getter | setter | function )`
    fn parse_def(&mut self) -> Result<Def> {
        self.expect_keyword(Keyword::Static)?;
        let name = self.expect_ident()?;

        match self.token {
            // Getter: a bare block.
            Token::LBrace => {
                let body = self.parse_block()?;
                self.expect_eol()?;
                Ok(Def::Getter(GetterDef {
                    name,
                    body,
                    locals: Vec::new(),
                }))
            }
            // Setter: '=' '(' IDENT ')' block
            Token::Assign => {
                self.advance()?;
                self.expect(Token::LParen)?;
                let param = Param::new(self.expect_ident()?);
                self.expect(Token::RParen)?;
                let body = self.parse_block()?;
                self.expect_eol()?;
                Ok(Def::Setter(SetterDef {
                    name,
                    param,
                    body,
                    locals: Vec::new(),
                }))
            }
            // Function: '(' params? ')' block
            Token::LParen => {
                self.advance()?;
                let params = if self.token == Token::RParen {
                    Vec::new()
                } else {
                    self.parse_param_list()?
                };
                self.expect(Token::RParen)?;
                let body = self.parse_block()?;
                self.expect_eol()?;
                Ok(Def::Function(FuncDef {
                    name,
                    params,
                    body,
                    locals: Vec::new(),
                }))
            }
            _ => Err(self.unexpected("'{', '=' or '(' after the definition name")),
        }
    }

    /// `IDENT (',' IDENT)*`
    fn parse_param_list(&mut self) -> Result<Vec<Param>> {
        let mut params = vec![Param::new(self.expect_ident()?)];
        while self.token == Token::Comma {
            self.advance()?;
            params.push(Param::new(self.expect_ident()?));
        }
        Ok(params)
    }

    /// `'{' EOL stmt* '}'` - consumes the closing brace.
    fn parse_block(&mut self) -> Result<Block> {
        self.expect(Token::LBrace)?;
        self.expect_eol()?;

        let mut stmts = Vec::new();
        while self.token != Token::RBrace {
            stmts.push(self.parse_stmt()?);
            self.expect_eol()?;
        }
        self.expect(Token::RBrace)?;

        Ok(Block { stmts, scope: None })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.token.clone() {
            Token::Keyword(Keyword::Var) => {
                self.advance()?;
                let name = self.expect_ident()?;
                Ok(Stmt::VarDecl { name, scope: None })
            }

            Token::Keyword(Keyword::If) => {
                self.advance()?;
                self.expect(Token::LParen)?;
                let cond = self.parse_rhs()?;
                self.expect(Token::RParen)?;
                let then_block = self.parse_block()?;
                self.expect_keyword(Keyword::Else)?;
                let else_block = self.parse_block()?;
                Ok(Stmt::If {
                    cond,
                    then_block,
                    else_block,
                })
            }

            Token::Keyword(Keyword::While) => {
                self.advance()?;
                self.expect(Token::LParen)?;
                let cond = self.parse_rhs()?;
                self.expect(Token::RParen)?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body })
            }

            Token::Keyword(Keyword::Return) => {
                self.advance()?;
                let value = if self.token == Token::Eol {
                    None
                } else {
                    Some(self.parse_rhs()?)
                };
                Ok(Stmt::Return {
                    value,
                    ty: ifjc_util::DataType::Undef,
                })
            }

            Token::Keyword(Keyword::Ifj) => {
                self.advance()?;
                let call = self.parse_ifj_call()?;
                Ok(Stmt::Call(call))
            }

            Token::LBrace => Ok(Stmt::Block(self.parse_block()?)),

            Token::Ident(name) | Token::GlobalIdent(name) => {
                self.advance()?;
                match self.token {
                    // Call statement.
                    Token::LParen => {
                        self.advance()?;
                        let args = self.parse_args()?;
                        self.expect(Token::RParen)?;
                        Ok(Stmt::Call(FuncCall::new(name, args)))
                    }
                    // Assignment.
                    Token::Assign => {
                        self.advance()?;
                        let rhs = self.parse_rhs()?;
                        Ok(Stmt::Assign {
                            target: name,
                            scope: None,
                            rhs,
                        })
                    }
                    _ => Err(self.unexpected("'(' or '=' after the identifier")),
                }
            }

            _ => Err(self.unexpected("a statement")),
        }
    }

    /// `'Ifj' . IDENT '(' args? ')'` - the `Ifj` keyword has already been
    /// consumed. The produced call name carries the `Ifj.` prefix so its
    /// overload key matches the preloaded built-ins.
    fn parse_ifj_call(&mut self) -> Result<FuncCall> {
        self.expect(Token::Dot)?;
        let method = self.expect_ident()?;
        self.expect(Token::LParen)?;
        let args = self.parse_args()?;
        self.expect(Token::RParen)?;
        Ok(FuncCall::new(format!("Ifj.{method}"), args))
    }

    /// `expr (',' expr)*` or nothing; stops at `)`. Calls are not
    /// permitted inside argument expressions.
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.token == Token::RParen {
            return Ok(args);
        }
        args.push(self.parse_arg_expr()?);
        while self.token == Token::Comma {
            self.advance()?;
            args.push(self.parse_arg_expr()?);
        }
        Ok(args)
    }

    fn parse_arg_expr(&mut self) -> Result<Expr> {
        match self.parse_expression()? {
            ExprOutcome::Expr(expr) => Ok(expr),
            ExprOutcome::Call(name) => Err(CompileError::Syntax(format!(
                "line {}: function call '{name}' is not allowed inside an argument",
                self.line()
            ))),
        }
    }

    /// An expression or a call: assignment right-hand sides, `return`
    /// values, and `if`/`while` conditions.
    fn parse_rhs(&mut self) -> Result<Rhs> {
        if self.token == Token::Keyword(Keyword::Ifj) {
            self.advance()?;
            return Ok(Rhs::Call(self.parse_ifj_call()?));
        }
        match self.parse_expression()? {
            ExprOutcome::Expr(expr) => Ok(Rhs::Expr(expr)),
            ExprOutcome::Call(name) => {
                // The expression parser stopped on '('; finish the call here.
                self.expect(Token::LParen)?;
                let args = self.parse_args()?;
                self.expect(Token::RParen)?;
                Ok(Rhs::Call(FuncCall::new(name, args)))
            }
        }
    }
}
