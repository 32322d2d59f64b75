//! ifjc-lex - Lexical analysis for IFJ25.
//!
//! A hand-written DFA over a byte stream. The lexer is pulled one token at
//! a time by the parser; it never looks at semantic context and raises only
//! lexical and internal errors.

mod edge_cases;
pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Keyword, Token};
