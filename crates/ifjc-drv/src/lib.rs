//! ifjc-drv - Compiler driver.
//!
//! Wires the pipeline together: lexer -> parser -> semantic analyzer ->
//! emitter. Each stage fully materializes its output before the next one
//! runs; the first failing stage short-circuits the rest and its error
//! category becomes the process exit code.

use std::io::Read;

use ifjc_gen::CodeGen;
use ifjc_lex::Lexer;
use ifjc_par::Parser;
use ifjc_sem::SemanticAnalyzer;
use ifjc_util::Result;

/// Compiles an IFJ25 program read from `source`, returning the generated
/// IFJcode25 text.
pub fn compile_from(source: impl Read) -> Result<String> {
    let lexer = Lexer::new(source);
    let mut program = Parser::new(lexer).parse()?;
    let analysis = SemanticAnalyzer::new().analyze(&mut program)?;
    CodeGen::generate(&program, &analysis)
}

/// Convenience wrapper over [`compile_from`] for in-memory sources.
pub fn compile(source: &str) -> Result<String> {
    compile_from(source.as_bytes())
}
