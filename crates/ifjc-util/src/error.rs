//! Compiler error taxonomy.
//!
//! Every stage reports failure through [`CompileError`]; the variant decides
//! the process exit category. There is no recovery: the first error
//! short-circuits the rest of the pipeline.

use thiserror::Error;

/// Result alias used throughout the compiler.
pub type Result<T> = std::result::Result<T, CompileError>;

/// A compilation failure, one variant per numeric error category.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed input at the character level.
    #[error("lexical error: {0}")]
    Lexical(String),

    /// Token stream does not match the grammar.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Use of a variable, function, getter or setter that was never defined.
    #[error("undefined symbol: {0}")]
    Undefined(String),

    /// Second definition under an already-occupied symbol key.
    #[error("redefinition: {0}")]
    Redefinition(String),

    /// Call with the wrong argument count or argument types.
    #[error("wrong parameters: {0}")]
    WrongParams(String),

    /// Operands or assignment sides with incompatible types.
    #[error("type compatibility error: {0}")]
    TypeCompat(String),

    /// Any other semantic rule violation (e.g. use before initialization).
    #[error("semantic error: {0}")]
    Semantic(String),

    /// Allocation or I/O failure inside the compiler itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CompileError {
    /// The process exit category for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Lexical(_) => 1,
            CompileError::Syntax(_) => 2,
            CompileError::Undefined(_) => 3,
            CompileError::Redefinition(_) => 4,
            CompileError::WrongParams(_) => 5,
            CompileError::TypeCompat(_) => 6,
            CompileError::Semantic(_) => 10,
            CompileError::Internal(_) => 99,
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CompileError::Lexical("x".into()).exit_code(), 1);
        assert_eq!(CompileError::Syntax("x".into()).exit_code(), 2);
        assert_eq!(CompileError::Undefined("x".into()).exit_code(), 3);
        assert_eq!(CompileError::Redefinition("x".into()).exit_code(), 4);
        assert_eq!(CompileError::WrongParams("x".into()).exit_code(), 5);
        assert_eq!(CompileError::TypeCompat("x".into()).exit_code(), 6);
        assert_eq!(CompileError::Semantic("x".into()).exit_code(), 10);
        assert_eq!(CompileError::Internal("x".into()).exit_code(), 99);
    }

    #[test]
    fn test_io_error_is_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: CompileError = io.into();
        assert_eq!(err.exit_code(), 99);
    }
}
