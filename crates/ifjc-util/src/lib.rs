//! ifjc-util - Foundation types shared by every compiler stage.
//!
//! This crate holds the pieces that more than one pipeline stage needs:
//! the error taxonomy with its numeric exit categories, the byte-source
//! adapter the lexer pulls from, the typed-index machinery used by the
//! scope arena, the shared `DataType`, and a small stderr diagnostics
//! handler.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod reader;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use error::{CompileError, Result};
pub use index_vec::{Idx, IndexVec};
pub use reader::ByteReader;

// Re-export the hashing types used across the workspace.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;

use std::fmt;

/// The data types the IFJ25 type model distinguishes.
///
/// `Undef` means "not known statically"; wherever inference produces it,
/// checking is deferred to the generated code's runtime type tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Type not known at compile time.
    Undef,
    /// Numeric value (stored as a float on the target machine).
    Num,
    /// String value.
    String,
    /// The null value.
    Null,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Undef => "Undef",
            DataType::Num => "Num",
            DataType::String => "String",
            DataType::Null => "Null",
        };
        write!(f, "{name}")
    }
}

/// Identifier of a scope in the analyzer's scope arena.
///
/// Scopes reference each other (and AST nodes reference scopes) through
/// these indices instead of pointers, so the whole tree can be torn down
/// in one shot after emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl Idx for ScopeId {
    fn from_usize(idx: usize) -> Self {
        assert!(idx <= u32::MAX as usize);
        ScopeId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}
