//! Diagnostics written to standard error.
//!
//! Only the process exit category is part of the compiler's observable
//! contract; these messages exist for people debugging their programs (or
//! the compiler). The driver owns one [`Handler`] per compilation.

use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// 1-based source line, when the reporting stage knows it.
    pub line: Option<u32>,
}

impl Diagnostic {
    /// Builds an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            line: None,
        }
    }

    /// Attaches a source line number.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}: line {}: {}", self.level, line, self.message),
            None => write!(f, "{}: {}", self.level, self.message),
        }
    }
}

/// Collects diagnostics and mirrors them to standard error.
#[derive(Default)]
pub struct Handler {
    emitted: Vec<Diagnostic>,
}

impl Handler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and prints it to stderr.
    pub fn emit(&mut self, diag: Diagnostic) {
        eprintln!("{diag}");
        self.emitted.push(diag);
    }

    /// Whether any error-level diagnostic has been emitted.
    pub fn has_errors(&self) -> bool {
        self.emitted.iter().any(|d| d.level == Level::Error)
    }

    /// All diagnostics emitted so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.emitted
    }
}
