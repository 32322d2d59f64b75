//! Edge case tests for ifjc-lex.
