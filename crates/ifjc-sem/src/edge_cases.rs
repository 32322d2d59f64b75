//! Edge case tests for ifjc-sem.
