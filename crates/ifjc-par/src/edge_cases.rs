//! Edge case tests for ifjc-par.
