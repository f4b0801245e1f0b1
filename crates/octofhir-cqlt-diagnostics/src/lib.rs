//! Diagnostics for the CQL testing harness
//!
//! This crate provides the shared error-code table used by every harness
//! crate, plus the warning channel (`DiagnosticSink`) that fixture expansion
//! reports non-fatal problems through.

mod diagnostic;
mod error_code;
mod sink;

pub use diagnostic::*;
pub use error_code::*;
pub use sink::*;
