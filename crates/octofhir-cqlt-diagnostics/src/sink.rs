//! Injectable destinations for non-fatal diagnostics
//!
//! Expansion code never writes warnings to a global stream; it reports them
//! to a `DiagnosticSink` handed in by the caller. Production code uses
//! `LogSink`, tests use `CollectingSink` and assert on what was reported.

use crate::{Diagnostic, ErrorCode, Severity};
use parking_lot::Mutex;

/// Receiver of diagnostics produced while expanding or running test cases
pub trait DiagnosticSink: Send + Sync {
    /// Report a diagnostic
    fn report(&self, diagnostic: Diagnostic);

    /// Report a warning with the given code
    fn warn(&self, code: ErrorCode, message: String) {
        self.report(Diagnostic::warning(code, message));
    }
}

/// Sink that forwards diagnostics to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => log::error!("{}", diagnostic),
            Severity::Warning => log::warn!("{}", diagnostic),
            Severity::Info => log::info!("{}", diagnostic),
        }
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Sink that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Codes of all reported warnings, in report order
    pub fn warning_codes(&self) -> Vec<ErrorCode> {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.is_warning())
            .map(|d| d.code)
            .collect()
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.diagnostics.lock().iter().any(|d| d.code == code)
    }

    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }
}

/// Wraps another sink and stamps every diagnostic with a context label
pub struct ContextSink<'a> {
    inner: &'a dyn DiagnosticSink,
    context: String,
}

impl<'a> ContextSink<'a> {
    pub fn new(inner: &'a dyn DiagnosticSink, context: impl Into<String>) -> Self {
        Self {
            inner,
            context: context.into(),
        }
    }
}

impl DiagnosticSink for ContextSink<'_> {
    fn report(&self, diagnostic: Diagnostic) {
        let diagnostic = match diagnostic.context {
            Some(_) => diagnostic,
            None => diagnostic.with_context(self.context.clone()),
        };
        self.inner.report(diagnostic);
    }
}
