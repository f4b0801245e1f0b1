//! Assertion errors

use octofhir_cqlt_diagnostics::{CQLT0400, CQLT0401, Diagnostic, ErrorCode};
use serde_json::Value;
use thiserror::Error;

/// Why one expectation did not hold
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssertionError {
    /// A `$should` directive this evaluator does not know
    #[error("Unsupported assertion '{directive}' for {expression}")]
    UnsupportedAssertion { expression: String, directive: String },

    /// Displays as `<expression>=<actual>` with the normalized actual value
    #[error("{expression}={actual}")]
    Mismatch {
        expression: String,
        actual: Value,
        expected: Value,
    },
}

impl AssertionError {
    pub fn expression(&self) -> &str {
        match self {
            Self::UnsupportedAssertion { expression, .. } | Self::Mismatch { expression, .. } => {
                expression
            }
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedAssertion { .. } => CQLT0400,
            Self::Mismatch { .. } => CQLT0401,
        }
    }
}

/// A failed expectation as reported to the test runner
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionFailure {
    pub expression: String,
    pub code: ErrorCode,
    pub message: String,
}

impl AssertionFailure {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code, self.message.clone())
    }
}

impl From<AssertionError> for AssertionFailure {
    fn from(error: AssertionError) -> Self {
        Self {
            expression: error.expression().to_string(),
            code: error.code(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
