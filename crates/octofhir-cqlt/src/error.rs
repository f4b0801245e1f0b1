//! Harness errors

use octofhir_cqlt_diagnostics::{CQLT0501, CQLT0502, CQLT0503, CQLT0504, ErrorCode};
use octofhir_cqlt_fixture::ExpansionError;
use octofhir_cqlt_schema::SchemaError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised while configuring the harness or loading a suite
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A test-case document in `path` could not be expanded
    #[error("{}: {source}", path.display())]
    Expansion {
        path: PathBuf,
        #[source]
        source: ExpansionError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl HarnessError {
    pub fn expansion(path: impl AsRef<Path>, source: ExpansionError) -> Self {
        Self::Expansion {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Expansion { source, .. } => source.code(),
            Self::Schema(e) => e.code(),
            Self::Io { .. } => CQLT0501,
            Self::Config(_) => CQLT0502,
        }
    }
}

/// Failure reported by a CQL executor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    ValueSet(#[from] ValueSetError),
}

impl ExecutorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::LibraryNotFound(_) | Self::ExecutionFailed(_) => CQLT0503,
            Self::ValueSet(e) => e.code(),
        }
    }
}

/// Failure reported by a value-set resolver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueSetError {
    #[error("Value set not found: {id}{}", version.as_deref().map(|v| format!("|{v}")).unwrap_or_default())]
    NotFound { id: String, version: Option<String> },

    #[error("Value set service unavailable: {0}")]
    Unavailable(String),
}

impl ValueSetError {
    pub fn code(&self) -> ErrorCode {
        CQLT0504
    }
}
