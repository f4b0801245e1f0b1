//! Schema errors

use octofhir_cqlt_diagnostics::{CQLT0001, CQLT0002, CQLT0003, CQLT0004, CQLT0005, CQLT0501, ErrorCode};
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading or querying a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No schema files exist for the requested version tag
    #[error("Unsupported schema version: {version}")]
    UnsupportedSchemaVersion { version: String },

    /// The registry has no definition for a resource type
    #[error("Unsupported resource type: {resource_type}")]
    UnsupportedResourceType { resource_type: String },

    /// A field has no matching definition on its resource or type
    #[error("Unknown field '{field}' on {resource_type}")]
    UnknownField { resource_type: String, field: String },

    /// The configuration overlay references something the definitions lack
    #[error("Invalid schema configuration for {resource_type}: {message}")]
    InvalidConfig { resource_type: String, message: String },

    /// A schema source document could not be parsed
    #[error("Failed to parse {source_name}: {message}")]
    Parse { source_name: String, message: String },

    /// A schema source could not be read
    #[error("IO error: {0}")]
    Io(String),
}

impl SchemaError {
    pub fn unknown_field(resource_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            resource_type: resource_type.into(),
            field: field.into(),
        }
    }

    pub fn parse(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedSchemaVersion { .. } => CQLT0001,
            Self::UnsupportedResourceType { .. } => CQLT0002,
            Self::UnknownField { .. } => CQLT0003,
            Self::InvalidConfig { .. } => CQLT0004,
            Self::Parse { .. } => CQLT0005,
            Self::Io(_) => CQLT0501,
        }
    }
}
