//! Fixture expansion errors

use octofhir_cqlt_diagnostics::{
    CQLT0100, CQLT0101, CQLT0102, CQLT0103, CQLT0104, CQLT0105, CQLT0200, CQLT0201, CQLT0202,
    CQLT0300, CQLT0301, ErrorCode,
};
use octofhir_cqlt_schema::SchemaError;
use thiserror::Error;

/// Result type for expansion operations
pub type ExpansionResult<T> = Result<T, ExpansionError>;

/// A shorthand string that does not follow its grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShorthandError {
    #[error("Malformed coded value '{raw}'")]
    MalformedCode { raw: String },

    #[error("Malformed quantity '{raw}'")]
    MalformedQuantity { raw: String },

    #[error("Malformed period '{raw}'")]
    MalformedPeriod { raw: String },

    #[error("Invalid {expected} value '{raw}'")]
    InvalidTemporal { raw: String, expected: &'static str },

    #[error("Invalid {expected} value '{raw}'")]
    InvalidPrimitive { raw: String, expected: &'static str },

    /// A string was supplied for a complex type that has no shorthand
    #[error("No shorthand notation for {type_code}: '{raw}'")]
    NoShorthand { raw: String, type_code: String },
}

impl ShorthandError {
    /// The offending raw input
    pub fn raw(&self) -> &str {
        match self {
            Self::MalformedCode { raw }
            | Self::MalformedQuantity { raw }
            | Self::MalformedPeriod { raw }
            | Self::InvalidTemporal { raw, .. }
            | Self::InvalidPrimitive { raw, .. }
            | Self::NoShorthand { raw, .. } => raw,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedCode { .. } => CQLT0100,
            Self::MalformedQuantity { .. } => CQLT0101,
            Self::MalformedPeriod { .. } => CQLT0102,
            Self::InvalidTemporal { .. } => CQLT0103,
            Self::InvalidPrimitive { .. } => CQLT0104,
            Self::NoShorthand { .. } => CQLT0105,
        }
    }
}

/// Errors that abort expansion of a fact record or test case
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpansionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{owner}.{field}: {source}")]
    Shorthand {
        owner: String,
        field: String,
        #[source]
        source: ShorthandError,
    },

    /// The schema forbids the field (`max = 0`) but a value was supplied
    #[error("Field {owner}.{field} is not allowed")]
    ZeroCardinalityField { owner: String, field: String },

    #[error("Field {owner}.{field} accepts a single value but a list was supplied")]
    MultipleValuesNotAllowed { owner: String, field: String },

    #[error("Invalid fact record: {message}")]
    InvalidFact { message: String },

    #[error("Test case document has no name")]
    MissingTestName,

    #[error("Failed to parse test case document {source_name}: {message}")]
    Document { source_name: String, message: String },
}

impl ExpansionError {
    pub fn invalid_fact(message: impl Into<String>) -> Self {
        Self::InvalidFact {
            message: message.into(),
        }
    }

    pub fn document(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Document {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Schema(e) => e.code(),
            Self::Shorthand { source, .. } => source.code(),
            Self::ZeroCardinalityField { .. } => CQLT0200,
            Self::MultipleValuesNotAllowed { .. } => CQLT0201,
            Self::InvalidFact { .. } => CQLT0202,
            Self::MissingTestName => CQLT0300,
            Self::Document { .. } => CQLT0301,
        }
    }
}
