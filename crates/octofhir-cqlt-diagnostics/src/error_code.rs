//! Harness error codes following a structured numbering system
//!
//! Error code ranges:
//! - CQLT0001-CQLT0099: Schema errors (versions, resource types, fields)
//! - CQLT0100-CQLT0199: Shorthand errors (malformed inline notation)
//! - CQLT0200-CQLT0299: Expansion errors (cardinality, fact records)
//! - CQLT0300-CQLT0399: Fixture errors and warnings (test-case documents)
//! - CQLT0400-CQLT0499: Assertion errors
//! - CQLT0500-CQLT0599: System errors (I/O, configuration, executor)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    pub const fn is_schema_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_shorthand_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_expansion_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub const fn is_fixture_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    pub const fn is_assertion_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    pub const fn is_system_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CQLT{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Schema errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unsupported schema version")
        .with_help("Supported versions are FHIRv102, FHIRv300, FHIRv400 and FHIRv401"));
    map.insert(2, ErrorInfo::new("Unsupported resource type"));
    map.insert(3, ErrorInfo::new("Unknown field")
        .with_help("Check the field name against the resource definition for the selected version"));
    map.insert(4, ErrorInfo::new("Invalid schema configuration"));
    map.insert(5, ErrorInfo::new("Schema source could not be parsed"));

    // Shorthand errors (0100-0199)
    map.insert(100, ErrorInfo::new("Malformed coded value")
        .with_help("Expected `SYSTEM#code Display text`, `SYSTEM#code` or plain display text"));
    map.insert(101, ErrorInfo::new("Malformed quantity")
        .with_help("Expected a number optionally followed by a unit, e.g. `25 mg`"));
    map.insert(102, ErrorInfo::new("Malformed period")
        .with_help("Expected `start` or `start - end`"));
    map.insert(103, ErrorInfo::new("Invalid temporal value"));
    map.insert(104, ErrorInfo::new("Invalid primitive value"));
    map.insert(105, ErrorInfo::new("No shorthand notation for type"));

    // Expansion errors (0200-0299)
    map.insert(200, ErrorInfo::new("Field is not allowed by its cardinality"));
    map.insert(201, ErrorInfo::new("Multiple values not allowed"));
    map.insert(202, ErrorInfo::new("Invalid fact record"));

    // Fixture errors and warnings (0300-0399)
    map.insert(300, ErrorInfo::new("Missing test name"));
    map.insert(301, ErrorInfo::new("Test case document could not be parsed"));
    map.insert(310, ErrorInfo::new("Missing patient")
        .with_help("The first data entry should be a Patient; one was synthesized"));
    map.insert(311, ErrorInfo::new("Missing results"));
    map.insert(312, ErrorInfo::new("Unknown code system alias"));
    map.insert(313, ErrorInfo::new("Alias shadowed by canonical field"));
    map.insert(314, ErrorInfo::new("Additional patient")
        .with_help("Only the first data entry is the test patient; later Patient entries get their own ids"));

    // Assertion errors (0400-0499)
    map.insert(400, ErrorInfo::new("Unsupported assertion")
        .with_help("Supported directives are `$should exist` and `$should have length N`"));
    map.insert(401, ErrorInfo::new("Assertion failed"));

    // System errors (0500-0599)
    map.insert(500, ErrorInfo::new("Internal error"));
    map.insert(501, ErrorInfo::new("I/O error"));
    map.insert(502, ErrorInfo::new("Configuration error"));
    map.insert(503, ErrorInfo::new("CQL execution failed"));
    map.insert(504, ErrorInfo::new("Value set resolution failed"));

    map
});

// Schema errors
pub const CQLT0001: ErrorCode = ErrorCode::new(1);
pub const CQLT0002: ErrorCode = ErrorCode::new(2);
pub const CQLT0003: ErrorCode = ErrorCode::new(3);
pub const CQLT0004: ErrorCode = ErrorCode::new(4);
pub const CQLT0005: ErrorCode = ErrorCode::new(5);

// Shorthand errors
pub const CQLT0100: ErrorCode = ErrorCode::new(100);
pub const CQLT0101: ErrorCode = ErrorCode::new(101);
pub const CQLT0102: ErrorCode = ErrorCode::new(102);
pub const CQLT0103: ErrorCode = ErrorCode::new(103);
pub const CQLT0104: ErrorCode = ErrorCode::new(104);
pub const CQLT0105: ErrorCode = ErrorCode::new(105);

// Expansion errors
pub const CQLT0200: ErrorCode = ErrorCode::new(200);
pub const CQLT0201: ErrorCode = ErrorCode::new(201);
pub const CQLT0202: ErrorCode = ErrorCode::new(202);

// Fixture errors and warnings
pub const CQLT0300: ErrorCode = ErrorCode::new(300);
pub const CQLT0301: ErrorCode = ErrorCode::new(301);
pub const W_MISSING_PATIENT: ErrorCode = ErrorCode::new(310);
pub const W_MISSING_RESULTS: ErrorCode = ErrorCode::new(311);
pub const W_UNKNOWN_CODE_SYSTEM: ErrorCode = ErrorCode::new(312);
pub const W_ALIAS_SHADOWED: ErrorCode = ErrorCode::new(313);
pub const W_ADDITIONAL_PATIENT: ErrorCode = ErrorCode::new(314);

// Assertion errors
pub const CQLT0400: ErrorCode = ErrorCode::new(400);
pub const CQLT0401: ErrorCode = ErrorCode::new(401);

// System errors
pub const CQLT0500: ErrorCode = ErrorCode::new(500);
pub const CQLT0501: ErrorCode = ErrorCode::new(501);
pub const CQLT0502: ErrorCode = ErrorCode::new(502);
pub const CQLT0503: ErrorCode = ErrorCode::new(503);
pub const CQLT0504: ErrorCode = ErrorCode::new(504);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(CQLT0001.to_string(), "CQLT0001");
        assert_eq!(W_MISSING_PATIENT.to_string(), "CQLT0310");
    }

    #[test]
    fn test_error_categories() {
        assert!(CQLT0003.is_schema_error());
        assert!(!CQLT0003.is_shorthand_error());

        assert!(CQLT0101.is_shorthand_error());
        assert!(CQLT0201.is_expansion_error());
        assert!(W_MISSING_RESULTS.is_fixture_error());
        assert!(CQLT0400.is_assertion_error());
        assert!(CQLT0503.is_system_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(CQLT0300.info().description, "Missing test name");
        assert!(CQLT0400.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
