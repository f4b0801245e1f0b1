//! Schema version tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque tag selecting one immutable snapshot of resource definitions
/// (e.g. `FHIRv401`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    pub const FHIR_V102: &'static str = "FHIRv102";
    pub const FHIR_V300: &'static str = "FHIRv300";
    pub const FHIR_V400: &'static str = "FHIRv400";
    pub const FHIR_V401: &'static str = "FHIRv401";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn fhir_v102() -> Self {
        Self::new(Self::FHIR_V102)
    }

    pub fn fhir_v300() -> Self {
        Self::new(Self::FHIR_V300)
    }

    pub fn fhir_v400() -> Self {
        Self::new(Self::FHIR_V400)
    }

    pub fn fhir_v401() -> Self {
        Self::new(Self::FHIR_V401)
    }

    /// The tags with embedded schemas
    pub fn supported() -> [SchemaVersion; 4] {
        [
            Self::fhir_v102(),
            Self::fhir_v300(),
            Self::fhir_v400(),
            Self::fhir_v401(),
        ]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// FHIR major release encoded in a `FHIRvNNN` tag (`FHIRv401` -> 4)
    pub fn major(&self) -> Option<u8> {
        let prefix = self.0.get(..5)?;
        if !prefix.eq_ignore_ascii_case("fhirv") {
            return None;
        }
        self.0[5..].chars().next()?.to_digit(10).map(|d| d as u8)
    }

    /// Whether this tag selects a FHIR R4 (4.x) dialect
    pub fn is_r4(&self) -> bool {
        self.major() == Some(4)
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::fhir_v401()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaVersion {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for SchemaVersion {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}
