//! Indexed resource definitions
//!
//! Definitions are built once from structure-definition documents and then
//! only read. Choice elements (`value[x]`) keep their declared candidate
//! types; supplied names such as `valueQuantity` are resolved by
//! `ChoiceName`, never by ad hoc slicing at the call sites.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How many values a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// `max = 0`: explicitly disallowed
    Forbidden,
    /// `1..1`
    ExactlyOne,
    /// `0..1`
    AtMostOne,
    /// `max > 1` or `*`
    Many,
}

impl Cardinality {
    /// Derive the cardinality from structure-definition bounds
    pub fn from_bounds(min: u32, max: &str) -> Option<Self> {
        match max {
            "*" => Some(Self::Many),
            "0" => Some(Self::Forbidden),
            "1" if min >= 1 => Some(Self::ExactlyOne),
            "1" => Some(Self::AtMostOne),
            other => other.parse::<u32>().ok().map(|_| Self::Many),
        }
    }

    pub fn is_many(self) -> bool {
        self == Self::Many
    }

    pub fn is_forbidden(self) -> bool {
        self == Self::Forbidden
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forbidden => write!(f, "0..0"),
            Self::ExactlyOne => write!(f, "1..1"),
            Self::AtMostOne => write!(f, "0..1"),
            Self::Many => write!(f, "0..*"),
        }
    }
}

/// Expansion behaviour selected by a declared type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    DateTime,
    Time,
    CodeableConcept,
    Coding,
    Quantity,
    HumanName,
    Period,
    Reference,
    /// Inline nested element, defined under the field's own path
    Backbone,
    /// Any other complex type, expanded through its own definition
    Complex,
}

const FHIRPATH_SYSTEM: &str = "http://hl7.org/fhirpath/System.";

/// A declared value type of a field (a FHIR type code)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueType(String);

impl ValueType {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> TypeKind {
        // R4 types primitive values with FHIRPath system types
        if let Some(system) = self.0.strip_prefix(FHIRPATH_SYSTEM) {
            return match system {
                "Boolean" => TypeKind::Boolean,
                "Integer" => TypeKind::Integer,
                "Decimal" => TypeKind::Decimal,
                "Date" => TypeKind::Date,
                "DateTime" => TypeKind::DateTime,
                "Time" => TypeKind::Time,
                _ => TypeKind::String,
            };
        }
        match self.0.as_str() {
            "boolean" => TypeKind::Boolean,
            "integer" | "positiveInt" | "unsignedInt" | "integer64" => TypeKind::Integer,
            "decimal" => TypeKind::Decimal,
            "date" => TypeKind::Date,
            "dateTime" | "instant" => TypeKind::DateTime,
            "time" => TypeKind::Time,
            "CodeableConcept" => TypeKind::CodeableConcept,
            "Coding" => TypeKind::Coding,
            "Quantity" | "Age" | "Duration" | "SimpleQuantity" | "Count" | "Distance"
            | "MoneyQuantity" => TypeKind::Quantity,
            "HumanName" => TypeKind::HumanName,
            "Period" => TypeKind::Period,
            "Reference" => TypeKind::Reference,
            "BackboneElement" | "Element" => TypeKind::Backbone,
            code if code.starts_with(|c: char| c.is_ascii_lowercase()) => TypeKind::String,
            _ => TypeKind::Complex,
        }
    }

    /// Name of the definition describing this type's own fields, if any
    pub fn definition_name(&self) -> Option<&str> {
        match self.kind() {
            TypeKind::Quantity => Some("Quantity"),
            TypeKind::Backbone
            | TypeKind::Boolean
            | TypeKind::Integer
            | TypeKind::Decimal
            | TypeKind::String
            | TypeKind::Date
            | TypeKind::DateTime
            | TypeKind::Time => None,
            _ => Some(&self.0),
        }
    }

    /// Suffix this type contributes to a choice element name
    /// (`dateTime` -> `DateTime`)
    pub fn choice_suffix(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One field of a resource, complex type or backbone element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Full element path (`Observation.value[x]`)
    pub path: String,
    /// Last path segment (`value[x]`)
    pub name: String,
    pub cardinality: Cardinality,
    /// Candidate types; more than one only for choice elements
    pub types: Vec<ValueType>,
    /// Path of the backbone element whose layout this element reuses
    /// (`Observation.component.referenceRange` -> `Observation.referenceRange`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<String>,
}

impl FieldDefinition {
    pub fn new(
        path: impl Into<String>,
        cardinality: Cardinality,
        types: impl IntoIterator<Item = ValueType>,
    ) -> Self {
        let path = path.into();
        let name = path.rsplit('.').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            cardinality,
            types: types.into_iter().collect(),
            content_reference: None,
        }
    }

    /// A backbone element declared by reference to another element's layout
    pub fn referencing(
        path: impl Into<String>,
        cardinality: Cardinality,
        target: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(path, cardinality, [ValueType::new("BackboneElement")]);
        field.content_reference = Some(target.into());
        field
    }

    /// Path of the backbone definition describing this element's own fields
    pub fn structure_path(&self) -> &str {
        self.content_reference.as_deref().unwrap_or(&self.path)
    }

    pub fn is_choice(&self) -> bool {
        self.name.ends_with("[x]")
    }

    /// Field name without the choice marker
    pub fn base_name(&self) -> &str {
        self.name.strip_suffix("[x]").unwrap_or(&self.name)
    }

    /// Match a supplied field name against this definition, returning the
    /// value type it selects
    pub fn match_name(&self, supplied: &str) -> Option<&ValueType> {
        if !self.is_choice() {
            return (supplied == self.name).then(|| self.types.first()).flatten();
        }
        let choice = ChoiceName::parse(supplied, self.base_name())?;
        self.types
            .iter()
            .find(|t| t.choice_suffix() == choice.type_suffix)
    }
}

/// A supplied name split against a choice element's base name:
/// `valueQuantity` against `value` gives type suffix `Quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceName<'a> {
    pub base: &'a str,
    pub type_suffix: &'a str,
}

impl<'a> ChoiceName<'a> {
    pub fn parse(supplied: &'a str, base: &str) -> Option<Self> {
        let type_suffix = supplied.strip_prefix(base)?;
        if !type_suffix.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        Some(Self {
            base: &supplied[..base.len()],
            type_suffix,
        })
    }
}

/// A supplied field name resolved to its definition and selected type
#[derive(Debug, Clone, Copy)]
pub struct FieldMatch<'a> {
    pub field: &'a FieldDefinition,
    pub value_type: &'a ValueType,
}

/// What a definition describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Resource,
    ComplexType,
    Backbone,
}

/// Ordered, indexed field list of one resource type (or nested type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefinition {
    /// Type name, or element path for backbone elements
    pub name: String,
    pub kind: DefinitionKind,
    pub description: Option<String>,
    fields: Vec<FieldDefinition>,
    by_name: HashMap<String, usize>,
    choices: Vec<usize>,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            fields: Vec::new(),
            by_name: HashMap::new(),
            choices: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field; a repeated name replaces nothing and returns false
    pub fn push_field(&mut self, field: FieldDefinition) -> bool {
        if self.by_name.contains_key(&field.name) {
            return false;
        }
        let index = self.fields.len();
        self.by_name.insert(field.name.clone(), index);
        if field.is_choice() {
            self.choices.push(index);
        }
        self.fields.push(field);
        true
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.push_field(field);
        self
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Exact lookup by declared name (`value[x]` for choices)
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Resolve a supplied name, trying exact names first and then choices
    pub fn resolve_field(&self, supplied: &str) -> Option<FieldMatch<'_>> {
        if let Some(field) = self.field(supplied) {
            if !field.is_choice() {
                return field.types.first().map(|value_type| FieldMatch { field, value_type });
            }
        }
        self.choices.iter().find_map(|&i| {
            let field = &self.fields[i];
            field
                .match_name(supplied)
                .map(|value_type| FieldMatch { field, value_type })
        })
    }
}
