//! Globally or locally scoped identifiers for shells and submodels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an identifier value is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// Globally unique URI.
    #[default]
    #[serde(rename = "IRI")]
    Iri,
    /// International registration data identifier.
    #[serde(rename = "IRDI")]
    Irdi,
    /// Locally scoped, application-defined value.
    Custom,
}

impl IdentifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iri => "IRI",
            Self::Irdi => "IRDI",
            Self::Custom => "Custom",
        }
    }
}

/// An identifier value plus its kind tag.
///
/// Immutable once assigned to a descriptor: descriptors expose it by
/// reference only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub id: String,
    #[serde(default)]
    pub id_type: IdentifierKind,
}

impl Identifier {
    pub fn new(id: impl Into<String>, id_type: IdentifierKind) -> Self {
        Self {
            id: id.into(),
            id_type,
        }
    }

    pub fn iri(id: impl Into<String>) -> Self {
        Self::new(id, IdentifierKind::Iri)
    }

    pub fn custom(id: impl Into<String>) -> Self {
        Self::new(id, IdentifierKind::Custom)
    }

    pub fn is_empty(&self) -> bool {
        self.id.trim().is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_with_wire_names() {
        let id = Identifier::iri("http://example.org/shells/1");
        let json = serde_json::to_value(&id).expect("identifier should serialize");
        assert_eq!(json["idType"], "IRI");
        assert_eq!(json["id"], "http://example.org/shells/1");
    }

    #[test]
    fn missing_kind_defaults_to_iri() {
        let id: Identifier =
            serde_json::from_str(r#"{"id":"urn:x"}"#).expect("identifier should parse");
        assert_eq!(id.id_type, IdentifierKind::Iri);
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(Identifier::custom("  ").is_empty());
        assert!(!Identifier::custom("a").is_empty());
    }
}
