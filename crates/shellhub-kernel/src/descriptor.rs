//! Shell and submodel descriptors: the persisted, discoverable metadata.
//!
//! A descriptor is not a live object. It names an identifier, a short name,
//! and the endpoints where a provider can be reached. The registry stores
//! submodel descriptors separately from their shell and rebuilds
//! `submodel_descriptors` on every read.

use crate::error::ShellhubError;
use crate::identifier::Identifier;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Version/revision metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministrativeInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

/// A description in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangString {
    pub language: String,
    pub text: String,
}

/// A reachable address for a shell or submodel provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    #[serde(rename = "type", default = "default_endpoint_type")]
    pub kind: String,
}

fn default_endpoint_type() -> String {
    "http".to_string()
}

impl Endpoint {
    pub fn http(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            kind: default_endpoint_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelDescriptor {
    pub identification: Identifier,
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<AdministrativeInformation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
}

impl SubmodelDescriptor {
    pub fn new(id_short: impl Into<String>, identification: Identifier) -> Self {
        Self {
            identification,
            id_short: id_short.into(),
            administration: None,
            description: Vec::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn validate(&self) -> Result<(), ShellhubError> {
        if self.identification.is_empty() {
            return Err(ShellhubError::validation(
                "submodel identification must not be empty",
            ));
        }
        validate_id_short(&self.id_short)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellDescriptor {
    pub identification: Identifier,
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<AdministrativeInformation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    /// Reconstructed from the registry on read; never stored inline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submodel_descriptors: Vec<SubmodelDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ShellDescriptor {
    pub fn new(id_short: impl Into<String>, identification: Identifier) -> Self {
        Self {
            identification,
            id_short: id_short.into(),
            administration: None,
            description: Vec::new(),
            submodel_descriptors: Vec::new(),
            endpoints: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_submodel(mut self, submodel: SubmodelDescriptor) -> Self {
        self.submodel_descriptors.push(submodel);
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn id(&self) -> &str {
        &self.identification.id
    }

    /// Identifier and short name present, nested short names valid and
    /// unique within this shell.
    pub fn validate(&self) -> Result<(), ShellhubError> {
        if self.identification.is_empty() {
            return Err(ShellhubError::validation(
                "shell identification must not be empty",
            ));
        }
        validate_id_short(&self.id_short)?;

        let mut seen = BTreeSet::new();
        for submodel in &self.submodel_descriptors {
            submodel.validate()?;
            if !seen.insert(submodel.id_short.as_str()) {
                return Err(ShellhubError::validation(format!(
                    "duplicate submodel idShort `{}` in shell `{}`",
                    submodel.id_short, self.identification.id
                )));
            }
        }
        Ok(())
    }

    /// Copy with the nested submodel list cleared: the stored shape.
    pub fn without_submodels(&self) -> Self {
        Self {
            submodel_descriptors: Vec::new(),
            ..self.clone()
        }
    }
}

fn id_short_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("idShort regex must compile"))
}

/// Short names double as path segments and file names.
pub fn validate_id_short(id_short: &str) -> Result<(), ShellhubError> {
    if id_short.is_empty() {
        return Err(ShellhubError::validation("idShort must not be empty"));
    }
    if !id_short_re().is_match(id_short) {
        return Err(ShellhubError::validation(format!(
            "idShort `{id_short}` is not path-safe (expected [A-Za-z][A-Za-z0-9_-]*)"
        )));
    }
    Ok(())
}
