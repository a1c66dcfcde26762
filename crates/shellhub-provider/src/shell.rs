//! A live shell: its submodel providers keyed by idShort.

use crate::submodel::{SubmodelProvider, SubmodelSummary};
use serde::Serialize;
use shellhub_kernel::{Endpoint, Identifier, Outcome, ShellDescriptor, ShellhubError};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSummary {
    pub id_short: String,
    pub identification: Identifier,
    pub submodels: Vec<SubmodelSummary>,
}

#[derive(Debug)]
pub struct ShellProvider {
    id_short: String,
    identifier: Identifier,
    submodels: RwLock<BTreeMap<String, Arc<SubmodelProvider>>>,
}

impl ShellProvider {
    pub fn new(id_short: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            id_short: id_short.into(),
            identifier,
            submodels: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_submodel(self, submodel: SubmodelProvider) -> Self {
        self.register_submodel(submodel);
        self
    }

    pub fn id_short(&self) -> &str {
        &self.id_short
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Host `submodel` under its idShort, replacing any previous binding.
    pub fn register_submodel(&self, submodel: SubmodelProvider) -> Outcome<()> {
        let id_short = submodel.id_short().to_string();
        let replaced = self
            .submodels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id_short.clone(), Arc::new(submodel))
            .is_some();
        if replaced {
            Outcome::info(format!("replaced submodel provider `{id_short}`"))
        } else {
            Outcome::done()
        }
    }

    pub fn unregister_submodel(&self, id_short: &str) -> Outcome<()> {
        let removed = self
            .submodels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id_short);
        match removed {
            Some(_) => Outcome::done(),
            None => Outcome::info(format!("submodel provider `{id_short}` was not hosted")),
        }
    }

    pub fn lookup_submodel(&self, id_short: &str) -> Outcome<Arc<SubmodelProvider>> {
        let submodels = self.submodels.read().unwrap_or_else(PoisonError::into_inner);
        match submodels.get(id_short) {
            Some(provider) => Outcome::ok(Arc::clone(provider)),
            None => Outcome::failure(ShellhubError::not_found(format!(
                "submodel `{id_short}` is not hosted by shell `{}`",
                self.id_short
            ))),
        }
    }

    /// The hosted provider, or an empty one when nothing is bound.
    pub fn submodel_or_empty(&self, id_short: &str) -> Arc<SubmodelProvider> {
        self.lookup_submodel(id_short)
            .payload
            .unwrap_or_else(|| Arc::new(SubmodelProvider::empty(id_short)))
    }

    pub fn submodel_ids(&self) -> Vec<String> {
        self.submodels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn submodel_summaries(&self) -> Vec<SubmodelSummary> {
        self.submodels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|provider| provider.summary())
            .collect()
    }

    pub fn summary(&self) -> ShellSummary {
        ShellSummary {
            id_short: self.id_short.clone(),
            identification: self.identifier.clone(),
            submodels: self.submodel_summaries(),
        }
    }

    /// Descriptor with endpoints under `base` for every hosted submodel.
    ///
    /// `shell_key` is the routing key this shell is hosted under.
    pub fn descriptor(&self, shell_key: &str, base: Option<&str>) -> ShellDescriptor {
        let shell_address =
            base.map(|b| format!("{}/shells/{shell_key}/aas", b.trim_end_matches('/')));
        let mut descriptor = ShellDescriptor::new(self.id_short.clone(), self.identifier.clone());
        if let Some(address) = &shell_address {
            descriptor = descriptor.with_endpoint(Endpoint::http(address.clone()));
        }
        let submodels = self.submodels.read().unwrap_or_else(PoisonError::into_inner);
        for (id_short, provider) in submodels.iter() {
            let endpoint = shell_address
                .as_ref()
                .map(|address| format!("{address}/submodels/{id_short}/submodel"));
            descriptor = descriptor.with_submodel(provider.descriptor(endpoint.as_deref()));
        }
        descriptor
    }
}
