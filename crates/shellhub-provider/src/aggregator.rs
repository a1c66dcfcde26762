//! Directory of hosted shell providers keyed by routing key.
//!
//! Read-mostly: lookups take the read lock only long enough to clone an
//! `Arc`, so concurrent requests never contend on provider work.

use crate::shell::ShellProvider;
use shellhub_kernel::{Outcome, ShellDescriptor, ShellhubError};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ProviderAggregator {
    shells: RwLock<BTreeMap<String, Arc<ShellProvider>>>,
}

impl ProviderAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host `provider` under `key`. An existing entry is replaced.
    pub fn register(&self, key: impl Into<String>, provider: ShellProvider) -> Outcome<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Outcome::failure(ShellhubError::validation(
                "shell provider key must not be empty",
            ));
        }
        let replaced = self
            .shells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), Arc::new(provider))
            .is_some();
        info!(key = key.as_str(), replaced, "shell provider registered");
        if replaced {
            Outcome::info(format!("replaced shell provider `{key}`"))
        } else {
            Outcome::done()
        }
    }

    pub fn unregister(&self, key: &str) -> Outcome<()> {
        let removed = self
            .shells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        match removed {
            Some(_) => {
                info!(key, "shell provider unregistered");
                Outcome::done()
            }
            None => Outcome::info(format!("shell provider `{key}` was not registered")),
        }
    }

    pub fn lookup_shell_provider(&self, key: &str) -> Outcome<Arc<ShellProvider>> {
        let shells = self.shells.read().unwrap_or_else(PoisonError::into_inner);
        match shells.get(key) {
            Some(provider) => Outcome::ok(Arc::clone(provider)),
            None => {
                debug!(key, "no shell provider");
                Outcome::failure(ShellhubError::not_found(format!(
                    "no shell provider registered under `{key}`"
                )))
            }
        }
    }

    pub fn shell_ids(&self) -> Vec<String> {
        self.shells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptors for every hosted shell, one endpoint per base address.
    pub fn descriptors(&self, base_endpoints: &[String]) -> Vec<ShellDescriptor> {
        let shells: Vec<(String, Arc<ShellProvider>)> = self
            .shells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, provider)| (key.clone(), Arc::clone(provider)))
            .collect();

        shells
            .into_iter()
            .map(|(key, provider)| {
                let mut bases = base_endpoints.iter();
                let mut descriptor = provider.descriptor(&key, bases.next().map(String::as_str));
                for base in bases {
                    let extra = provider.descriptor(&key, Some(base));
                    descriptor.endpoints.extend(extra.endpoints);
                    for (target, source) in descriptor
                        .submodel_descriptors
                        .iter_mut()
                        .zip(extra.submodel_descriptors)
                    {
                        target.endpoints.extend(source.endpoints);
                    }
                }
                descriptor
            })
            .collect()
    }
}
