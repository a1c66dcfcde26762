//! Identifier → location mapping.

use shellhub_kernel::StorageKey;
use std::path::{Path, PathBuf};

/// Name of the nested container holding a shell's submodel records.
pub const SUBMODEL_FOLDER: &str = "Submodels";

const RECORD_EXTENSION: &str = "json";

/// Paths belonging to one shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLayout {
    key: StorageKey,
    container: PathBuf,
}

impl ShellLayout {
    pub fn for_shell(root: &Path, shell_id: &str) -> Self {
        Self::for_key(root, StorageKey::for_id(shell_id))
    }

    pub fn for_key(root: &Path, key: StorageKey) -> Self {
        let container = root.join(key.as_str());
        Self { key, container }
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    /// `<root>/<key>`
    pub fn container(&self) -> &Path {
        &self.container
    }

    /// `<root>/<key>/<key>.json`
    pub fn record(&self) -> PathBuf {
        self.container
            .join(format!("{}.{RECORD_EXTENSION}", self.key.as_str()))
    }

    /// `<root>/<key>/Submodels`
    pub fn submodels(&self) -> PathBuf {
        self.container.join(SUBMODEL_FOLDER)
    }

    /// `<root>/<key>/Submodels/<idShort>.json`
    pub fn submodel_record(&self, id_short: &str) -> PathBuf {
        self.submodels()
            .join(format!("{id_short}.{RECORD_EXTENSION}"))
    }
}

/// Short name encoded in a submodel record path, if it is one.
pub fn submodel_id_from_record(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToString::to_string)
}
