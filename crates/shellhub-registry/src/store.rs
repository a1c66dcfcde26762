//! File-based descriptor registry.

use crate::layout::{ShellLayout, submodel_id_from_record};
use crate::locks::KeyLocks;
use crate::record::{read_record, write_record};
use shellhub_kernel::{
    Outcome, RegistrySettings, ShellDescriptor, ShellhubError, StorageKey, SubmodelDescriptor,
    validate_id_short,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Durable shell/submodel descriptor store rooted at one folder.
///
/// Every public operation returns an `Outcome`; I/O failures are reported as
/// `Io` outcomes and never escape as panics.
#[derive(Debug)]
pub struct DescriptorStore {
    root: PathBuf,
    locks: KeyLocks,
}

impl DescriptorStore {
    /// Open (and create if absent) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ShellhubError> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(ShellhubError::validation("registry folder path is empty"));
        }
        if !root.is_dir() {
            fs::create_dir_all(&root).map_err(|e| {
                error!(path = %root.display(), "registry folder cannot be created: {e}");
                ShellhubError::io(format!(
                    "registry folder {} cannot be created: {e}",
                    root.display()
                ))
            })?;
        }
        Ok(Self {
            root,
            locks: KeyLocks::new(),
        })
    }

    pub fn from_settings(settings: &RegistrySettings) -> Result<Self, ShellhubError> {
        Self::open(settings.folder_path.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn layout(&self, shell_id: &str) -> ShellLayout {
        ShellLayout::for_shell(&self.root, shell_id)
    }

    /// Whether a shell record exists for `shell_id`.
    pub fn contains_shell(&self, shell_id: &str) -> bool {
        !shell_id.is_empty() && self.layout(shell_id).record().is_file()
    }

    // ── Create ──

    /// Register a shell and its nested submodels, then return the stored form.
    pub fn create_shell(&self, descriptor: ShellDescriptor) -> Outcome<ShellDescriptor> {
        Outcome::from_result(self.try_create_shell(descriptor))
    }

    fn try_create_shell(
        &self,
        descriptor: ShellDescriptor,
    ) -> Result<ShellDescriptor, ShellhubError> {
        descriptor.validate()?;
        let shell_id = descriptor.id().to_string();
        let layout = self.layout(&shell_id);

        self.locks.with_lock(layout.key(), || {
            if !layout.container().is_dir() {
                fs::create_dir_all(layout.container())?;
            }
            for submodel in &descriptor.submodel_descriptors {
                self.write_submodel(&layout, submodel)?;
            }
            write_record(layout.record(), &descriptor.without_submodels())?;
            Ok::<(), ShellhubError>(())
        })?;

        info!(
            shell_id = %shell_id,
            key = %layout.key(),
            submodels = descriptor.submodel_descriptors.len(),
            "registered shell"
        );
        self.try_retrieve_shell(&shell_id)
    }

    /// Register one submodel under an already registered shell.
    pub fn create_submodel(
        &self,
        shell_id: &str,
        descriptor: SubmodelDescriptor,
    ) -> Outcome<SubmodelDescriptor> {
        Outcome::from_result(self.try_create_submodel(shell_id, descriptor))
    }

    fn try_create_submodel(
        &self,
        shell_id: &str,
        descriptor: SubmodelDescriptor,
    ) -> Result<SubmodelDescriptor, ShellhubError> {
        require_shell_id(shell_id)?;
        descriptor.validate()?;
        let layout = self.layout(shell_id);

        self.locks.with_lock(layout.key(), || {
            if !layout.container().is_dir() {
                return Err(ShellhubError::not_found(format!(
                    "shell `{shell_id}` does not exist - register the shell first"
                )));
            }
            self.write_submodel(&layout, &descriptor)
        })?;

        info!(shell_id = %shell_id, submodel = %descriptor.id_short, "registered submodel");
        self.try_retrieve_submodel(shell_id, &descriptor.id_short)
    }

    /// Caller holds the shell's key lock.
    fn write_submodel(
        &self,
        layout: &ShellLayout,
        descriptor: &SubmodelDescriptor,
    ) -> Result<(), ShellhubError> {
        let dir = layout.submodels();
        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
        }
        write_record(layout.submodel_record(&descriptor.id_short), descriptor).map_err(|e| {
            error!(submodel = %descriptor.id_short, "submodel write failed: {e}");
            ShellhubError::from(e)
        })
    }

    // ── Retrieve ──

    /// Read one shell, with its submodel list rebuilt from its container.
    pub fn retrieve_shell(&self, shell_id: &str) -> Outcome<ShellDescriptor> {
        Outcome::from_result(self.try_retrieve_shell(shell_id))
    }

    fn try_retrieve_shell(&self, shell_id: &str) -> Result<ShellDescriptor, ShellhubError> {
        require_shell_id(shell_id)?;
        let layout = self.layout(shell_id);
        if !layout.record().is_file() {
            return Err(ShellhubError::not_found(format!("shell `{shell_id}`")));
        }
        self.read_shell(&layout)
    }

    fn read_shell(&self, layout: &ShellLayout) -> Result<ShellDescriptor, ShellhubError> {
        let mut descriptor: ShellDescriptor = read_record(layout.record())?;
        // Best effort: a shell with no readable submodels reads with none.
        descriptor.submodel_descriptors = self.read_submodels(layout).unwrap_or_default();
        Ok(descriptor)
    }

    /// Read every registered shell. `NotFound` when none can be read.
    pub fn retrieve_shells(&self) -> Outcome<Vec<ShellDescriptor>> {
        Outcome::from_result(self.try_retrieve_shells())
    }

    fn try_retrieve_shells(&self) -> Result<Vec<ShellDescriptor>, ShellhubError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            ShellhubError::io(format!("{}: {e}", self.root.display()))
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            if StorageKey::is_key_shaped(&name) {
                keys.push(StorageKey(name));
            }
        }
        keys.sort();

        let mut shells = Vec::new();
        for key in keys {
            let layout = ShellLayout::for_key(&self.root, key);
            if !layout.record().is_file() {
                continue;
            }
            match self.read_shell(&layout) {
                Ok(shell) => shells.push(shell),
                Err(err) => warn!(key = %layout.key(), "skipping unreadable shell record: {err}"),
            }
        }

        if shells.is_empty() {
            return Err(ShellhubError::not_found("no shells registered"));
        }
        Ok(shells)
    }

    /// Read one submodel of one shell.
    pub fn retrieve_submodel(
        &self,
        shell_id: &str,
        submodel_id: &str,
    ) -> Outcome<SubmodelDescriptor> {
        Outcome::from_result(self.try_retrieve_submodel(shell_id, submodel_id))
    }

    fn try_retrieve_submodel(
        &self,
        shell_id: &str,
        submodel_id: &str,
    ) -> Result<SubmodelDescriptor, ShellhubError> {
        require_shell_id(shell_id)?;
        validate_id_short(submodel_id)?;
        let layout = self.layout(shell_id);
        if !layout.container().is_dir() {
            return Err(ShellhubError::not_found(format!("shell `{shell_id}`")));
        }
        let path = layout.submodel_record(submodel_id);
        if !path.is_file() {
            return Err(ShellhubError::not_found(format!(
                "submodel `{submodel_id}` in shell `{shell_id}`"
            )));
        }
        Ok(read_record(path)?)
    }

    /// Read all submodels of one shell, ordered by short name.
    pub fn retrieve_submodels(&self, shell_id: &str) -> Outcome<Vec<SubmodelDescriptor>> {
        Outcome::from_result(self.try_retrieve_submodels(shell_id))
    }

    fn try_retrieve_submodels(
        &self,
        shell_id: &str,
    ) -> Result<Vec<SubmodelDescriptor>, ShellhubError> {
        require_shell_id(shell_id)?;
        let layout = self.layout(shell_id);
        if !layout.container().is_dir() {
            return Err(ShellhubError::not_found(format!("shell `{shell_id}`")));
        }
        self.read_submodels(&layout)
    }

    fn read_submodels(
        &self,
        layout: &ShellLayout,
    ) -> Result<Vec<SubmodelDescriptor>, ShellhubError> {
        let dir = layout.submodels();
        if !dir.is_dir() {
            return Err(ShellhubError::not_found("no submodels registered"));
        }

        let mut records: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(id_short) = submodel_id_from_record(&path) {
                records.push((id_short, path));
            }
        }
        records.sort();

        let mut submodels = Vec::new();
        for (id_short, path) in records {
            match read_record::<SubmodelDescriptor>(&path) {
                Ok(submodel) => submodels.push(submodel),
                Err(err) => {
                    warn!(submodel = %id_short, "skipping unreadable submodel record: {err}")
                }
            }
        }

        if submodels.is_empty() {
            return Err(ShellhubError::not_found("no submodels registered"));
        }
        Ok(submodels)
    }

    // ── Delete ──

    /// Remove a shell and everything in its container.
    ///
    /// Deleting an absent shell succeeds with an informational message.
    pub fn delete_shell(&self, shell_id: &str) -> Outcome<()> {
        match self.try_delete_shell(shell_id) {
            Ok(true) => Outcome::done(),
            Ok(false) => Outcome::info(format!("no shell found for `{shell_id}`")),
            Err(err) => Outcome::failure(err),
        }
    }

    fn try_delete_shell(&self, shell_id: &str) -> Result<bool, ShellhubError> {
        require_shell_id(shell_id)?;
        let layout = self.layout(shell_id);
        let removed = self.locks.with_lock(layout.key(), || {
            if !layout.container().is_dir() {
                return Ok(false);
            }
            fs::remove_dir_all(layout.container()).map_err(|e| {
                error!(shell_id = %shell_id, "shell removal failed: {e}");
                ShellhubError::io(format!("{}: {e}", layout.container().display()))
            })?;
            Ok::<bool, ShellhubError>(true)
        })?;
        if removed {
            info!(shell_id = %shell_id, "deleted shell");
        } else {
            debug!(shell_id = %shell_id, "delete of absent shell");
        }
        Ok(removed)
    }

    /// Remove one submodel record. Absent records succeed informationally.
    pub fn delete_submodel(&self, shell_id: &str, submodel_id: &str) -> Outcome<()> {
        match self.try_delete_submodel(shell_id, submodel_id) {
            Ok(true) => Outcome::done(),
            Ok(false) => Outcome::info(format!(
                "no submodel `{submodel_id}` found in shell `{shell_id}`"
            )),
            Err(err) => Outcome::failure(err),
        }
    }

    fn try_delete_submodel(&self, shell_id: &str, submodel_id: &str) -> Result<bool, ShellhubError> {
        require_shell_id(shell_id)?;
        validate_id_short(submodel_id)?;
        let layout = self.layout(shell_id);
        let path = layout.submodel_record(submodel_id);
        let removed = self.locks.with_lock(layout.key(), || {
            if !path.is_file() {
                return Ok(false);
            }
            fs::remove_file(&path)
                .map_err(|e| ShellhubError::io(format!("{}: {e}", path.display())))?;
            Ok::<bool, ShellhubError>(true)
        })?;
        if removed {
            info!(shell_id = %shell_id, submodel = %submodel_id, "deleted submodel");
        }
        Ok(removed)
    }

    // ── Update ──

    /// Merge `metadata` into the shell's metadata map and persist it.
    ///
    /// An empty value removes its key. Returns the re-read descriptor.
    pub fn update_shell(
        &self,
        shell_id: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Outcome<ShellDescriptor> {
        Outcome::from_result(self.try_update_shell(shell_id, metadata))
    }

    fn try_update_shell(
        &self,
        shell_id: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<ShellDescriptor, ShellhubError> {
        require_shell_id(shell_id)?;
        if metadata.is_empty() {
            return Err(ShellhubError::validation("update carries no metadata"));
        }
        if metadata.keys().any(|k| k.trim().is_empty()) {
            return Err(ShellhubError::validation("metadata keys must not be empty"));
        }
        let layout = self.layout(shell_id);

        self.locks.with_lock(layout.key(), || {
            if !layout.record().is_file() {
                return Err(ShellhubError::not_found(format!("shell `{shell_id}`")));
            }
            let mut stored: ShellDescriptor = read_record(layout.record())?;
            stored.validate()?;
            for (key, value) in metadata {
                if value.is_empty() {
                    stored.metadata.remove(key);
                } else {
                    stored.metadata.insert(key.clone(), value.clone());
                }
            }
            write_record(layout.record(), &stored.without_submodels())?;
            Ok(())
        })?;

        info!(shell_id = %shell_id, keys = metadata.len(), "updated shell metadata");
        self.try_retrieve_shell(shell_id)
    }
}

fn require_shell_id(shell_id: &str) -> Result<(), ShellhubError> {
    if shell_id.trim().is_empty() {
        return Err(ShellhubError::validation("shell id must not be empty"));
    }
    Ok(())
}
