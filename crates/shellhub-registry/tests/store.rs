use shellhub_kernel::{
    AdministrativeInformation, Endpoint, ErrorKind, Identifier, LangString, Severity,
    ShellDescriptor, StorageKey, SubmodelDescriptor,
};
use shellhub_registry::{DescriptorStore, SUBMODEL_FOLDER};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "shellhub-registry-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const SHELL_ID: &str = "http://example.org/shells/press-01";

fn sample_shell() -> ShellDescriptor {
    let mut shell = ShellDescriptor::new("Press01", Identifier::iri(SHELL_ID))
        .with_endpoint(Endpoint::http("http://127.0.0.1:5080/press/aas"))
        .with_submodel(
            SubmodelDescriptor::new("Nameplate", Identifier::custom("sm-nameplate"))
                .with_endpoint(Endpoint::http(
                    "http://127.0.0.1:5080/press/aas/submodels/Nameplate/submodel",
                )),
        )
        .with_submodel(SubmodelDescriptor::new(
            "Documentation",
            Identifier::custom("sm-documentation"),
        ));
    shell.administration = Some(AdministrativeInformation {
        version: Some("1.0".to_string()),
        revision: Some("120".to_string()),
    });
    shell.description = vec![LangString {
        language: "en-US".to_string(),
        text: "Hydraulic press".to_string(),
    }];
    shell
}

fn canonical(mut shell: ShellDescriptor) -> ShellDescriptor {
    shell
        .submodel_descriptors
        .sort_by(|a, b| a.id_short.cmp(&b.id_short));
    shell
}

#[test]
fn create_then_retrieve_round_trips() {
    let dir = TempDirGuard::new("round-trip");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    let shell = sample_shell();

    let created = store.create_shell(shell.clone());
    assert!(created.success, "create failed: {:?}", created.message);
    let created = created.payload.expect("create returns the stored form");
    assert_eq!(created, canonical(shell.clone()));

    let read = store
        .retrieve_shell(SHELL_ID)
        .payload
        .expect("shell should be readable");
    assert_eq!(read, canonical(shell));
}

#[test]
fn shell_record_is_stored_without_submodels() {
    let dir = TempDirGuard::new("layout");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    let key = StorageKey::for_id(SHELL_ID);
    let container = dir.path().join(key.as_str());
    let record = container.join(format!("{key}.json"));
    let raw = fs::read_to_string(&record).expect("shell record should exist");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("record is json");
    assert!(json.get("submodelDescriptors").is_none());
    assert_eq!(json["idShort"], "Press01");

    assert!(container.join(SUBMODEL_FOLDER).join("Nameplate.json").is_file());
    assert!(
        container
            .join(SUBMODEL_FOLDER)
            .join("Documentation.json")
            .is_file()
    );
}

#[test]
fn create_shell_rejects_missing_short_name() {
    let dir = TempDirGuard::new("validation");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    let mut shell = sample_shell();
    shell.id_short.clear();

    let outcome = store.create_shell(shell);
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Validation));
    assert!(fs::read_dir(dir.path()).expect("root lists").next().is_none());
}

#[test]
fn create_submodel_requires_registered_shell() {
    let dir = TempDirGuard::new("ordering");
    let store = DescriptorStore::open(dir.path()).expect("store should open");

    let outcome = store.create_submodel(
        "urn:never-created",
        SubmodelDescriptor::new("Orphan", Identifier::custom("sm-orphan")),
    );
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::NotFound));
    assert!(
        outcome
            .message_text()
            .is_some_and(|m| m.contains("register the shell first"))
    );
}

#[test]
fn create_submodel_adds_to_existing_shell() {
    let dir = TempDirGuard::new("add-submodel");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    let extra = SubmodelDescriptor::new("Maintenance", Identifier::custom("sm-maint"));
    let created = store.create_submodel(SHELL_ID, extra.clone());
    assert_eq!(created.payload, Some(extra));

    let shell = store.retrieve_shell(SHELL_ID).payload.expect("shell reads");
    let names: Vec<_> = shell
        .submodel_descriptors
        .iter()
        .map(|s| s.id_short.as_str())
        .collect();
    assert_eq!(names, vec!["Documentation", "Maintenance", "Nameplate"]);
}

#[test]
fn delete_shell_is_idempotent() {
    let dir = TempDirGuard::new("delete");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    let first = store.delete_shell(SHELL_ID);
    assert!(first.success);
    assert!(first.message.is_none());
    assert!(!store.contains_shell(SHELL_ID));

    let second = store.delete_shell(SHELL_ID);
    assert!(second.success);
    let message = second.message.expect("second delete is informational");
    assert_eq!(message.severity, Severity::Information);

    let read = store.retrieve_shell(SHELL_ID);
    assert_eq!(read.error_kind(), Some(ErrorKind::NotFound));
}

#[test]
fn delete_submodel_removes_only_that_record() {
    let dir = TempDirGuard::new("delete-submodel");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    assert!(store.delete_submodel(SHELL_ID, "Nameplate").success);
    let again = store.delete_submodel(SHELL_ID, "Nameplate");
    assert!(again.success);
    assert!(again.message.is_some());

    let remaining = store
        .retrieve_submodels(SHELL_ID)
        .payload
        .expect("one submodel remains");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id_short, "Documentation");
}

#[test]
fn retrieve_shells_reports_not_found_when_empty() {
    let dir = TempDirGuard::new("empty");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    let outcome = store.retrieve_shells();
    assert_eq!(outcome.error_kind(), Some(ErrorKind::NotFound));
}

#[test]
fn retrieve_shells_skips_unreadable_records() {
    let dir = TempDirGuard::new("skip");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    let broken_key = StorageKey::for_id("urn:broken");
    let broken_dir = dir.path().join(broken_key.as_str());
    fs::create_dir_all(&broken_dir).expect("broken dir");
    fs::write(broken_dir.join(format!("{broken_key}.json")), b"{oops").expect("broken record");
    fs::create_dir_all(dir.path().join("not-a-shell")).expect("stray dir");

    let shells = store.retrieve_shells().payload.expect("one shell is readable");
    assert_eq!(shells.len(), 1);
    assert_eq!(shells[0].id(), SHELL_ID);

    let broken = store.retrieve_shell("urn:broken");
    assert_eq!(broken.error_kind(), Some(ErrorKind::Io));
}

#[test]
fn unreadable_submodel_records_are_skipped_on_shell_read() {
    let dir = TempDirGuard::new("skip-submodel");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    let submodels = dir
        .path()
        .join(StorageKey::for_id(SHELL_ID).as_str())
        .join(SUBMODEL_FOLDER);
    fs::write(submodels.join("Broken.json"), b"not json").expect("broken submodel");

    let shell = store.retrieve_shell(SHELL_ID).payload.expect("shell reads");
    assert_eq!(shell.submodel_descriptors.len(), 2);
}

#[test]
fn retrieve_submodel_distinguishes_missing_shell_and_submodel() {
    let dir = TempDirGuard::new("submodel-lookup");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    let found = store.retrieve_submodel(SHELL_ID, "Nameplate");
    assert_eq!(
        found.payload.map(|s| s.identification.id),
        Some("sm-nameplate".to_string())
    );

    let missing_submodel = store.retrieve_submodel(SHELL_ID, "Missing");
    assert_eq!(missing_submodel.error_kind(), Some(ErrorKind::NotFound));
    assert!(
        missing_submodel
            .message_text()
            .is_some_and(|m| m.contains("submodel `Missing`"))
    );

    let missing_shell = store.retrieve_submodels("urn:nope");
    assert_eq!(missing_shell.error_kind(), Some(ErrorKind::NotFound));

    let traversal = store.retrieve_submodel(SHELL_ID, "../escape");
    assert_eq!(traversal.error_kind(), Some(ErrorKind::Validation));
}

#[test]
fn update_shell_merges_and_persists_metadata() {
    let dir = TempDirGuard::new("update");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    assert!(store.create_shell(sample_shell()).success);

    let mut first = BTreeMap::new();
    first.insert("owner".to_string(), "plant-7".to_string());
    first.insert("line".to_string(), "A".to_string());
    let updated = store
        .update_shell(SHELL_ID, &first)
        .payload
        .expect("update returns the re-read shell");
    assert_eq!(updated.metadata.get("owner").map(String::as_str), Some("plant-7"));
    assert_eq!(updated.submodel_descriptors.len(), 2);

    let mut second = BTreeMap::new();
    second.insert("line".to_string(), String::new());
    assert!(store.update_shell(SHELL_ID, &second).success);

    let read = store.retrieve_shell(SHELL_ID).payload.expect("shell reads");
    assert_eq!(read.metadata.len(), 1);
    assert!(read.metadata.contains_key("owner"));

    let missing = store.update_shell("urn:nope", &first);
    assert_eq!(missing.error_kind(), Some(ErrorKind::NotFound));
    let empty = store.update_shell(SHELL_ID, &BTreeMap::new());
    assert_eq!(empty.error_kind(), Some(ErrorKind::Validation));
}

#[test]
fn concurrent_creates_for_one_shell_leave_a_readable_record() {
    let dir = TempDirGuard::new("concurrent");
    let store = Arc::new(DescriptorStore::open(dir.path()).expect("store should open"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut shell = sample_shell();
                shell.id_short = format!("Press{i}");
                store.create_shell(shell)
            })
        })
        .collect();
    for handle in handles {
        let outcome = handle.join().expect("writer should finish");
        assert!(outcome.success, "create failed: {:?}", outcome.message);
    }

    let read = store.retrieve_shell(SHELL_ID).payload.expect("record is intact");
    assert!(read.id_short.starts_with("Press"));
    assert_eq!(read.submodel_descriptors.len(), 2);
}

#[test]
fn failed_submodel_write_keeps_earlier_records_and_skips_the_rest() {
    let dir = TempDirGuard::new("partial");
    let store = DescriptorStore::open(dir.path()).expect("store should open");
    let key = StorageKey::for_id(SHELL_ID);
    let container = dir.path().join(key.as_str());
    let submodels = container.join(SUBMODEL_FOLDER);
    // A directory where the record should go makes the rename fail.
    fs::create_dir_all(submodels.join("B.json")).expect("blocking dir should be created");

    let shell = ShellDescriptor::new("Press01", Identifier::iri(SHELL_ID))
        .with_submodel(SubmodelDescriptor::new("A", Identifier::custom("sm-a")))
        .with_submodel(SubmodelDescriptor::new("B", Identifier::custom("sm-b")))
        .with_submodel(SubmodelDescriptor::new("C", Identifier::custom("sm-c")));

    let outcome = store.create_shell(shell);
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Io));
    assert!(submodels.join("A.json").is_file());
    assert!(!submodels.join("C.json").exists());
    assert!(!container.join(format!("{key}.json")).exists());
    assert!(!store.contains_shell(SHELL_ID));
}
