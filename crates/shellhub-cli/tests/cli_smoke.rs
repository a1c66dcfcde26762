use serde_json::Value;
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
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
            "shellhub-cli-{prefix}-{}-{unique}",
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

fn run_shellhub<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_shellhub");
    Command::new(bin)
        .args(args)
        .output()
        .expect("shellhub command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn registry_arg(tmp: &TempDirGuard) -> String {
    tmp.path().join("registry").display().to_string()
}

fn write_shell_descriptor(path: &Path) {
    let payload = serde_json::json!({
        "identification": {"id": "urn:plant:7:press:1", "idType": "IRI"},
        "idShort": "Press1",
        "endpoints": [{"address": "http://press1.local/aas", "type": "http"}],
        "submodelDescriptors": [
            {
                "identification": {"id": "urn:plant:7:press:1:status", "idType": "IRI"},
                "idShort": "Status"
            }
        ]
    });
    fs::write(
        path,
        serde_json::to_string_pretty(&payload).expect("fixture should serialize"),
    )
    .expect("shell descriptor should be written");
}

fn write_submodel_descriptor(path: &Path) {
    let payload = serde_json::json!({
        "identification": {"id": "urn:plant:7:orphan:status", "idType": "IRI"},
        "idShort": "Status"
    });
    fs::write(
        path,
        serde_json::to_string_pretty(&payload).expect("fixture should serialize"),
    )
    .expect("submodel descriptor should be written");
}

#[test]
fn shell_lifecycle_register_get_update_delete() {
    let tmp = TempDirGuard::new("shell-lifecycle");
    let registry = registry_arg(&tmp);
    let descriptor = tmp.path().join("press1.json");
    write_shell_descriptor(&descriptor);
    let descriptor = descriptor.display().to_string();

    let registered = run_shellhub([
        "shell",
        "register",
        "--file",
        descriptor.as_str(),
        "--registry",
        registry.as_str(),
    ]);
    assert_success(&registered);
    assert!(stdout_text(&registered).contains("IdShort: Press1"));

    let fetched = run_shellhub([
        "shell",
        "get",
        "urn:plant:7:press:1",
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&fetched);
    let fetched = parse_json_stdout(&fetched);
    assert_eq!(fetched["success"], true);
    assert_eq!(fetched["payload"]["idShort"], "Press1");
    assert_eq!(
        fetched["payload"]["submodelDescriptors"][0]["idShort"],
        "Status"
    );

    let listed = run_shellhub(["shell", "list", "--registry", registry.as_str()]);
    assert_success(&listed);
    let listed = stdout_text(&listed);
    assert!(listed.contains("Shells: 1"));
    assert!(listed.contains("- Press1 (urn:plant:7:press:1, 1 submodels)"));

    let updated = run_shellhub([
        "shell",
        "update",
        "urn:plant:7:press:1",
        "--set",
        "owner=line-3",
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&updated);
    let updated = parse_json_stdout(&updated);
    assert_eq!(updated["payload"]["metadata"]["owner"], "line-3");

    let deleted = run_shellhub([
        "shell",
        "delete",
        "urn:plant:7:press:1",
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&deleted);
    assert_eq!(parse_json_stdout(&deleted)["success"], true);

    let deleted_again = run_shellhub([
        "shell",
        "delete",
        "urn:plant:7:press:1",
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&deleted_again);
    let deleted_again = parse_json_stdout(&deleted_again);
    assert_eq!(deleted_again["message"]["severity"], "information");

    let missing = run_shellhub([
        "shell",
        "get",
        "urn:plant:7:press:1",
        "--registry",
        registry.as_str(),
    ]);
    assert_failure(&missing);
    assert!(stderr_text(&missing).contains("error: shellhub shell get"));
}

#[test]
fn submodel_register_requires_an_existing_shell() {
    let tmp = TempDirGuard::new("submodel-orphan");
    let registry = registry_arg(&tmp);
    let descriptor = tmp.path().join("status.json");
    write_submodel_descriptor(&descriptor);
    let descriptor = descriptor.display().to_string();

    let output = run_shellhub([
        "submodel",
        "register",
        "urn:plant:7:orphan",
        "--file",
        descriptor.as_str(),
        "--registry",
        registry.as_str(),
    ]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("register the shell first"));
}

#[test]
fn route_json_reports_context_and_rewritten_path() {
    let tmp = TempDirGuard::new("route");
    let registry = registry_arg(&tmp);
    let output = run_shellhub([
        "route",
        "/t/shellA/aas/submodels/sm1/values/x",
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["payload"]["route"], "element");
    assert_eq!(payload["payload"]["context"]["shellId"], "shellA");
    assert_eq!(payload["payload"]["context"]["submodelId"], "sm1");
    assert_eq!(payload["payload"]["rewrittenPath"], "/values/x");
}

#[test]
fn request_reads_a_sample_property() {
    let tmp = TempDirGuard::new("request-read");
    let registry = registry_arg(&tmp);
    let output = run_shellhub([
        "request",
        "/shells/MultiAAS_2/aas/submodels/TestSubmodel/submodel/submodelElements/Property_2/value",
        "--shells",
        "3",
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["payload"], serde_json::json!(4.0));
}

#[test]
fn request_invokes_calculate_with_a_body() {
    let tmp = TempDirGuard::new("request-invoke");
    let registry = registry_arg(&tmp);
    let output = run_shellhub([
        "request",
        "/shells/TestAAS/aas/submodels/TestSubmodel/submodel/submodelElements/Calculate/invoke",
        "--method",
        "post",
        "--body",
        r#"{"inputArguments":{"Expression":"6*7"}}"#,
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["payload"]["executionState"], "completed");
    assert_eq!(
        payload["payload"]["outputArguments"]["Result"],
        serde_json::json!(42.0)
    );

    let malformed = run_shellhub([
        "request",
        "/shells/TestAAS/aas/submodels/TestSubmodel/submodel/submodelElements/Calculate/invoke",
        "--method",
        "post",
        "--body",
        "{not json",
        "--registry",
        registry.as_str(),
    ]);
    assert_failure(&malformed);
    assert!(stderr_text(&malformed).contains("malformed --body"));
}

#[test]
fn publish_writes_every_hosted_shell() {
    let tmp = TempDirGuard::new("publish");
    let registry = registry_arg(&tmp);
    let output = run_shellhub([
        "publish",
        "--shells",
        "2",
        "--base-url",
        "http://hub.local:5080",
        "--registry",
        registry.as_str(),
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    let published = payload["payload"].as_array().expect("published shells");
    assert_eq!(published.len(), 3);

    let hash = Sha256::digest("urn:shellhub:shells:MultiAAS_0:1.0.0".as_bytes());
    let container = tmp.path().join("registry").join(format!("{hash:x}"));
    assert!(
        container.is_dir(),
        "expected container {}",
        container.display()
    );

    let listed = run_shellhub(["shell", "list", "--registry", registry.as_str()]);
    assert_success(&listed);
    let listed = stdout_text(&listed);
    assert!(listed.contains("Shells: 3"));
    assert!(listed.contains("MultiAAS_1"));
    assert!(listed.contains("TestAAS"));
}

#[test]
fn invalid_settings_and_log_levels_exit_nonzero() {
    let tmp = TempDirGuard::new("settings");
    let registry = registry_arg(&tmp);
    let config = tmp.path().join("shellhub.toml");
    fs::write(&config, "registry = [not toml").expect("config should be written");
    let config = config.display().to_string();

    let bad_config = run_shellhub(["--config", config.as_str(), "shell", "list"]);
    assert_failure(&bad_config);

    let bad_level = run_shellhub([
        "--log-level",
        "loud",
        "--registry",
        registry.as_str(),
        "shell",
        "list",
    ]);
    assert_failure(&bad_level);
}
