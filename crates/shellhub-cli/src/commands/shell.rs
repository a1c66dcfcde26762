use crate::cli::ShellCommands;
use crate::support;
use shellhub_kernel::{Outcome, Settings, ShellDescriptor, ShellhubError};
use std::collections::BTreeMap;

pub fn run(settings: &Settings, command: ShellCommands) {
    let store = support::open_store_or_exit(settings);
    match command {
        ShellCommands::Register { file, json } => {
            let descriptor: ShellDescriptor = support::read_json_file_or_exit(&file);
            let outcome = store.create_shell(descriptor);
            support::emit("shell register", &outcome, json, describe_shell);
        }
        ShellCommands::Get { id, json } => {
            let outcome = store.retrieve_shell(&id);
            support::emit("shell get", &outcome, json, describe_shell);
        }
        ShellCommands::List { json } => {
            let outcome = store.retrieve_shells();
            support::emit("shell list", &outcome, json, |shells| {
                let mut lines = vec![format!("Shells: {}", shells.len())];
                lines.extend(shells.iter().map(|shell| {
                    format!(
                        "- {} ({}, {} submodels)",
                        shell.id_short,
                        shell.id(),
                        shell.submodel_descriptors.len()
                    )
                }));
                lines
            });
        }
        ShellCommands::Delete { id, json } => {
            let outcome = store.delete_shell(&id);
            support::emit("shell delete", &outcome, json, |_| Vec::new());
        }
        ShellCommands::Update { id, set, json } => {
            let outcome = match parse_assignments(&set) {
                Ok(metadata) => store.update_shell(&id, &metadata),
                Err(err) => Outcome::failure(err),
            };
            support::emit("shell update", &outcome, json, describe_shell);
        }
    }
}

fn describe_shell(shell: &ShellDescriptor) -> Vec<String> {
    let mut lines = vec![
        format!("IdShort: {}", shell.id_short),
        format!("Id: {} ({})", shell.id(), shell.identification.id_type.as_str()),
    ];
    for endpoint in &shell.endpoints {
        lines.push(format!("Endpoint: {}", endpoint.address));
    }
    for (key, value) in &shell.metadata {
        lines.push(format!("Metadata: {key}={value}"));
    }
    lines.push(format!("Submodels: {}", shell.submodel_descriptors.len()));
    lines.extend(
        shell
            .submodel_descriptors
            .iter()
            .map(|submodel| format!("- {} ({})", submodel.id_short, submodel.identification.id)),
    );
    lines
}

/// Parse repeated `KEY=VALUE` arguments. `KEY=` clears the key.
fn parse_assignments(raw: &[String]) -> Result<BTreeMap<String, String>, ShellhubError> {
    let mut metadata = BTreeMap::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(ShellhubError::validation(format!(
                "expected KEY=VALUE, got `{entry}`"
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ShellhubError::validation(format!(
                "empty key in `{entry}`"
            )));
        }
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}
