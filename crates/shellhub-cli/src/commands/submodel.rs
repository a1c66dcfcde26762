use crate::cli::SubmodelCommands;
use crate::support;
use shellhub_kernel::{Settings, SubmodelDescriptor};

pub fn run(settings: &Settings, command: SubmodelCommands) {
    let store = support::open_store_or_exit(settings);
    match command {
        SubmodelCommands::Register {
            shell_id,
            file,
            json,
        } => {
            let descriptor: SubmodelDescriptor = support::read_json_file_or_exit(&file);
            let outcome = store.create_submodel(&shell_id, descriptor);
            support::emit("submodel register", &outcome, json, describe_submodel);
        }
        SubmodelCommands::Get {
            shell_id,
            submodel_id,
            json,
        } => {
            let outcome = store.retrieve_submodel(&shell_id, &submodel_id);
            support::emit("submodel get", &outcome, json, describe_submodel);
        }
        SubmodelCommands::List { shell_id, json } => {
            let outcome = store.retrieve_submodels(&shell_id);
            support::emit("submodel list", &outcome, json, |submodels| {
                let mut lines = vec![format!("Submodels: {}", submodels.len())];
                lines.extend(
                    submodels
                        .iter()
                        .map(|s| format!("- {} ({})", s.id_short, s.identification.id)),
                );
                lines
            });
        }
        SubmodelCommands::Delete {
            shell_id,
            submodel_id,
            json,
        } => {
            let outcome = store.delete_submodel(&shell_id, &submodel_id);
            support::emit("submodel delete", &outcome, json, |_| Vec::new());
        }
    }
}

fn describe_submodel(submodel: &SubmodelDescriptor) -> Vec<String> {
    let mut lines = vec![
        format!("IdShort: {}", submodel.id_short),
        format!(
            "Id: {} ({})",
            submodel.identification.id,
            submodel.identification.id_type.as_str()
        ),
    ];
    lines.extend(
        submodel
            .endpoints
            .iter()
            .map(|endpoint| format!("Endpoint: {}", endpoint.address)),
    );
    lines
}
