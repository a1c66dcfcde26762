use serde::Serialize;
use serde::de::DeserializeOwned;
use shellhub_kernel::{Outcome, Settings};
use shellhub_registry::DescriptorStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Settings file, then command-line overrides.
pub fn load_settings_or_exit(
    config: Option<&Path>,
    registry: Option<PathBuf>,
    log_level: Option<String>,
) -> Settings {
    let mut settings = Settings::load_or_default(config).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });
    if let Some(folder) = registry {
        settings.registry.folder_path = folder;
    }
    if let Some(level) = log_level {
        settings.logging.level = level;
    }
    settings.validate().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });
    settings
}

/// Install the stderr subscriber. Libraries only emit events.
pub fn init_logging(level: &str) {
    let level: tracing::Level = level.parse().unwrap_or_else(|_| {
        eprintln!("error: invalid log level `{level}` (use error, warn, info, debug, trace)");
        process::exit(1);
    });
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn open_store_or_exit(settings: &Settings) -> DescriptorStore {
    DescriptorStore::from_settings(&settings.registry).unwrap_or_else(|e| {
        eprintln!(
            "error: failed to open registry {}: {e}",
            settings.registry.folder_path.display()
        );
        process::exit(1);
    })
}

pub fn read_json_file_or_exit<T: DeserializeOwned>(path: &Path) -> T {
    let raw = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        process::exit(1);
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {}: {e}", path.display());
        process::exit(1);
    })
}

pub fn new_runtime_or_exit() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        })
}

/// Print `outcome` and exit with status 1 when it failed.
///
/// Text mode prints `shellhub <action>` followed by the rendered payload
/// lines; JSON mode prints the whole outcome.
pub fn emit<T: Serialize>(
    action: &str,
    outcome: &Outcome<T>,
    json_output: bool,
    render: impl FnOnce(&T) -> Vec<String>,
) {
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).expect("json serialization")
        );
    } else if outcome.success {
        println!("shellhub {action}");
        if let Some(payload) = &outcome.payload {
            for line in render(payload) {
                println!("  {line}");
            }
        }
        if let Some(message) = &outcome.message {
            println!("  {message}");
        }
    } else {
        let text = outcome.message_text().unwrap_or("operation failed");
        eprintln!("error: shellhub {action}: {text}");
    }

    if !outcome.success {
        process::exit(1);
    }
}
