use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5080";
pub const DEFAULT_SAMPLE_SHELLS: usize = 10;

#[derive(Parser)]
#[command(
    name = "shellhub",
    about = "Shellhub: file-based shell registry, tenant routing, and live submodel providers",
    version
)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Registry folder; overrides `registry.folder_path`
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides `logging.level`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage shell descriptors in the registry
    Shell {
        #[command(subcommand)]
        command: ShellCommands,
    },

    /// Manage submodel descriptors of a registered shell
    Submodel {
        #[command(subcommand)]
        command: SubmodelCommands,
    },

    /// Show how a multi-tenant path is rewritten
    Route {
        /// Request path, optionally with `?query`
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dispatch a request against the in-process sample repository
    Request {
        /// Request path, optionally with `?query`
        path: String,

        /// HTTP-style method
        #[arg(long, value_enum, default_value = "get")]
        method: MethodArg,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Number of `MultiAAS_<i>` sample shells to host
        #[arg(long, default_value_t = DEFAULT_SAMPLE_SHELLS)]
        shells: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register the sample repository's descriptors in the registry
    Publish {
        /// Base address of the hosting server (repeatable)
        #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
        base_urls: Vec<String>,

        /// Number of `MultiAAS_<i>` sample shells to publish
        #[arg(long, default_value_t = DEFAULT_SAMPLE_SHELLS)]
        shells: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum ShellCommands {
    /// Create or replace a shell descriptor from a JSON file
    Register {
        /// Path to the shell descriptor JSON
        #[arg(long)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one shell with its submodels
    Get {
        /// Shell identifier
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every readable shell
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a shell and its submodels (idempotent)
    Delete {
        /// Shell identifier
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge metadata into a shell; an empty value removes the key
    Update {
        /// Shell identifier
        id: String,

        /// Metadata entry `KEY=VALUE` (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        set: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SubmodelCommands {
    /// Create or replace a submodel descriptor from a JSON file
    Register {
        /// Owning shell identifier
        shell_id: String,

        /// Path to the submodel descriptor JSON
        #[arg(long)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one submodel
    Get {
        /// Owning shell identifier
        shell_id: String,

        /// Submodel idShort
        submodel_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the submodels of a shell
    List {
        /// Owning shell identifier
        shell_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete one submodel (idempotent)
    Delete {
        /// Owning shell identifier
        shell_id: String,

        /// Submodel idShort
        submodel_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MethodArg {
    #[value(name = "get")]
    Get,
    #[value(name = "put")]
    Put,
    #[value(name = "post")]
    Post,
    #[value(name = "delete")]
    Delete,
}
