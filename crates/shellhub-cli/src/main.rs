//! Shellhub CLI: the `shellhub` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let settings =
        support::load_settings_or_exit(cli.config.as_deref(), cli.registry, cli.log_level);
    support::init_logging(&settings.logging.level);

    match cli.command {
        Commands::Shell { command } => commands::shell::run(&settings, command),

        Commands::Submodel { command } => commands::submodel::run(&settings, command),

        Commands::Route { path, json } => commands::route::run(&settings, path, json),

        Commands::Request {
            path,
            method,
            body,
            shells,
            json,
        } => commands::request::run(
            &settings,
            commands::request::Args {
                path,
                method,
                body,
                shells,
                json,
            },
        ),

        Commands::Publish {
            base_urls,
            shells,
            json,
        } => commands::publish::run(&settings, base_urls, shells, json),
    }
}
