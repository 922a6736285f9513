pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "hookline",
    about = "Hookline operator CLI",
    long_about = "Inspect hookline configuration and check interaction endpoint readiness.",
    after_help = "Examples:\n  hookline doctor --json\n  hookline config\n  hookline --config-file config/hookline.toml doctor"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file")]
    config_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, public key readiness, and the command registry")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_file = cli.config_file.as_deref();

    let result = match cli.command {
        Command::Config => commands::config::run(config_file),
        Command::Doctor { json } => commands::doctor::run(config_file, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
