use clap::{Parser, Subcommand};

use tg_domain::config::{ConfigSeverity, OrchestratorConfig};

#[derive(Debug, Parser)]
#[command(name = "tool-gateway-orchestrator", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the orchestrator (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Read environment variables and report any validation issues.
    Validate,
    /// Dump the resolved configuration (with defaults) to stdout.
    Show,
}

/// Parse and validate the config, printing any issues.
/// Returns `true` when there are no `Error`-severity issues.
pub fn validate(config: &OrchestratorConfig) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s)");
    error_count == 0
}

pub fn show(config: &OrchestratorConfig) {
    println!("{config:#?}");
}
