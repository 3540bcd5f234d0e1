//! CLI command-name contract for reporter namespaces and logging.

use crate::cli::parse::Commands;

/// Command name string (e.g. "doctor", "ensure").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Doctor { .. } => "doctor",
        Commands::Ensure { .. } => "ensure",
        Commands::List { .. } => "list",
        Commands::Config => "config",
    }
}
