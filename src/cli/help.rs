//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string used in log fields (e.g. "query", "start_form_key").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Deploy { .. } => "deploy",
        Commands::Definitions { .. } => "definitions",
        Commands::Task { .. } => "task",
        Commands::Query { .. } => "query",
        Commands::Submit { .. } => "submit",
        Commands::Complete { .. } => "complete",
        Commands::History { .. } => "history",
        Commands::StartFormKey { .. } => "start_form_key",
        Commands::FormKey { .. } => "form_key",
        Commands::Form { .. } => "form",
    }
}

/// Whether the command changes engine state and needs the snapshot written back.
pub fn is_mutating(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Deploy { .. } | Commands::Submit { .. } | Commands::Complete { .. }
    )
}
