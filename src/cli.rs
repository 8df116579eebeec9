//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the flow service.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, is_mutating};
pub use output::{into_payload, map_error, CommandFailure};
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_definitions_text, format_form_key_text, format_form_text, format_history_text,
    format_section_heading, format_task_records_text, format_task_text, render_json,
};
pub use route::{parse_assignments, RunContext};
