//! CLI presentation: text and json formatters per command family.

mod definitions;
mod records;
mod shared;

pub use definitions::{format_definitions_text, format_form_key_text, format_form_text};
pub use records::{format_history_text, format_task_records_text, format_task_text};
pub use shared::{format_section_heading, render_json};
