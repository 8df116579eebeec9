//! Helpers shared by the presentation modules.

use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub(super) fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    table
}

pub(super) fn cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

pub(super) fn time(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub(super) fn optional_time(value: Option<&DateTime<Utc>>) -> String {
    value.map(time).unwrap_or_else(|| "-".to_string())
}
