//! Definition and form presentation.

use super::shared::{cell, format_section_heading, table};
use crate::engine::ProcessDefinition;
use crate::form::FormDefinition;

pub fn format_definitions_text(definitions: &[ProcessDefinition]) -> String {
    if definitions.is_empty() {
        return "No process definitions deployed.".to_string();
    }
    let mut table = table(vec!["Key", "Version", "Id", "Name", "Start form"]);
    for definition in definitions {
        table.add_row(vec![
            definition.key.clone(),
            definition.version.to_string(),
            definition.id.clone(),
            cell(definition.name.as_deref()),
            cell(definition.start_form_key.as_deref()),
        ]);
    }
    format!(
        "{}\n\n{}\n\nTotal: {} definition(s)",
        format_section_heading("Process definitions"),
        table,
        definitions.len()
    )
}

pub fn format_form_key_text(form_key: Option<&str>) -> String {
    form_key.unwrap_or("(no form)").to_string()
}

pub fn format_form_text(form_key: &str, form: Option<&FormDefinition>) -> String {
    let Some(form) = form else {
        return format!("No form registered for key '{}'.", form_key);
    };
    let mut out = format!("{}\n", format_section_heading(&format!("Form {}", form.key)));
    if let Some(title) = &form.title {
        out.push_str(&format!("Title: {}\n", title));
    }
    if form.fields.is_empty() {
        out.push_str("No fields.");
        return out;
    }
    let mut table = table(vec!["Field", "Label", "Required"]);
    for field in &form.fields {
        table.add_row(vec![
            field.name.clone(),
            cell(field.label.as_deref()),
            if field.required { "yes" } else { "no" }.to_string(),
        ]);
    }
    out.push_str(&format!("\n{}", table));
    out
}
