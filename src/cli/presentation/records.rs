//! Task, query and history presentation.

use super::shared::{cell, format_section_heading, optional_time, table, time};
use crate::model::{ProcessNode, RecordKind, RecordStatus, TaskRecord};
use crate::variables::Variables;

fn status(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Unfinished => "unfinished",
        RecordStatus::Finished => "finished",
    }
}

fn variables_table(variables: &Variables) -> String {
    let mut table = table(vec!["Variable", "Value"]);
    for (name, value) in variables {
        table.add_row(vec![name.clone(), value.to_string()]);
    }
    table.to_string()
}

pub fn format_task_records_text(rows: &[TaskRecord], total: Option<u64>) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        out.push_str("No matching records.");
    } else {
        let mut table = table(vec![
            "Id", "Kind", "Name", "Instance", "Assignee", "Started by", "Created", "Ended",
            "Status",
        ]);
        for row in rows {
            let kind = match row.kind {
                RecordKind::Task => "task",
                RecordKind::ProcessInstance => "process",
            };
            table.add_row(vec![
                row.id.clone(),
                kind.to_string(),
                cell(row.name.as_deref()),
                row.process_instance_id.clone(),
                cell(row.assignee.as_deref()),
                cell(row.started_by.as_deref()),
                time(&row.create_time),
                optional_time(row.end_time.as_ref()),
                status(row.status).to_string(),
            ]);
        }
        out.push_str(&table.to_string());
    }
    if let Some(total) = total {
        out.push_str(&format!("\n\nTotal: {}", total));
    }
    out
}

pub fn format_task_text(task_id: &str, task: Option<&TaskRecord>) -> String {
    let Some(task) = task else {
        return format!("No pending task with id '{}'.", task_id);
    };
    let mut out = format!("{}\n", format_section_heading(&format!("Task {}", task.id)));
    out.push_str(&format!("Name: {}\n", cell(task.name.as_deref())));
    out.push_str(&format!(
        "Activity: {}\n",
        cell(task.task_definition_key.as_deref())
    ));
    out.push_str(&format!("Process instance: {}\n", task.process_instance_id));
    out.push_str(&format!("Definition: {}\n", task.process_definition_id));
    out.push_str(&format!("Assignee: {}\n", cell(task.assignee.as_deref())));
    out.push_str(&format!("Created: {}", time(&task.create_time)));
    if let Some(variables) = &task.variables {
        out.push_str(&format!("\n\n{}", variables_table(variables)));
    }
    out
}

pub fn format_history_text(process_instance_id: &str, nodes: &[ProcessNode]) -> String {
    if nodes.is_empty() {
        return format!("No history for process instance '{}'.", process_instance_id);
    }
    let mut table = table(vec![
        "#", "Activity", "Type", "Name", "Assignee", "Started", "Ended", "Form",
    ]);
    for (position, node) in nodes.iter().enumerate() {
        let activity_type = if node.is_start_event {
            format!("{} (start)", node.activity_type)
        } else {
            node.activity_type.clone()
        };
        table.add_row(vec![
            (position + 1).to_string(),
            node.activity_id.clone(),
            activity_type,
            cell(node.activity_name.as_deref()),
            cell(node.assignee.as_deref()),
            time(&node.start_time),
            optional_time(node.end_time.as_ref()),
            cell(node.form_key.as_deref()),
        ]);
    }
    format!(
        "{}\n\n{}",
        format_section_heading(&format!("History of {}", process_instance_id)),
        table
    )
}
