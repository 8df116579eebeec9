//! Result shapes returned by the facade.

use crate::engine::{HistoricActivity, ProcessInstance, TaskInstance};
use crate::variables::Variables;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a [`TaskRecord`] row stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Task,
    ProcessInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Unfinished,
    Finished,
}

impl RecordStatus {
    fn from_end_time(end_time: Option<DateTime<Utc>>) -> Self {
        match end_time {
            Some(_) => RecordStatus::Finished,
            None => RecordStatus::Unfinished,
        }
    }
}

/// One query result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub kind: RecordKind,
    /// Task id, or the instance id for process-instance rows
    pub id: String,
    pub name: Option<String>,
    pub task_definition_key: Option<String>,
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub assignee: Option<String>,
    pub started_by: Option<String>,
    /// Task create time, or instance start time
    pub create_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
}

impl From<TaskInstance> for TaskRecord {
    fn from(task: TaskInstance) -> Self {
        TaskRecord {
            kind: RecordKind::Task,
            status: RecordStatus::from_end_time(task.end_time),
            id: task.id,
            name: task.name,
            task_definition_key: Some(task.task_definition_key),
            process_instance_id: task.process_instance_id,
            process_definition_id: task.process_definition_id,
            assignee: task.assignee,
            started_by: None,
            create_time: task.create_time,
            end_time: task.end_time,
            variables: None,
        }
    }
}

impl From<ProcessInstance> for TaskRecord {
    fn from(instance: ProcessInstance) -> Self {
        TaskRecord {
            kind: RecordKind::ProcessInstance,
            status: RecordStatus::from_end_time(instance.end_time),
            process_instance_id: instance.id.clone(),
            id: instance.id,
            name: instance.process_definition_name,
            task_definition_key: None,
            process_definition_id: instance.process_definition_id,
            assignee: None,
            started_by: instance.started_by,
            create_time: instance.start_time,
            end_time: instance.end_time,
            variables: None,
        }
    }
}

/// Reference to a freshly started process instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInstanceRef {
    pub id: String,
    pub process_definition_id: String,
    pub process_definition_key: String,
    pub ended: bool,
}

impl From<ProcessInstance> for ProcessInstanceRef {
    fn from(instance: ProcessInstance) -> Self {
        ProcessInstanceRef {
            ended: instance.end_time.is_some(),
            id: instance.id,
            process_definition_id: instance.process_definition_id,
            process_definition_key: instance.process_definition_key,
        }
    }
}

/// One node of an instance's activity history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessNode {
    pub id: String,
    pub activity_id: String,
    pub activity_name: Option<String>,
    pub activity_type: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub task_id: Option<String>,
    pub assignee: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_start_event: bool,
    pub form_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
}

impl From<HistoricActivity> for ProcessNode {
    fn from(activity: HistoricActivity) -> Self {
        ProcessNode {
            id: activity.id,
            activity_id: activity.activity_id,
            activity_name: activity.activity_name,
            activity_type: activity.activity_type,
            process_instance_id: activity.process_instance_id,
            process_definition_id: activity.process_definition_id,
            task_id: activity.task_id,
            assignee: activity.assignee,
            start_time: activity.start_time,
            end_time: activity.end_time,
            is_start_event: false,
            form_key: None,
            variables: None,
        }
    }
}

/// Read options for single-task and history lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub with_variables: bool,
    /// Let a node's task-scope variables override process-scope ones
    #[serde(default)]
    pub replace_local_variables: bool,
}

impl Options {
    pub fn with_variables() -> Self {
        Options {
            with_variables: true,
            replace_local_variables: false,
        }
    }
}
