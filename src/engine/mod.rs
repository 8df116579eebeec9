//! Process engine boundary.
//!
//! The facade never owns process state. It reads and drives an engine through
//! the narrow traits below; [`memory::MemoryEngine`] is the in-process
//! implementation used by the CLI and the test suites.

pub mod memory;

pub use memory::MemoryEngine;

use crate::error::EngineError;
use crate::variables::Variables;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Activity type recorded for the first node of every instance.
pub const ACTIVITY_START_EVENT: &str = "startEvent";
/// Activity type of human tasks; only these (and the start node) carry forms.
pub const ACTIVITY_USER_TASK: &str = "userTask";
/// Activity type recorded when an instance runs out of activities.
pub const ACTIVITY_END_EVENT: &str = "endEvent";

/// A deployed, versioned process definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    /// Versioned id, `{key}:{version}:{deployment}`
    pub id: String,
    pub key: String,
    pub name: Option<String>,
    pub version: u32,
    pub start_form_key: Option<String>,
}

/// Deployable process model: a key plus its ordered user-task activities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessModel {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_form_key: Option<String>,
    #[serde(default)]
    pub activities: Vec<ActivityModel>,
}

/// One user-task activity of a [`ProcessModel`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub form_key: Option<String>,
    /// Users allowed to claim the task when it has no assignee
    #[serde(default)]
    pub candidates: Vec<String>,
}

/// A task, pending (`end_time == None`) or historic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub id: String,
    pub name: Option<String>,
    /// Activity id inside the process definition
    pub task_definition_key: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub assignee: Option<String>,
    #[serde(default)]
    pub candidates: Vec<String>,
    pub create_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// A process instance, running (`end_time == None`) or finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInstance {
    pub id: String,
    pub process_definition_id: String,
    pub process_definition_key: String,
    pub process_definition_name: Option<String>,
    pub started_by: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// One recorded variable value. `task_id == None` marks process scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricVariable {
    pub process_instance_id: String,
    pub task_id: Option<String>,
    pub name: String,
    pub value: Value,
}

/// One executed activity of a process instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricActivity {
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
}

/// Actor restriction of an engine query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorFilter {
    /// Assigned to the user, or unassigned with the user as a candidate
    CandidateOrAssigned(String),
    /// Process instances started by the user
    StartedBy(String),
    /// Tasks assigned to the user
    Assignee(String),
}

/// Finished/unfinished narrowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Completion {
    #[default]
    Any,
    Unfinished,
    Finished,
}

impl Completion {
    pub fn accepts(self, end_time: Option<DateTime<Utc>>) -> bool {
        match self {
            Completion::Any => true,
            Completion::Unfinished => end_time.is_none(),
            Completion::Finished => end_time.is_some(),
        }
    }
}

/// Predicate on a named process-scope variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariablePredicate {
    Equals { name: String, value: Value },
    NotEquals { name: String, value: Value },
    /// SQL-style pattern (`%`, `_`); a pattern without wildcards matches as a substring
    Like { name: String, pattern: String },
}

impl VariablePredicate {
    pub fn matches(&self, variables: &Variables) -> bool {
        match self {
            VariablePredicate::Equals { name, value } => variables.get(name) == Some(value),
            VariablePredicate::NotEquals { name, value } => {
                matches!(variables.get(name), Some(v) if v != value)
            }
            VariablePredicate::Like { name, pattern } => match variables.get(name) {
                Some(Value::String(s)) => like(s, pattern),
                _ => false,
            },
        }
    }
}

fn like(value: &str, pattern: &str) -> bool {
    if !pattern.contains(['%', '_']) {
        return value.contains(pattern);
    }
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    wildcard(&value, &pattern)
}

/// Greedy matcher: on a mismatch, retry from the last `%` with one more char consumed.
fn wildcard(value: &[char], pattern: &[char]) -> bool {
    let (mut v, mut p) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;
    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                resume = Some((p, v));
                p += 1;
            }
            Some('_') => {
                v += 1;
                p += 1;
            }
            Some(c) if *c == value[v] => {
                v += 1;
                p += 1;
            }
            _ => match resume {
                Some((star, from)) => {
                    p = star + 1;
                    v = from + 1;
                    resume = Some((star, from + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

/// Time field an engine query sorts on, always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    TaskCreateTime,
    InstanceStartTime,
}

/// Filter predicate shared by `count` and `list_page` calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineQuery {
    pub process_definition_key: Option<String>,
    pub actor: Option<ActorFilter>,
    pub completion: Completion,
    pub predicates: Vec<VariablePredicate>,
    pub sort: SortKey,
}

impl EngineQuery {
    pub fn new(sort: SortKey) -> Self {
        Self {
            process_definition_key: None,
            actor: None,
            completion: Completion::Any,
            predicates: Vec::new(),
            sort,
        }
    }

    /// True when every variable predicate holds on `variables`.
    pub fn matches_variables(&self, variables: &Variables) -> bool {
        self.predicates.iter().all(|p| p.matches(variables))
    }
}

/// Zero-based offset window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// Live task queries and task commands
pub trait PendingTasks {
    fn find_task(&self, task_id: &str) -> Result<Option<TaskInstance>, EngineError>;
    fn count_tasks(&self, query: &EngineQuery) -> Result<u64, EngineError>;
    fn list_tasks(&self, query: &EngineQuery, page: Page) -> Result<Vec<TaskInstance>, EngineError>;
    /// Process-scope variables overlaid with the task's local variables
    fn task_variables(&self, task_id: &str) -> Result<Variables, EngineError>;
    fn set_task_local_variables(
        &self,
        task_id: &str,
        variables: &Variables,
    ) -> Result<(), EngineError>;
    fn complete_task(&self, task_id: &str, variables: &Variables) -> Result<(), EngineError>;
}

/// Historic queries
pub trait History {
    fn count_historic_tasks(&self, query: &EngineQuery) -> Result<u64, EngineError>;
    fn list_historic_tasks(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<TaskInstance>, EngineError>;
    fn count_historic_instances(&self, query: &EngineQuery) -> Result<u64, EngineError>;
    fn list_historic_instances(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<ProcessInstance>, EngineError>;
    /// Every variable record of the instance, in recording order
    fn historic_variables(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<HistoricVariable>, EngineError>;
    /// Every executed activity of the instance, in execution order
    fn historic_activities(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<HistoricActivity>, EngineError>;
}

/// Process start
pub trait Runtime {
    /// Start the latest definition of `key`; `actor_id` is stamped as the starter.
    fn start_process_by_key(
        &self,
        key: &str,
        actor_id: &str,
        variables: &Variables,
    ) -> Result<ProcessInstance, EngineError>;
}

/// Deployed definitions and their forms
pub trait Repository {
    fn latest_definition(&self, key: &str) -> Result<Option<ProcessDefinition>, EngineError>;
    fn start_form_key(&self, definition_id: &str) -> Result<Option<String>, EngineError>;
    fn task_form_key(
        &self,
        definition_id: &str,
        activity_key: &str,
    ) -> Result<Option<String>, EngineError>;
}

/// Everything the facade consumes from an engine
pub trait ProcessEngine: PendingTasks + History + Runtime + Repository + Send + Sync {}

impl<T> ProcessEngine for T where T: PendingTasks + History + Runtime + Repository + Send + Sync {}
