//! Task and process query dispatch.
//!
//! A [`TaskQuery`] names one of three data sets through its [`QueryType`]:
//!
//! | Type | Data set | Actor filter | Sort (desc) | Variables |
//! |---|---|---|---|---|
//! | `WAITING_PROCESS` | pending tasks | candidate or assignee | task create time | live task bag |
//! | `INITIATE` | process instances | started by | instance start time | instance history |
//! | `PROCESSED` | historic tasks | assignee | task create time | owning instance history |
//!
//! The remaining filters apply identically to all three. Each strategy runs
//! an optional `count` and one windowed `list` against the same predicate.

use crate::engine::{
    ActorFilter, Completion, EngineQuery, HistoricVariable, Page, ProcessEngine, SortKey,
    VariablePredicate,
};
use crate::error::FlowError;
use crate::model::TaskRecord;
use crate::variables::{keys, Variables};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which data set a query searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// Tasks waiting on the user
    WaitingProcess,
    /// Process instances the user started
    Initiate,
    /// Tasks the user has handled
    Processed,
}

impl QueryType {
    pub fn sort_key(self) -> SortKey {
        match self {
            QueryType::WaitingProcess | QueryType::Processed => SortKey::TaskCreateTime,
            QueryType::Initiate => SortKey::InstanceStartTime,
        }
    }

    pub fn actor_filter(self, user_id: &str) -> ActorFilter {
        let user = user_id.to_string();
        match self {
            QueryType::WaitingProcess => ActorFilter::CandidateOrAssigned(user),
            QueryType::Initiate => ActorFilter::StartedBy(user),
            QueryType::Processed => ActorFilter::Assignee(user),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::WaitingProcess => "WAITING_PROCESS",
            QueryType::Initiate => "INITIATE",
            QueryType::Processed => "PROCESSED",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "WAITING_PROCESS" | "WAITING" => Ok(QueryType::WaitingProcess),
            "INITIATE" | "INITIATED" => Ok(QueryType::Initiate),
            "PROCESSED" => Ok(QueryType::Processed),
            _ => Err(FlowError::validation(format!("unknown query type: {}", s))),
        }
    }
}

/// Finished/unfinished narrowing requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    All,
    Unfinished,
    Finished,
}

impl From<TaskState> for Completion {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::All => Completion::Any,
            TaskState::Unfinished => Completion::Unfinished,
            TaskState::Finished => Completion::Finished,
        }
    }
}

impl FromStr for TaskState {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(TaskState::All),
            "UNFINISHED" => Ok(TaskState::Unfinished),
            "FINISHED" => Ok(TaskState::Finished),
            _ => Err(FlowError::validation(format!("unknown task state: {}", s))),
        }
    }
}

/// A task search request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(rename = "type")]
    pub query_type: Option<QueryType>,
    pub process_definition_key: Option<String>,
    pub user_id: Option<String>,
    pub state: Option<TaskState>,
    /// Substring (or `%` pattern) match on the title variable
    pub title: Option<String>,
    pub initiator_id: Option<String>,
    pub process_variable_value_equals: Variables,
    pub process_variable_value_not_equals: Variables,
    pub start: usize,
    /// Window size; 0 takes the configured default
    pub limit: usize,
    pub need_total: bool,
    pub with_variables: bool,
}

impl TaskQuery {
    pub fn new(query_type: QueryType) -> Self {
        TaskQuery {
            query_type: Some(query_type),
            ..Default::default()
        }
    }
}

/// Window size policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    500
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl QueryLimits {
    pub fn page(&self, start: usize, limit: usize) -> Page {
        let limit = match limit {
            0 => self.default_limit,
            n => n.min(self.max_limit),
        };
        Page::new(start, limit)
    }
}

/// Rows plus the unpaged count when it was requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub rows: Vec<TaskRecord>,
    pub total: Option<u64>,
}

/// Build the engine predicate for a query of the given type on behalf of `user_id`.
pub fn plan(query_type: QueryType, user_id: &str, query: &TaskQuery) -> EngineQuery {
    let mut plan = EngineQuery::new(query_type.sort_key());
    plan.process_definition_key = query.process_definition_key.clone();
    plan.actor = Some(query_type.actor_filter(user_id));
    plan.completion = match query_type {
        // Pending tasks are unfinished by construction.
        QueryType::WaitingProcess => Completion::Any,
        QueryType::Initiate | QueryType::Processed => query.state.unwrap_or_default().into(),
    };
    if let Some(title) = &query.title {
        plan.predicates.push(VariablePredicate::Like {
            name: keys::TITLE.to_string(),
            pattern: title.clone(),
        });
    }
    if let Some(initiator) = &query.initiator_id {
        plan.predicates.push(VariablePredicate::Equals {
            name: keys::INITIATOR_ID.to_string(),
            value: Value::String(initiator.clone()),
        });
    }
    for (name, value) in &query.process_variable_value_equals {
        plan.predicates.push(VariablePredicate::Equals {
            name: name.clone(),
            value: value.clone(),
        });
    }
    for (name, value) in &query.process_variable_value_not_equals {
        plan.predicates.push(VariablePredicate::NotEquals {
            name: name.clone(),
            value: value.clone(),
        });
    }
    plan
}

/// Fold an instance's variable history into one bag; later records win.
pub fn collect_historic(records: Vec<HistoricVariable>) -> Variables {
    records
        .into_iter()
        .map(|record| (record.name, record.value))
        .collect()
}

/// Run a query against the engine.
pub fn run(
    engine: &dyn ProcessEngine,
    query: &TaskQuery,
    limits: &QueryLimits,
) -> Result<QueryOutcome, FlowError> {
    let query_type = query
        .query_type
        .ok_or_else(|| FlowError::validation("miss type"))?;
    // Every strategy is scoped to one user.
    let user_id = query
        .user_id
        .as_deref()
        .ok_or_else(|| FlowError::validation("miss user"))?;
    let predicate = plan(query_type, user_id, query);
    let page = limits.page(query.start, query.limit);
    debug!(
        query_type = %query_type,
        offset = page.offset,
        limit = page.limit,
        predicates = predicate.predicates.len(),
        "Dispatching task query"
    );

    match query_type {
        QueryType::WaitingProcess => {
            let total = if query.need_total {
                Some(engine.count_tasks(&predicate)?)
            } else {
                None
            };
            let mut rows = Vec::new();
            for task in engine.list_tasks(&predicate, page)? {
                let variables = if query.with_variables {
                    Some(engine.task_variables(&task.id)?)
                } else {
                    None
                };
                let mut row = TaskRecord::from(task);
                row.variables = variables;
                rows.push(row);
            }
            Ok(QueryOutcome { rows, total })
        }
        QueryType::Initiate => {
            let total = if query.need_total {
                Some(engine.count_historic_instances(&predicate)?)
            } else {
                None
            };
            let mut rows = Vec::new();
            for instance in engine.list_historic_instances(&predicate, page)? {
                let variables = if query.with_variables {
                    Some(collect_historic(engine.historic_variables(&instance.id)?))
                } else {
                    None
                };
                let mut row = TaskRecord::from(instance);
                row.variables = variables;
                rows.push(row);
            }
            Ok(QueryOutcome { rows, total })
        }
        QueryType::Processed => {
            let total = if query.need_total {
                Some(engine.count_historic_tasks(&predicate)?)
            } else {
                None
            };
            let mut rows = Vec::new();
            for task in engine.list_historic_tasks(&predicate, page)? {
                let variables = if query.with_variables {
                    Some(collect_historic(
                        engine.historic_variables(&task.process_instance_id)?,
                    ))
                } else {
                    None
                };
                let mut row = TaskRecord::from(task);
                row.variables = variables;
                rows.push(row);
            }
            Ok(QueryOutcome { rows, total })
        }
    }
}
