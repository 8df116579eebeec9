//! In-memory process engine.
//!
//! Runs linear processes: a start event, the definition's user tasks in
//! order, then an end event. All state sits behind one lock and can be
//! snapshotted to JSON so the CLI can act across invocations.

use super::{
    ActivityModel, ActorFilter, EngineQuery, HistoricActivity, HistoricVariable, History, Page,
    PendingTasks, ProcessDefinition, ProcessInstance, ProcessModel, Repository, Runtime, SortKey,
    TaskInstance, ACTIVITY_END_EVENT, ACTIVITY_START_EVENT, ACTIVITY_USER_TASK,
};
use crate::error::EngineError;
use crate::variables::{keys, merge, Variables};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDefinition {
    definition: ProcessDefinition,
    model: ProcessModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredInstance {
    instance: ProcessInstance,
    /// Current process-scope values
    variables: Variables,
    /// Index of the activity currently open, if any
    position: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EngineState {
    next_id: u64,
    last_stamp: Option<DateTime<Utc>>,
    definitions: Vec<StoredDefinition>,
    instances: BTreeMap<String, StoredInstance>,
    tasks: BTreeMap<String, TaskInstance>,
    task_locals: BTreeMap<String, Variables>,
    variables: Vec<HistoricVariable>,
    activities: Vec<HistoricActivity>,
}

impl EngineState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    /// Strictly increasing timestamps so time-ordered queries never tie.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn latest(&self, key: &str) -> Option<&StoredDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.definition.key == key)
            .max_by_key(|d| d.definition.version)
    }

    fn definition(&self, definition_id: &str) -> Result<&StoredDefinition, EngineError> {
        self.definitions
            .iter()
            .find(|d| d.definition.id == definition_id)
            .ok_or_else(|| EngineError::DefinitionNotFound(definition_id.to_string()))
    }

    fn record_variable(
        &mut self,
        process_instance_id: &str,
        task_id: Option<&str>,
        name: &str,
        value: &Value,
    ) {
        let existing = self.variables.iter_mut().find(|v| {
            v.process_instance_id == process_instance_id
                && v.task_id.as_deref() == task_id
                && v.name == name
        });
        match existing {
            Some(record) => record.value = value.clone(),
            None => self.variables.push(HistoricVariable {
                process_instance_id: process_instance_id.to_string(),
                task_id: task_id.map(str::to_string),
                name: name.to_string(),
                value: value.clone(),
            }),
        }
    }

    fn record_activity(
        &mut self,
        instance: &ProcessInstance,
        activity_id: &str,
        activity_name: Option<String>,
        activity_type: &str,
        task: Option<&TaskInstance>,
    ) {
        let id = self.next_id();
        let start_time = self.stamp();
        let end_time = match task {
            Some(_) => None,
            None => Some(start_time),
        };
        self.activities.push(HistoricActivity {
            id,
            activity_id: activity_id.to_string(),
            activity_name,
            activity_type: activity_type.to_string(),
            process_instance_id: instance.id.clone(),
            process_definition_id: instance.process_definition_id.clone(),
            task_id: task.map(|t| t.id.clone()),
            assignee: task.and_then(|t| t.assignee.clone()),
            start_time,
            end_time,
        });
    }

    /// Open the activity at `position`, or end the instance when none is left.
    fn advance(&mut self, instance_id: &str, position: usize) -> Result<(), EngineError> {
        let stored = self
            .instances
            .get(instance_id)
            .ok_or_else(|| EngineError::InstanceNotFound(instance_id.to_string()))?;
        let instance = stored.instance.clone();
        let assignee = stored.variables.get(keys::ASSIGNEE_ID).and_then(actor_id);
        let activity: Option<ActivityModel> = self
            .definition(&instance.process_definition_id)?
            .model
            .activities
            .get(position)
            .cloned();

        match activity {
            Some(activity) => {
                let task = TaskInstance {
                    id: self.next_id(),
                    name: activity.name.clone(),
                    task_definition_key: activity.id.clone(),
                    process_instance_id: instance.id.clone(),
                    process_definition_id: instance.process_definition_id.clone(),
                    assignee,
                    candidates: activity.candidates.clone(),
                    create_time: self.stamp(),
                    end_time: None,
                };
                self.record_activity(
                    &instance,
                    &activity.id,
                    activity.name.clone(),
                    ACTIVITY_USER_TASK,
                    Some(&task),
                );
                debug!(task_id = %task.id, activity = %activity.id, "Opened user task");
                self.tasks.insert(task.id.clone(), task);
                if let Some(stored) = self.instances.get_mut(instance_id) {
                    stored.position = Some(position);
                }
            }
            None => {
                self.record_activity(&instance, "end", None, ACTIVITY_END_EVENT, None);
                let end_time = self.stamp();
                if let Some(stored) = self.instances.get_mut(instance_id) {
                    stored.instance.end_time = Some(end_time);
                    stored.position = None;
                }
                debug!(instance_id = %instance_id, "Process instance finished");
            }
        }
        Ok(())
    }

    fn open_task(&self, task_id: &str) -> Result<&TaskInstance, EngineError> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))?;
        if task.end_time.is_some() {
            return Err(EngineError::TaskClosed {
                task_id: task_id.to_string(),
            });
        }
        Ok(task)
    }

    fn instance_variables(&self, process_instance_id: &str) -> Option<&Variables> {
        self.instances
            .get(process_instance_id)
            .map(|stored| &stored.variables)
    }

    fn definition_key_of(&self, definition_id: &str) -> Option<&str> {
        self.definitions
            .iter()
            .find(|d| d.definition.id == definition_id)
            .map(|d| d.definition.key.as_str())
    }

    fn task_matches(&self, task: &TaskInstance, query: &EngineQuery) -> bool {
        if let Some(key) = &query.process_definition_key {
            if self.definition_key_of(&task.process_definition_id) != Some(key.as_str()) {
                return false;
            }
        }
        let actor_ok = match &query.actor {
            None => true,
            Some(ActorFilter::Assignee(user)) => task.assignee.as_deref() == Some(user.as_str()),
            Some(ActorFilter::CandidateOrAssigned(user)) => match &task.assignee {
                Some(assignee) => assignee == user,
                None => task.candidates.iter().any(|c| c == user),
            },
            Some(ActorFilter::StartedBy(user)) => self
                .instances
                .get(&task.process_instance_id)
                .and_then(|s| s.instance.started_by.as_deref())
                == Some(user.as_str()),
        };
        actor_ok
            && query.completion.accepts(task.end_time)
            && self
                .instance_variables(&task.process_instance_id)
                .map(|vars| query.matches_variables(vars))
                .unwrap_or(query.predicates.is_empty())
    }

    fn instance_matches(&self, stored: &StoredInstance, query: &EngineQuery) -> bool {
        let instance = &stored.instance;
        if let Some(key) = &query.process_definition_key {
            if &instance.process_definition_key != key {
                return false;
            }
        }
        let actor_ok = match &query.actor {
            None => true,
            Some(ActorFilter::StartedBy(user)) => {
                instance.started_by.as_deref() == Some(user.as_str())
            }
            // Instances carry no assignee; match through their tasks.
            Some(ActorFilter::Assignee(user)) | Some(ActorFilter::CandidateOrAssigned(user)) => {
                self.tasks.values().any(|t| {
                    t.process_instance_id == instance.id
                        && t.assignee.as_deref() == Some(user.as_str())
                })
            }
        };
        actor_ok
            && query.completion.accepts(instance.end_time)
            && query.matches_variables(&stored.variables)
    }

    fn filtered_tasks(&self, query: &EngineQuery, pending_only: bool) -> Vec<&TaskInstance> {
        let mut tasks: Vec<&TaskInstance> = self
            .tasks
            .values()
            .filter(|t| !pending_only || t.end_time.is_none())
            .filter(|t| self.task_matches(t, query))
            .collect();
        match query.sort {
            SortKey::TaskCreateTime => tasks.sort_by(|a, b| b.create_time.cmp(&a.create_time)),
            SortKey::InstanceStartTime => tasks.sort_by(|a, b| {
                let start = |t: &TaskInstance| {
                    self.instances
                        .get(&t.process_instance_id)
                        .map(|s| s.instance.start_time)
                };
                start(b).cmp(&start(a))
            }),
        }
        tasks
    }

    fn filtered_instances(&self, query: &EngineQuery) -> Vec<&ProcessInstance> {
        let mut instances: Vec<&ProcessInstance> = self
            .instances
            .values()
            .filter(|s| self.instance_matches(s, query))
            .map(|s| &s.instance)
            .collect();
        // Instances have no create time of their own; start time serves both keys.
        instances.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        instances
    }
}

fn actor_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn window<T: Clone>(items: Vec<&T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect()
}

/// In-memory [`ProcessEngine`](super::ProcessEngine)
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: RwLock<EngineState>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`MemoryEngine::save`]; a missing file yields an empty engine.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let state: EngineState = serde_json::from_str(&content)?;
        debug!(
            path = %path.display(),
            definitions = state.definitions.len(),
            "Loaded engine snapshot"
        );
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Write the full engine state as JSON.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&*self.state.read())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Deploy a model. Redeploying an unchanged model returns the existing definition.
    pub fn deploy(&self, model: &ProcessModel) -> Result<ProcessDefinition, EngineError> {
        if model.key.is_empty() || model.key.contains(':') {
            return Err(EngineError::Internal(format!(
                "Invalid process key '{}'",
                model.key
            )));
        }
        let mut state = self.state.write();
        if let Some(latest) = state.latest(&model.key) {
            if latest.model == *model {
                return Ok(latest.definition.clone());
            }
        }
        let version = state
            .latest(&model.key)
            .map(|d| d.definition.version + 1)
            .unwrap_or(1);
        let deployment = state.next_id();
        let definition = ProcessDefinition {
            id: format!("{}:{}:{}", model.key, version, deployment),
            key: model.key.clone(),
            name: model.name.clone(),
            version,
            start_form_key: model.start_form_key.clone(),
        };
        state.definitions.push(StoredDefinition {
            definition: definition.clone(),
            model: model.clone(),
        });
        info!(definition_id = %definition.id, "Deployed process definition");
        Ok(definition)
    }

    /// Latest version of every deployed key, ordered by key.
    pub fn definitions(&self) -> Vec<ProcessDefinition> {
        let state = self.state.read();
        let mut latest: BTreeMap<&str, &ProcessDefinition> = BTreeMap::new();
        for stored in &state.definitions {
            let def = &stored.definition;
            match latest.get(def.key.as_str()) {
                Some(existing) if existing.version >= def.version => {}
                _ => {
                    latest.insert(def.key.as_str(), def);
                }
            }
        }
        latest.into_values().cloned().collect()
    }
}

impl PendingTasks for MemoryEngine {
    fn find_task(&self, task_id: &str) -> Result<Option<TaskInstance>, EngineError> {
        let state = self.state.read();
        Ok(state
            .tasks
            .get(task_id)
            .filter(|t| t.end_time.is_none())
            .cloned())
    }

    fn count_tasks(&self, query: &EngineQuery) -> Result<u64, EngineError> {
        let state = self.state.read();
        Ok(state.filtered_tasks(query, true).len() as u64)
    }

    fn list_tasks(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<TaskInstance>, EngineError> {
        let state = self.state.read();
        Ok(window(state.filtered_tasks(query, true), page))
    }

    fn task_variables(&self, task_id: &str) -> Result<Variables, EngineError> {
        let state = self.state.read();
        let task = state
            .tasks
            .get(task_id)
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))?;
        let process = state
            .instance_variables(&task.process_instance_id)
            .cloned()
            .unwrap_or_default();
        Ok(merge(&process, state.task_locals.get(task_id)))
    }

    fn set_task_local_variables(
        &self,
        task_id: &str,
        variables: &Variables,
    ) -> Result<(), EngineError> {
        let mut state = self.state.write();
        let instance_id = state.open_task(task_id)?.process_instance_id.clone();
        for (name, value) in variables {
            state.record_variable(&instance_id, Some(task_id), name, value);
        }
        let locals = state.task_locals.entry(task_id.to_string()).or_default();
        crate::variables::extend(locals, variables);
        Ok(())
    }

    fn complete_task(&self, task_id: &str, variables: &Variables) -> Result<(), EngineError> {
        let mut state = self.state.write();
        let instance_id = state.open_task(task_id)?.process_instance_id.clone();
        for (name, value) in variables {
            state.record_variable(&instance_id, None, name, value);
        }
        let position = {
            let stored = state
                .instances
                .get_mut(&instance_id)
                .ok_or_else(|| EngineError::InstanceNotFound(instance_id.clone()))?;
            crate::variables::extend(&mut stored.variables, variables);
            stored.position.map(|p| p + 1).unwrap_or(0)
        };
        let end_time = state.stamp();
        // An unassigned task is attributed to the task-local assignee written before completion.
        let claimed = state
            .task_locals
            .get(task_id)
            .and_then(|locals| locals.get(keys::ASSIGNEE_ID))
            .and_then(actor_id);
        let mut assignee = None;
        if let Some(task) = state.tasks.get_mut(task_id) {
            task.end_time = Some(end_time);
            if task.assignee.is_none() {
                task.assignee = claimed;
            }
            assignee = task.assignee.clone();
        }
        if let Some(activity) = state
            .activities
            .iter_mut()
            .find(|a| a.task_id.as_deref() == Some(task_id))
        {
            activity.end_time = Some(end_time);
            activity.assignee = assignee;
        }
        debug!(task_id = %task_id, "Completed task");
        state.advance(&instance_id, position)
    }
}

impl History for MemoryEngine {
    fn count_historic_tasks(&self, query: &EngineQuery) -> Result<u64, EngineError> {
        let state = self.state.read();
        Ok(state.filtered_tasks(query, false).len() as u64)
    }

    fn list_historic_tasks(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<TaskInstance>, EngineError> {
        let state = self.state.read();
        Ok(window(state.filtered_tasks(query, false), page))
    }

    fn count_historic_instances(&self, query: &EngineQuery) -> Result<u64, EngineError> {
        let state = self.state.read();
        Ok(state.filtered_instances(query).len() as u64)
    }

    fn list_historic_instances(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<ProcessInstance>, EngineError> {
        let state = self.state.read();
        Ok(window(state.filtered_instances(query), page))
    }

    fn historic_variables(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<HistoricVariable>, EngineError> {
        let state = self.state.read();
        Ok(state
            .variables
            .iter()
            .filter(|v| v.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }

    fn historic_activities(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<HistoricActivity>, EngineError> {
        let state = self.state.read();
        Ok(state
            .activities
            .iter()
            .filter(|a| a.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }
}

impl Runtime for MemoryEngine {
    fn start_process_by_key(
        &self,
        key: &str,
        actor_id: &str,
        variables: &Variables,
    ) -> Result<ProcessInstance, EngineError> {
        let mut state = self.state.write();
        let definition = state
            .latest(key)
            .map(|d| d.definition.clone())
            .ok_or_else(|| EngineError::DefinitionNotFound(key.to_string()))?;
        let id = state.next_id();
        let start_time = state.stamp();
        let instance = ProcessInstance {
            id: id.clone(),
            process_definition_id: definition.id.clone(),
            process_definition_key: definition.key.clone(),
            process_definition_name: definition.name.clone(),
            started_by: Some(actor_id.to_string()),
            start_time,
            end_time: None,
        };
        state.instances.insert(
            id.clone(),
            StoredInstance {
                instance: instance.clone(),
                variables: variables.clone(),
                position: None,
            },
        );
        for (name, value) in variables {
            state.record_variable(&id, None, name, value);
        }
        state.record_activity(&instance, "start", None, ACTIVITY_START_EVENT, None);
        state.advance(&id, 0)?;
        info!(instance_id = %id, definition_id = %definition.id, "Started process instance");

        Ok(state
            .instances
            .get(&id)
            .map(|s| s.instance.clone())
            .unwrap_or(instance))
    }
}

impl Repository for MemoryEngine {
    fn latest_definition(&self, key: &str) -> Result<Option<ProcessDefinition>, EngineError> {
        let state = self.state.read();
        Ok(state.latest(key).map(|d| d.definition.clone()))
    }

    fn start_form_key(&self, definition_id: &str) -> Result<Option<String>, EngineError> {
        let state = self.state.read();
        Ok(state.definition(definition_id)?.model.start_form_key.clone())
    }

    fn task_form_key(
        &self,
        definition_id: &str,
        activity_key: &str,
    ) -> Result<Option<String>, EngineError> {
        let state = self.state.read();
        Ok(state
            .definition(definition_id)?
            .model
            .activities
            .iter()
            .find(|a| a.id == activity_key)
            .and_then(|a| a.form_key.clone()))
    }
}
