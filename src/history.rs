//! Activity history of a process instance.

use crate::engine::{HistoricVariable, ProcessEngine, ACTIVITY_USER_TASK};
use crate::error::FlowError;
use crate::form::{resolve_start_form_key, resolve_task_form_key};
use crate::model::{Options, ProcessNode};
use crate::variables::Variables;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Variable records grouped by owning task; `None` is process scope.
#[derive(Debug, Default)]
pub struct ScopedVariables {
    process: Variables,
    tasks: HashMap<String, Variables>,
}

impl ScopedVariables {
    pub fn group(records: Vec<HistoricVariable>) -> Self {
        let mut scoped = Self::default();
        for record in records {
            let bag = match record.task_id {
                Some(task_id) => scoped.tasks.entry(task_id).or_default(),
                None => &mut scoped.process,
            };
            bag.insert(record.name, record.value);
        }
        scoped
    }

    pub fn process(&self) -> &Variables {
        &self.process
    }

    pub fn task(&self, task_id: &str) -> Option<&Variables> {
        self.tasks.get(task_id)
    }

    /// Process scope, overlaid with the task's bag when `replace_local` is set.
    pub fn for_node(&self, task_id: Option<&str>, replace_local: bool) -> Variables {
        let local = match (replace_local, task_id) {
            (true, Some(task_id)) => self.task(task_id),
            _ => None,
        };
        crate::variables::merge(&self.process, local)
    }
}

/// Executed nodes of `process_instance_id` in engine order; only the first is the start event.
pub fn assemble(
    engine: &dyn ProcessEngine,
    process_instance_id: &str,
    options: Options,
) -> Result<Vec<ProcessNode>, FlowError> {
    let activities = engine.historic_activities(process_instance_id)?;
    let scoped = ScopedVariables::group(engine.historic_variables(process_instance_id)?);
    debug!(
        process_instance_id = %process_instance_id,
        activities = activities.len(),
        "Assembling activity history"
    );

    let mut nodes = Vec::with_capacity(activities.len());
    for (position, activity) in activities.into_iter().enumerate() {
        let mut node = ProcessNode::from(activity);
        node.is_start_event = position == 0;
        if options.with_variables {
            node.variables = Some(
                scoped.for_node(node.task_id.as_deref(), options.replace_local_variables),
            );
            let resolved = if node.is_start_event {
                Some(resolve_start_form_key(engine, &node.process_definition_id))
            } else if node.activity_type == ACTIVITY_USER_TASK {
                Some(resolve_task_form_key(
                    engine,
                    &node.process_definition_id,
                    Some(&node.activity_id),
                ))
            } else {
                None
            };
            // A node whose form cannot be resolved is still reported, without a form.
            node.form_key = match resolved {
                Some(Ok(form_key)) => form_key,
                Some(Err(e)) => {
                    warn!(
                        activity_id = %node.activity_id,
                        error = %e,
                        "Form key resolution failed"
                    );
                    None
                }
                None => None,
            };
        }
        nodes.push(node);
    }
    Ok(nodes)
}
