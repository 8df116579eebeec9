//! Flow service: the public operations of the facade.
//!
//! Every operation returns an [`Envelope`]. Validation failures are returned
//! before the engine is touched; anything the engine raises is logged with
//! the operation context and reported as a system error. Nothing is retried.

use crate::engine::ProcessEngine;
use crate::envelope::Envelope;
use crate::error::FlowError;
use crate::form::{self, FormDefinition, FormRegistry};
use crate::history;
use crate::model::{Options, ProcessInstanceRef, ProcessNode, TaskRecord};
use crate::query::{self, QueryLimits, TaskQuery};
use crate::submit::{self, CompleteRequest, SubmitRequest};
use std::sync::Arc;
use tracing::{error, warn};

/// Query, submission, history and form lookups over one engine
pub struct FlowService {
    engine: Arc<dyn ProcessEngine>,
    forms: FormRegistry,
    limits: QueryLimits,
}

impl FlowService {
    pub fn new(engine: Arc<dyn ProcessEngine>) -> Self {
        Self::with_forms(engine, FormRegistry::new(), QueryLimits::default())
    }

    pub fn with_forms(
        engine: Arc<dyn ProcessEngine>,
        forms: FormRegistry,
        limits: QueryLimits,
    ) -> Self {
        Self {
            engine,
            forms,
            limits,
        }
    }

    pub fn engine(&self) -> &Arc<dyn ProcessEngine> {
        &self.engine
    }

    /// Registered form for `form_key`, or `None`.
    pub fn get_form(&self, form_key: &str) -> Option<Arc<FormDefinition>> {
        self.forms.get(form_key)
    }

    /// One pending task; an unknown id is a success without payload.
    pub fn get_task(&self, task_id: &str, options: Options) -> Envelope<TaskRecord> {
        match self.find_task_record(task_id, options) {
            Ok(record) => Envelope::success_opt(record),
            Err(e) => report("get_task", task_id, e),
        }
    }

    fn find_task_record(
        &self,
        task_id: &str,
        options: Options,
    ) -> Result<Option<TaskRecord>, FlowError> {
        let Some(task) = self.engine.find_task(task_id)? else {
            return Ok(None);
        };
        let variables = if options.with_variables {
            Some(self.engine.task_variables(task_id)?)
        } else {
            None
        };
        let mut record = TaskRecord::from(task);
        record.variables = variables;
        Ok(Some(record))
    }

    pub fn query(&self, query: &TaskQuery) -> Envelope<Vec<TaskRecord>> {
        match query::run(self.engine.as_ref(), query, &self.limits) {
            Ok(outcome) => Envelope::success(outcome.rows).with_total(outcome.total),
            Err(e) => report("query", &format!("{:?}", query), e),
        }
    }

    pub fn submit(
        &self,
        process_key: &str,
        request: &SubmitRequest,
    ) -> Envelope<ProcessInstanceRef> {
        match submit::submit(self.engine.as_ref(), process_key, request) {
            Ok(instance) => Envelope::success(instance),
            Err(e) => report("submit", process_key, e),
        }
    }

    pub fn complete(&self, task_id: &str, request: &CompleteRequest) -> Envelope<()> {
        match submit::complete(self.engine.as_ref(), task_id, request) {
            Ok(()) => Envelope::success_opt(None),
            Err(e) => report("complete", task_id, e),
        }
    }

    pub fn get_history(
        &self,
        process_instance_id: &str,
        options: Options,
    ) -> Envelope<Vec<ProcessNode>> {
        match history::assemble(self.engine.as_ref(), process_instance_id, options) {
            Ok(nodes) => Envelope::success(nodes),
            Err(e) => report("get_history", process_instance_id, e),
        }
    }

    /// Start form for a process key or versioned definition id.
    pub fn get_start_form_key(&self, process_key: &str) -> Envelope<String> {
        match form::resolve_start_form_key(self.engine.as_ref(), process_key) {
            Ok(form_key) => Envelope::success_opt(form_key),
            Err(e) => report("get_start_form_key", process_key, e),
        }
    }

    /// Task form for an activity; without `activity_key` the stripped process key is used.
    pub fn get_form_key(
        &self,
        process_definition_id: &str,
        activity_key: Option<&str>,
    ) -> Envelope<String> {
        match form::resolve_task_form_key(self.engine.as_ref(), process_definition_id, activity_key)
        {
            Ok(form_key) => Envelope::success_opt(form_key),
            Err(e) => report("get_form_key", process_definition_id, e),
        }
    }
}

fn report<T>(operation: &str, context: &str, err: FlowError) -> Envelope<T> {
    if err.is_validation() {
        warn!(operation, context, error = %err, "Rejected request");
    } else {
        error!(operation, context, error = %err, "Operation failed");
    }
    err.into()
}
