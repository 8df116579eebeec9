//! Shared test utilities for integration tests
//!
//! A recording engine wrapper that counts every call crossing the engine
//! boundary, a seeded engine with two deployed processes, and helpers for
//! driving the service.

use flowgate::engine::{
    ActivityModel, EngineQuery, HistoricActivity, HistoricVariable, History, MemoryEngine, Page,
    PendingTasks, ProcessDefinition, ProcessInstance, ProcessModel, Repository, Runtime,
    SortKey, TaskInstance,
};
use flowgate::error::EngineError;
use flowgate::form::{FormDefinition, FormField, FormRegistry};
use flowgate::model::{ProcessInstanceRef, TaskRecord};
use flowgate::query::{QueryLimits, QueryType, TaskQuery};
use flowgate::submit::SubmitRequest;
use flowgate::variables::Variables;
use flowgate::FlowService;
use parking_lot::Mutex;
use std::sync::Arc;

/// Engine wrapper that records the name of every boundary call
pub struct RecordingEngine {
    inner: MemoryEngine,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingEngine {
    pub fn new(inner: MemoryEngine) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &MemoryEngine {
        &self.inner
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn count_of(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }

    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().push(name);
    }
}

impl PendingTasks for RecordingEngine {
    fn find_task(&self, task_id: &str) -> Result<Option<TaskInstance>, EngineError> {
        self.record("find_task");
        self.inner.find_task(task_id)
    }

    fn count_tasks(&self, query: &EngineQuery) -> Result<u64, EngineError> {
        self.record("count_tasks");
        self.inner.count_tasks(query)
    }

    fn list_tasks(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<TaskInstance>, EngineError> {
        self.record("list_tasks");
        self.inner.list_tasks(query, page)
    }

    fn task_variables(&self, task_id: &str) -> Result<Variables, EngineError> {
        self.record("task_variables");
        self.inner.task_variables(task_id)
    }

    fn set_task_local_variables(
        &self,
        task_id: &str,
        variables: &Variables,
    ) -> Result<(), EngineError> {
        self.record("set_task_local_variables");
        self.inner.set_task_local_variables(task_id, variables)
    }

    fn complete_task(&self, task_id: &str, variables: &Variables) -> Result<(), EngineError> {
        self.record("complete_task");
        self.inner.complete_task(task_id, variables)
    }
}

impl History for RecordingEngine {
    fn count_historic_tasks(&self, query: &EngineQuery) -> Result<u64, EngineError> {
        self.record("count_historic_tasks");
        self.inner.count_historic_tasks(query)
    }

    fn list_historic_tasks(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<TaskInstance>, EngineError> {
        self.record("list_historic_tasks");
        self.inner.list_historic_tasks(query, page)
    }

    fn count_historic_instances(&self, query: &EngineQuery) -> Result<u64, EngineError> {
        self.record("count_historic_instances");
        self.inner.count_historic_instances(query)
    }

    fn list_historic_instances(
        &self,
        query: &EngineQuery,
        page: Page,
    ) -> Result<Vec<ProcessInstance>, EngineError> {
        self.record("list_historic_instances");
        self.inner.list_historic_instances(query, page)
    }

    fn historic_variables(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<HistoricVariable>, EngineError> {
        self.record("historic_variables");
        self.inner.historic_variables(process_instance_id)
    }

    fn historic_activities(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<HistoricActivity>, EngineError> {
        self.record("historic_activities");
        self.inner.historic_activities(process_instance_id)
    }
}

impl Runtime for RecordingEngine {
    fn start_process_by_key(
        &self,
        key: &str,
        actor_id: &str,
        variables: &Variables,
    ) -> Result<ProcessInstance, EngineError> {
        self.record("start_process_by_key");
        self.inner.start_process_by_key(key, actor_id, variables)
    }
}

impl Repository for RecordingEngine {
    fn latest_definition(&self, key: &str) -> Result<Option<ProcessDefinition>, EngineError> {
        self.record("latest_definition");
        self.inner.latest_definition(key)
    }

    fn start_form_key(&self, definition_id: &str) -> Result<Option<String>, EngineError> {
        self.record("start_form_key");
        self.inner.start_form_key(definition_id)
    }

    fn task_form_key(
        &self,
        definition_id: &str,
        activity_key: &str,
    ) -> Result<Option<String>, EngineError> {
        self.record("task_form_key");
        self.inner.task_form_key(definition_id, activity_key)
    }
}

fn activity(id: &str, name: &str, form_key: Option<&str>, candidates: &[&str]) -> ActivityModel {
    ActivityModel {
        id: id.to_string(),
        name: Some(name.to_string()),
        form_key: form_key.map(str::to_string),
        candidates: candidates.iter().map(|c| c.to_string()).collect(),
    }
}

/// `leave`: approve (candidate mgr) then archive (candidate clerk), with forms.
pub fn leave_model() -> ProcessModel {
    ProcessModel {
        key: "leave".to_string(),
        name: Some("Leave request".to_string()),
        start_form_key: Some("leave_start".to_string()),
        activities: vec![
            activity("approve", "Approve", Some("leave_approve"), &["mgr"]),
            activity("archive", "Archive", None, &["clerk"]),
        ],
    }
}

/// `trip`: a single review step (candidate mgr), no forms.
pub fn trip_model() -> ProcessModel {
    ProcessModel {
        key: "trip".to_string(),
        name: None,
        start_form_key: None,
        activities: vec![activity("review", "Review", None, &["mgr"])],
    }
}

pub fn forms() -> Vec<FormDefinition> {
    vec![
        FormDefinition {
            key: "leave_start".to_string(),
            title: Some("Leave request".to_string()),
            fields: vec![FormField {
                name: "days".to_string(),
                label: Some("Days".to_string()),
                required: true,
            }],
        },
        FormDefinition {
            key: "leave_approve".to_string(),
            title: Some("Approve leave".to_string()),
            fields: vec![],
        },
    ]
}

/// Engine with `leave` and `trip` deployed.
pub fn seeded_engine() -> MemoryEngine {
    let engine = MemoryEngine::new();
    engine.deploy(&leave_model()).unwrap();
    engine.deploy(&trip_model()).unwrap();
    engine
}

/// A recording engine over [`seeded_engine`] and a service using it.
pub fn recording_service(limits: QueryLimits) -> (Arc<RecordingEngine>, FlowService) {
    let engine = Arc::new(RecordingEngine::new(seeded_engine()));
    let service = FlowService::with_forms(
        engine.clone(),
        FormRegistry::from_definitions(forms()),
        limits,
    );
    (engine, service)
}

pub fn submit_request(user: &str, title: &str) -> SubmitRequest {
    SubmitRequest {
        user_id: Some(user.to_string()),
        user_name: Some(format!("{} name", user)),
        title: Some(title.to_string()),
        ..Default::default()
    }
}

/// Submit and unwrap the new instance reference.
pub fn submit(service: &FlowService, key: &str, request: &SubmitRequest) -> ProcessInstanceRef {
    let envelope = service.submit(key, request);
    assert!(envelope.is_success(), "submit failed: {:?}", envelope.message);
    envelope.data.unwrap()
}

/// Run a query and unwrap the rows.
pub fn query_rows(service: &FlowService, query: &TaskQuery) -> Vec<TaskRecord> {
    let envelope = service.query(query);
    assert!(envelope.is_success(), "query failed: {:?}", envelope.message);
    envelope.data.unwrap()
}

pub fn waiting_for(user: &str) -> TaskQuery {
    let mut query = TaskQuery::new(QueryType::WaitingProcess);
    query.user_id = Some(user.to_string());
    query
}

/// Id of the single pending task of `process_instance_id`, read from the engine.
pub fn pending_task_of(service: &FlowService, process_instance_id: &str) -> String {
    let tasks = service
        .engine()
        .list_tasks(&EngineQuery::new(SortKey::TaskCreateTime), Page::new(0, 500))
        .unwrap();
    let mut ids: Vec<String> = tasks
        .into_iter()
        .filter(|r| r.process_instance_id == process_instance_id)
        .map(|r| r.id)
        .collect();
    assert_eq!(ids.len(), 1, "expected exactly one pending task");
    ids.remove(0)
}

static XDG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir`, restoring both afterwards.
pub fn with_xdg_env<F, R>(test_dir: &tempfile::TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<std::ffi::OsString>)> = ["HOME", "XDG_CONFIG_HOME", "FLOWGATE_ENV"]
        .into_iter()
        .map(|name| (name, std::env::var_os(name)))
        .collect();

    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().join("xdg"));
    std::env::remove_var("FLOWGATE_ENV");

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }
    result
}
