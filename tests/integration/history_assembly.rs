//! Activity history assembly.

use super::test_utils::{pending_task_of, recording_service, submit, submit_request};
use flowgate::engine::{ACTIVITY_END_EVENT, ACTIVITY_START_EVENT, ACTIVITY_USER_TASK};
use flowgate::model::{Options, ProcessNode};
use flowgate::query::QueryLimits;
use flowgate::submit::CompleteRequest;
use flowgate::variables::{keys, Variables};
use flowgate::FlowService;
use serde_json::json;

/// A `leave` instance whose approve step was completed by mgr with a local comment.
fn approved_leave(service: &FlowService) -> (String, String) {
    let instance = submit(service, "leave", &submit_request("u1", "Holiday"));
    let task_id = pending_task_of(service, &instance.id);
    let mut locals = Variables::new();
    locals.insert("comment".to_string(), json!("enjoy"));
    locals.insert(keys::TITLE.to_string(), json!("local title"));
    let request = CompleteRequest {
        user_id: Some("mgr".to_string()),
        user_name: Some("Manager".to_string()),
        task_variables: Some(locals),
        ..Default::default()
    };
    assert!(service.complete(&task_id, &request).is_success());
    (instance.id, task_id)
}

fn history(service: &FlowService, id: &str, options: Options) -> Vec<ProcessNode> {
    let envelope = service.get_history(id, options);
    assert!(envelope.is_success(), "{:?}", envelope.message);
    envelope.data.unwrap()
}

#[test]
fn only_the_first_node_is_the_start_event() {
    let (_, service) = recording_service(QueryLimits::default());
    let (instance_id, task_id) = approved_leave(&service);

    let nodes = history(&service, &instance_id, Options::default());
    let types: Vec<&str> = nodes.iter().map(|n| n.activity_type.as_str()).collect();
    assert_eq!(
        types,
        vec![ACTIVITY_START_EVENT, ACTIVITY_USER_TASK, ACTIVITY_USER_TASK]
    );
    let flags: Vec<bool> = nodes.iter().map(|n| n.is_start_event).collect();
    assert_eq!(flags, vec![true, false, false]);

    assert_eq!(nodes[1].task_id.as_deref(), Some(task_id.as_str()));
    assert_eq!(nodes[1].assignee.as_deref(), Some("mgr"));
    assert!(nodes[1].end_time.is_some());
    assert!(nodes[2].end_time.is_none());

    // variables and forms are only attached on request
    assert!(nodes.iter().all(|n| n.variables.is_none()));
    assert!(nodes.iter().all(|n| n.form_key.is_none()));
}

#[test]
fn with_variables_attaches_forms_and_process_scope() {
    let (_, service) = recording_service(QueryLimits::default());
    let (instance_id, _) = approved_leave(&service);

    let nodes = history(&service, &instance_id, Options::with_variables());
    assert_eq!(nodes[0].form_key.as_deref(), Some("leave_start"));
    assert_eq!(nodes[1].form_key.as_deref(), Some("leave_approve"));
    assert_eq!(nodes[2].form_key, None);

    let approve = nodes[1].variables.as_ref().unwrap();
    assert_eq!(approve[keys::TITLE], json!("Holiday"));
    assert!(!approve.contains_key("comment"));
}

#[test]
fn replace_local_overlays_task_scope() {
    let (_, service) = recording_service(QueryLimits::default());
    let (instance_id, _) = approved_leave(&service);

    let options = Options {
        with_variables: true,
        replace_local_variables: true,
    };
    let nodes = history(&service, &instance_id, options);
    let approve = nodes[1].variables.as_ref().unwrap();
    assert_eq!(approve["comment"], json!("enjoy"));
    assert_eq!(approve[keys::TITLE], json!("local title"));
    assert_eq!(approve[keys::USER_ID], json!("mgr"));

    // the start node has no task scope
    let start = nodes[0].variables.as_ref().unwrap();
    assert_eq!(start[keys::TITLE], json!("Holiday"));
    assert_eq!(start[keys::USER_ID], json!("u1"));
}

#[test]
fn finished_instance_ends_with_end_event() {
    let (_, service) = recording_service(QueryLimits::default());
    let instance = submit(&service, "trip", &submit_request("u1", "Berlin"));
    let task_id = pending_task_of(&service, &instance.id);
    let request = CompleteRequest {
        user_id: Some("mgr".to_string()),
        user_name: Some("Manager".to_string()),
        ..Default::default()
    };
    assert!(service.complete(&task_id, &request).is_success());

    let nodes = history(&service, &instance.id, Options::with_variables());
    let last = nodes.last().unwrap();
    assert_eq!(last.activity_type, ACTIVITY_END_EVENT);
    assert!(!last.is_start_event);
    // trip has no start form
    assert_eq!(nodes[0].form_key, None);
}

#[test]
fn unknown_instance_has_empty_history() {
    let (_, service) = recording_service(QueryLimits::default());
    assert!(history(&service, "404", Options::with_variables()).is_empty());
}
