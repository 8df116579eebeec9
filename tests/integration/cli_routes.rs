//! CLI route table over a workspace snapshot.

use super::test_utils::{forms, leave_model, trip_model};
use flowgate::cli::{Cli, Commands, RunContext};
use flowgate::config::FlowConfig;
use flowgate::error::ERROR_CODE_VALIDATION;
use clap::Parser;
use serde_json::Value;
use tempfile::TempDir;

fn config() -> FlowConfig {
    let mut config = FlowConfig::default();
    config.engine.definitions = vec![leave_model()];
    config.forms = forms();
    config
}

fn command(args: &[&str]) -> Commands {
    let mut argv = vec!["flowgate"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

fn run(workspace: &TempDir, args: &[&str]) -> Result<String, flowgate::cli::CommandFailure> {
    let context = RunContext::from_config(workspace.path(), config()).unwrap();
    context.execute(&command(args))
}

#[test]
fn state_survives_across_invocations() {
    let workspace = TempDir::new().unwrap();
    let out = run(
        &workspace,
        &[
            "submit", "leave", "--user", "u1", "--user-name", "Ann", "--title", "Holiday",
            "--var", "days=3",
        ],
    )
    .unwrap();
    assert!(out.starts_with("Started process instance"), "{}", out);
    assert!(workspace.path().join(".flowgate").join("engine.json").exists());

    let out = run(
        &workspace,
        &[
            "query", "--type", "WAITING_PROCESS", "--user", "mgr", "--need-total",
            "--with-variables", "--format", "json",
        ],
    )
    .unwrap();
    let envelope: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(envelope["success"], Value::Bool(true));
    assert_eq!(envelope["total"], serde_json::json!(1));
    let row = &envelope["data"][0];
    assert_eq!(row["variables"]["days"], serde_json::json!(3));
    assert_eq!(row["variables"]["title"], serde_json::json!("Holiday"));

    let task_id = row["id"].as_str().unwrap().to_string();
    let instance_id = row["process_instance_id"].as_str().unwrap().to_string();
    let out = run(
        &workspace,
        &["complete", &task_id, "--user", "mgr", "--user-name", "Manager", "--pass"],
    )
    .unwrap();
    assert_eq!(out, format!("Completed task {}", task_id));

    let out = run(&workspace, &["history", &instance_id, "--with-variables"]).unwrap();
    assert!(out.contains("startEvent (start)"));
    assert!(out.contains("leave_approve"));
}

#[test]
fn query_validation_surfaces_as_failure() {
    let workspace = TempDir::new().unwrap();
    let failure = run(&workspace, &["query", "--user", "mgr"]).unwrap_err();
    assert_eq!(failure.code, ERROR_CODE_VALIDATION);
    assert_eq!(failure.message, "miss type");

    let failure = run(&workspace, &["query", "--type", "SOMETIMES"]).unwrap_err();
    assert_eq!(failure.code, ERROR_CODE_VALIDATION);

    let failure = run(
        &workspace,
        &["submit", "leave", "--user", "u1", "--var", "broken"],
    )
    .unwrap_err();
    assert_eq!(failure.code, ERROR_CODE_VALIDATION);
}

#[test]
fn deploy_and_list_definitions() {
    let workspace = TempDir::new().unwrap();
    let model_path = workspace.path().join("trip.json");
    std::fs::write(&model_path, serde_json::to_string(&trip_model()).unwrap()).unwrap();

    let out = run(&workspace, &["deploy", model_path.to_str().unwrap()]).unwrap();
    assert!(out.starts_with("Deployed trip:1:"), "{}", out);

    let out = run(&workspace, &["definitions", "--format", "json"]).unwrap();
    let definitions: Value = serde_json::from_str(&out).unwrap();
    let keys: Vec<&str> = definitions
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["leave", "trip"]);
}

#[test]
fn form_lookups() {
    let workspace = TempDir::new().unwrap();
    assert_eq!(
        run(&workspace, &["start-form-key", "leave"]).unwrap(),
        "leave_start"
    );
    assert_eq!(
        run(&workspace, &["start-form-key", "leave", "--format", "json"])
            .map(|out| serde_json::from_str::<Value>(&out).unwrap()["data"].clone())
            .unwrap(),
        serde_json::json!("leave_start")
    );
    assert!(run(&workspace, &["form", "leave_start"])
        .unwrap()
        .contains("Leave request"));
    assert_eq!(run(&workspace, &["form", "missing", "--format", "json"]).unwrap(), "null");
    assert!(run(&workspace, &["task", "404"]).unwrap().contains("404"));
}
