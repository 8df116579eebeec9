//! Layered configuration feeding the service.

use super::test_utils::with_xdg_env;
use flowgate::config::{ConfigLoader, ValidationError};
use flowgate::form::FormRegistry;
use flowgate::{FlowService, MemoryEngine};
use std::sync::Arc;
use tempfile::TempDir;

const WORKSPACE_CONFIG: &str = r#"
[query]
default_limit = 1

[[engine.definitions]]
key = "leave"
start_form_key = "leave_start"

[[engine.definitions.activities]]
id = "approve"
form_key = "leave_approve"
candidates = ["mgr"]

[[forms]]
key = "leave_start"
title = "Leave request"
"#;

#[test]
fn workspace_config_drives_engine_and_forms() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();
    std::fs::write(workspace.join("config").join("config.toml"), WORKSPACE_CONFIG).unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load(&workspace)).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.query.default_limit, 1);
    assert_eq!(config.query.max_limit, 500);

    let engine = Arc::new(MemoryEngine::new());
    for model in &config.engine.definitions {
        engine.deploy(model).unwrap();
    }
    let service = FlowService::with_forms(
        engine,
        FormRegistry::from_definitions(config.forms.clone()),
        config.query,
    );
    assert_eq!(
        service.get_start_form_key("leave").data.as_deref(),
        Some("leave_start")
    );
    assert!(service.get_form("leave_start").is_some());
}

#[test]
fn global_config_is_overridden_by_environment_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();
    std::fs::create_dir_all(test_dir.path().join("xdg").join("flowgate")).unwrap();
    std::fs::write(
        test_dir.path().join("xdg").join("flowgate").join("config.toml"),
        "[logging]\nformat = \"json\"\n\n[query]\nmax_limit = 50\n",
    )
    .unwrap();
    std::fs::write(
        workspace.join("config").join("staging.toml"),
        "[query]\nmax_limit = 25\n",
    )
    .unwrap();

    let (global_only, staged) = with_xdg_env(&test_dir, || {
        let global_only = ConfigLoader::load(&workspace).unwrap();
        std::env::set_var("FLOWGATE_ENV", "staging");
        let staged = ConfigLoader::load(&workspace).unwrap();
        (global_only, staged)
    });
    assert_eq!(global_only.query.max_limit, 50);
    assert_eq!(global_only.logging.format, "json");
    assert_eq!(staged.query.max_limit, 25);
    assert_eq!(staged.logging.format, "json");
}

#[test]
fn invalid_config_is_reported() {
    let test_dir = TempDir::new().unwrap();
    let file = test_dir.path().join("flowgate.toml");
    std::fs::write(
        &file,
        "[[forms]]\nkey = \"a\"\n\n[[forms]]\nkey = \"a\"\n\n[query]\nmax_limit = 0\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::Form(key, _) if key == "a")));
}
