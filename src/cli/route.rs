//! CLI route: single route table and run context. Dispatches to the flow service and presentation.

use crate::cli::help::{command_name, is_mutating};
use crate::cli::output::{into_payload, CommandFailure};
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_definitions_text, format_form_key_text, format_form_text, format_history_text,
    format_task_records_text, format_task_text, render_json,
};
use crate::config::{ConfigLoader, FlowConfig};
use crate::engine::{MemoryEngine, ProcessModel};
use crate::envelope::Envelope;
use crate::error::FlowError;
use crate::form::FormRegistry;
use crate::model::Options;
use crate::query::{QueryType, TaskQuery, TaskState};
use crate::service::FlowService;
use crate::submit::{CompleteRequest, SubmitRequest};
use crate::variables::Variables;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Runtime context for CLI execution: the engine snapshot and the service over it.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    engine: Arc<MemoryEngine>,
    service: FlowService,
    snapshot_path: PathBuf,
    /// Startup deployment changed the engine
    deployed: bool,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, FlowError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(&workspace_root, config)
    }

    /// Validate `config`, open the snapshot and deploy the configured definitions.
    pub fn from_config(workspace_root: &Path, config: FlowConfig) -> Result<Self, FlowError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            FlowError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let snapshot_path = config.engine.snapshot_in(workspace_root);
        let engine = Arc::new(MemoryEngine::open(&snapshot_path)?);
        let before = engine.definitions();
        for model in &config.engine.definitions {
            engine.deploy(model)?;
        }
        let deployed = engine.definitions() != before;

        let forms = FormRegistry::from_definitions(config.forms);
        debug!(
            snapshot = %snapshot_path.display(),
            forms = forms.len(),
            deployed,
            "CLI context ready"
        );
        let service = FlowService::with_forms(engine.clone(), forms, config.query);

        Ok(Self {
            engine,
            service,
            snapshot_path,
            deployed,
        })
    }

    pub fn service(&self) -> &FlowService {
        &self.service
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Execute a CLI command via the single route table, then persist engine changes.
    pub fn execute(&self, command: &Commands) -> Result<String, CommandFailure> {
        let name = command_name(command);
        debug!(command = name, "Executing command");
        let output = self.execute_inner(command)?;
        if self.deployed || is_mutating(command) {
            self.engine.save(&self.snapshot_path).map_err(FlowError::from)?;
            info!(
                command = name,
                snapshot = %self.snapshot_path.display(),
                "Saved engine snapshot"
            );
        }
        Ok(output)
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, CommandFailure> {
        match command {
            Commands::Deploy { path, format } => {
                let model = load_model(path)?;
                let definition = self.engine.deploy(&model).map_err(FlowError::from)?;
                Ok(match format {
                    OutputFormat::Json => render_json(&definition),
                    OutputFormat::Text => format!(
                        "Deployed {} (version {})",
                        definition.id, definition.version
                    ),
                })
            }
            Commands::Definitions { format } => {
                let definitions = self.engine.definitions();
                Ok(match format {
                    OutputFormat::Json => render_json(&definitions),
                    OutputFormat::Text => format_definitions_text(&definitions),
                })
            }
            Commands::Task {
                task_id,
                with_variables,
                format,
            } => {
                let options = Options {
                    with_variables: *with_variables,
                    ..Default::default()
                };
                respond(self.service.get_task(task_id, options), *format, |task, _| {
                    format_task_text(task_id, task)
                })
            }
            Commands::Query {
                query_type,
                user,
                process_key,
                state,
                title,
                initiator,
                equals,
                not_equals,
                start,
                limit,
                need_total,
                with_variables,
                format,
            } => {
                let query = TaskQuery {
                    query_type: query_type
                        .as_deref()
                        .map(str::parse::<QueryType>)
                        .transpose()?,
                    process_definition_key: process_key.clone(),
                    user_id: user.clone(),
                    state: state.as_deref().map(str::parse::<TaskState>).transpose()?,
                    title: title.clone(),
                    initiator_id: initiator.clone(),
                    process_variable_value_equals: parse_assignments(equals)?.unwrap_or_default(),
                    process_variable_value_not_equals: parse_assignments(not_equals)?
                        .unwrap_or_default(),
                    start: *start,
                    limit: *limit,
                    need_total: *need_total,
                    with_variables: *with_variables,
                };
                respond(self.service.query(&query), *format, |rows, total| {
                    format_task_records_text(rows.map(Vec::as_slice).unwrap_or(&[]), total)
                })
            }
            Commands::Submit {
                process_key,
                user,
                user_name,
                assignee,
                assignee_name,
                title,
                skip,
                pass,
                variables,
                format,
            } => {
                let request = SubmitRequest {
                    user_id: user.clone(),
                    user_name: user_name.clone(),
                    assignee: assignee.clone(),
                    assignee_name: assignee_name.clone(),
                    title: title.clone(),
                    skip: skip.then_some(true),
                    pass: pass.then_some(true),
                    variables: parse_assignments(variables)?,
                };
                respond(
                    self.service.submit(process_key, &request),
                    *format,
                    |instance, _| match instance {
                        Some(instance) if instance.ended => format!(
                            "Started and finished process instance {} ({})",
                            instance.id, instance.process_definition_id
                        ),
                        Some(instance) => format!(
                            "Started process instance {} ({})",
                            instance.id, instance.process_definition_id
                        ),
                        None => "Started process instance".to_string(),
                    },
                )
            }
            Commands::Complete {
                task_id,
                user,
                user_name,
                assignee,
                assignee_name,
                skip,
                pass,
                variables,
                task_variables,
                format,
            } => {
                let request = CompleteRequest {
                    user_id: user.clone(),
                    user_name: user_name.clone(),
                    assignee: assignee.clone(),
                    assignee_name: assignee_name.clone(),
                    skip: skip.then_some(true),
                    pass: pass.then_some(true),
                    variables: parse_assignments(variables)?,
                    task_variables: parse_assignments(task_variables)?,
                };
                respond(self.service.complete(task_id, &request), *format, |_, _| {
                    format!("Completed task {}", task_id)
                })
            }
            Commands::History {
                process_instance_id,
                with_variables,
                replace_local,
                format,
            } => {
                let options = Options {
                    with_variables: *with_variables,
                    replace_local_variables: *replace_local,
                };
                respond(
                    self.service.get_history(process_instance_id, options),
                    *format,
                    |nodes, _| {
                        format_history_text(
                            process_instance_id,
                            nodes.map(Vec::as_slice).unwrap_or(&[]),
                        )
                    },
                )
            }
            Commands::StartFormKey {
                process_key,
                format,
            } => respond(
                self.service.get_start_form_key(process_key),
                *format,
                |form_key, _| format_form_key_text(form_key.map(String::as_str)),
            ),
            Commands::FormKey {
                process_definition_id,
                activity,
                format,
            } => respond(
                self.service
                    .get_form_key(process_definition_id, activity.as_deref()),
                *format,
                |form_key, _| format_form_key_text(form_key.map(String::as_str)),
            ),
            Commands::Form { form_key, format } => {
                let form = self.service.get_form(form_key);
                Ok(match format {
                    OutputFormat::Json => render_json(&form.as_deref()),
                    OutputFormat::Text => format_form_text(form_key, form.as_deref()),
                })
            }
        }
    }
}

/// JSON prints the whole envelope; text renders the payload. Failures become errors either way.
fn respond<T, F>(
    envelope: Envelope<T>,
    format: OutputFormat,
    text: F,
) -> Result<String, CommandFailure>
where
    T: Serialize,
    F: FnOnce(Option<&T>, Option<u64>) -> String,
{
    if format == OutputFormat::Json && envelope.is_success() {
        return Ok(render_json(&envelope));
    }
    let total = envelope.total;
    let data = into_payload(envelope)?;
    Ok(text(data.as_ref(), total))
}

/// `name=value` pairs; values are parsed as JSON and fall back to plain strings.
pub fn parse_assignments(items: &[String]) -> Result<Option<Variables>, FlowError> {
    if items.is_empty() {
        return Ok(None);
    }
    let mut variables = Variables::new();
    for item in items {
        let (name, raw) = item
            .split_once('=')
            .filter(|(name, _)| !name.trim().is_empty())
            .ok_or_else(|| {
                FlowError::validation(format!(
                    "invalid variable assignment '{}', expected name=value",
                    item
                ))
            })?;
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        variables.insert(name.trim().to_string(), value);
    }
    Ok(Some(variables))
}

/// Read a process model from a `.json` file, or TOML otherwise.
fn load_model(path: &Path) -> Result<ProcessModel, FlowError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FlowError::Config(format!("Failed to read model {}: {}", path.display(), e))
    })?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| FlowError::Config(format!("Invalid model {}: {}", path.display(), e)))
}
