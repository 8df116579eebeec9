//! Form resolution and the form registry.
//!
//! Form keys come from the engine's repository: start forms hang off the
//! latest definition of a process key, task forms off a (definition,
//! activity) pair. The registry maps those keys to form objects and is built
//! once at startup from configuration.

use crate::engine::Repository;
use crate::error::{EngineError, FlowError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bare process key of a possibly versioned id: everything before the first `:`.
pub fn strip_version(process_key_or_id: &str) -> &str {
    match process_key_or_id.find(':') {
        Some(idx) if idx > 0 => &process_key_or_id[..idx],
        _ => process_key_or_id,
    }
}

/// Start form of the latest deployed definition for `process_key_or_id`.
pub fn resolve_start_form_key<R: Repository + ?Sized>(
    repository: &R,
    process_key_or_id: &str,
) -> Result<Option<String>, FlowError> {
    let key = strip_version(process_key_or_id);
    let definition = repository
        .latest_definition(key)?
        .ok_or_else(|| EngineError::DefinitionNotFound(key.to_string()))?;
    debug!(process_key = %key, definition_id = %definition.id, "Resolving start form");
    Ok(repository.start_form_key(&definition.id)?)
}

/// Form bound to an activity; without `activity_key` the stripped process key stands in.
pub fn resolve_task_form_key<R: Repository + ?Sized>(
    repository: &R,
    process_definition_id: &str,
    activity_key: Option<&str>,
) -> Result<Option<String>, FlowError> {
    let activity_key = activity_key.unwrap_or_else(|| strip_version(process_definition_id));
    Ok(repository.task_form_key(process_definition_id, activity_key)?)
}

/// One input field of a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// A form addressable by its key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// Key to form mapping, fixed after construction
#[derive(Debug, Default, Clone)]
pub struct FormRegistry {
    forms: HashMap<String, Arc<FormDefinition>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(forms: impl IntoIterator<Item = FormDefinition>) -> Self {
        let mut registry = Self::new();
        for form in forms {
            registry.register(form);
        }
        registry
    }

    /// Register a form; a later form with the same key replaces the earlier one.
    pub fn register(&mut self, form: FormDefinition) {
        self.forms.insert(form.key.clone(), Arc::new(form));
    }

    /// Look up a form; misses are logged, never raised.
    pub fn get(&self, form_key: &str) -> Option<Arc<FormDefinition>> {
        let form = self.forms.get(form_key).cloned();
        if form.is_none() {
            warn!(form_key = %form_key, "Form not registered");
        }
        form
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
