//! Logging System
//!
//! Structured logging built on `tracing`. Level, format and destination come
//! from configuration, with `FLOWGATE_LOG*` environment variables taking
//! precedence over the configured values.

use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const ENV_LOG: &str = "FLOWGATE_LOG";
pub const ENV_LOG_MODULES: &str = "FLOWGATE_LOG_MODULES";
pub const ENV_LOG_FORMAT: &str = "FLOWGATE_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "FLOWGATE_LOG_OUTPUT";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Install a subscriber at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is "file"; defaults under the user data dir
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored output (text format on a terminal stream only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

/// `$XDG_DATA_HOME/flowgate/flowgate.log` or the platform equivalent.
pub fn default_log_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "flowgate")
        .map(|dirs| dirs.data_dir().join("flowgate.log"))
        .unwrap_or_else(|| PathBuf::from(".flowgate/flowgate.log"))
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. Environment variables (FLOWGATE_LOG, FLOWGATE_LOG_FORMAT, ...)
/// 2. Configuration (CLI flags are folded into it by the binary)
/// 3. Defaults
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), FlowError> {
    if config.map(|c| !c.enabled).unwrap_or(false) {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let use_color = config.map(|c| c.color).unwrap_or(true) && output != Output::File;
    let writer = match output {
        Output::Stdout => BoxMakeWriter::new(std::io::stdout),
        Output::Stderr => BoxMakeWriter::new(std::io::stderr),
        Output::File => {
            let path = config
                .and_then(|c| c.file.clone())
                .unwrap_or_else(default_log_file);
            BoxMakeWriter::new(Arc::new(open_log_file(&path)?))
        }
    };

    let base_subscriber = Registry::default().with(filter);
    let installed = if format == LogFormat::Json {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init()
    };
    installed.map_err(|e| FlowError::Config(format!("Failed to install logger: {}", e)))
}

fn open_log_file(path: &std::path::Path) -> Result<std::fs::File, FlowError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| FlowError::Config(format!("Failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| FlowError::Config(format!("Failed to open log file {:?}: {}", path, e)))
}

/// Build the level filter from `FLOWGATE_LOG`, or the config plus module overrides.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, FlowError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);
    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            filter = filter.add_directive(parse_directive(module, module_level)?);
        }
    }
    if let Ok(modules) = std::env::var(ENV_LOG_MODULES) {
        for (module, module_level) in parse_module_levels(&modules) {
            filter = filter.add_directive(parse_directive(module, module_level)?);
        }
    }
    Ok(filter)
}

fn parse_directive(
    module: &str,
    level: &str,
) -> Result<tracing_subscriber::filter::Directive, FlowError> {
    format!("{}={}", module, level)
        .parse()
        .map_err(|e| FlowError::Config(format!("Invalid log directive: {}", e)))
}

/// `a=debug,b::c=warn` pairs; malformed entries are skipped.
fn parse_module_levels(directives: &str) -> Vec<(&str, &str)> {
    directives.split(',')
        .filter_map(|entry| {
            let (module, level) = entry.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            (!module.is_empty() && !level.is_empty()).then_some((module, level))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<LogFormat, FlowError> {
    match format {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(FlowError::Config(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<LogFormat, FlowError> {
    if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
        if let Ok(parsed) = parse_format(&format) {
            return Ok(parsed);
        }
    }
    parse_format(config.map(|c| c.format.as_str()).unwrap_or("text"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File,
}

fn parse_output(output: &str) -> Result<Output, FlowError> {
    match output {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => Ok(Output::File),
        other => Err(FlowError::Config(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            other
        ))),
    }
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<Output, FlowError> {
    if let Ok(output) = std::env::var(ENV_LOG_OUTPUT) {
        return parse_output(&output);
    }
    parse_output(config.map(|c| c.output.as_str()).unwrap_or("stderr"))
}
