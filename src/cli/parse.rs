//! CLI parse: clap types for flowgate. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Flowgate CLI - query and drive workflow tasks
#[derive(Parser)]
#[command(name = "flowgate")]
#[command(about = "Query, submit and complete workflow tasks through a process engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a process model file (TOML or JSON)
    Deploy {
        /// Path to the model file
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the latest version of every deployed process
    Definitions {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show one pending task
    Task {
        task_id: String,
        /// Attach the task's variables
        #[arg(long)]
        with_variables: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Search pending tasks, started processes or handled tasks
    Query {
        /// WAITING_PROCESS, INITIATE or PROCESSED
        #[arg(long = "type")]
        query_type: Option<String>,
        /// Acting user
        #[arg(long)]
        user: Option<String>,
        /// Process definition key
        #[arg(long)]
        process_key: Option<String>,
        /// ALL, UNFINISHED or FINISHED
        #[arg(long)]
        state: Option<String>,
        /// Title substring
        #[arg(long)]
        title: Option<String>,
        /// Initiator user id
        #[arg(long)]
        initiator: Option<String>,
        /// Process variable equality, name=value (repeatable)
        #[arg(long = "eq")]
        equals: Vec<String>,
        /// Process variable inequality, name=value (repeatable)
        #[arg(long = "ne")]
        not_equals: Vec<String>,
        /// Window offset
        #[arg(long, default_value = "0")]
        start: usize,
        /// Window size (0 = configured default)
        #[arg(long, default_value = "0")]
        limit: usize,
        /// Also count the unpaged result set
        #[arg(long)]
        need_total: bool,
        /// Attach variables to each row
        #[arg(long)]
        with_variables: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Start a process instance
    Submit {
        /// Process definition key
        process_key: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        user_name: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        assignee_name: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Enable skip expressions for the instance
        #[arg(long)]
        skip: bool,
        /// Set the pass marker
        #[arg(long)]
        pass: bool,
        /// Process variable, name=value (repeatable; value parsed as JSON when possible)
        #[arg(long = "var")]
        variables: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Complete a pending task
    Complete {
        task_id: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        user_name: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        assignee_name: Option<String>,
        #[arg(long)]
        skip: bool,
        #[arg(long)]
        pass: bool,
        /// Process variable, name=value (repeatable)
        #[arg(long = "var")]
        variables: Vec<String>,
        /// Task-local variable, name=value (repeatable)
        #[arg(long = "task-var")]
        task_variables: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show the activity history of a process instance
    History {
        process_instance_id: String,
        /// Attach variables and form keys to each node
        #[arg(long)]
        with_variables: bool,
        /// Overlay task-local variables on the process variables
        #[arg(long)]
        replace_local: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Resolve the start form of a process key or definition id
    StartFormKey {
        process_key: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Resolve the form of a task activity
    FormKey {
        process_definition_id: String,
        /// Activity id; defaults to the process key
        #[arg(long)]
        activity: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show a registered form
    Form {
        form_key: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}
