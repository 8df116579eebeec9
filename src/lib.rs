//! Flowgate: a workflow task facade
//!
//! Sits between callers and a BPMN-style process engine. Callers query
//! pending and historic work for a user, start processes, complete tasks,
//! read activity history and resolve form keys; every public operation
//! returns a uniform [`envelope::Envelope`].

pub mod cli;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod form;
pub mod history;
pub mod logging;
pub mod model;
pub mod query;
pub mod service;
pub mod submit;
pub mod variables;

pub use engine::{MemoryEngine, ProcessEngine};
pub use envelope::Envelope;
pub use error::{EngineError, FlowError};
pub use service::FlowService;
