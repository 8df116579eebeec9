//! Integration tests for the flowgate facade

mod cli_routes;
mod config_loading;
mod history_assembly;
mod test_utils;
