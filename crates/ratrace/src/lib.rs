//! Command-line front end for the ratrace ledger simulator

pub mod commands;
pub mod logging;
pub mod report;
pub mod storage;

pub use logging::init_logging;
pub use storage::{ScenarioFormat, ScenarioStore, StorageError};
