//! Task storage core.
//! Owns the SQLite-backed record store and the task CRUD service on top of it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Task, TaskId, TaskPayload};
pub use service::task_service::{
    TaskService, TaskServiceError, TaskServiceResult, TASK_COLLECTION,
};
pub use store::record_store::{
    Record, RecordStore, SqliteRecordStore, StoreError, StoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
