//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskstore_core` wiring: config, logging, migrations and one full
//!   task lifecycle against the configured database.
//! - Keep output deterministic apart from generated ids.

use log::error;
use serde_json::json;
use std::process::ExitCode;
use taskstore_core::{
    core_version, init_logging, ping, CoreConfig, SqliteRecordStore, TaskPayload, TaskService,
    TaskServiceError,
};

fn main() -> ExitCode {
    println!("taskstore_core ping={}", ping());
    println!("taskstore_core version={}", core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_smoke module=cli status=error error={err}");
            eprintln!("taskstore smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }

    let conn = config.open_db()?;
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    let created = service.create(smoke_payload("buy milk"))?;
    println!("created id={}", created.id);

    let fetched = service.find_one(&created.id)?;
    let updated = service.update(&fetched.id, smoke_payload("buy oat milk"))?;
    println!("updated {}", serde_json::to_string(&updated)?);

    service.remove(&updated.id)?;
    match service.find_one(&updated.id) {
        Err(TaskServiceError::NotFound(_)) => {}
        Ok(_) => return Err("removed task is still readable".into()),
        Err(other) => return Err(other.into()),
    }

    println!("tasks remaining={}", service.find_all()?.len());
    Ok(())
}

fn smoke_payload(title: &str) -> TaskPayload {
    let mut payload = TaskPayload::new();
    payload.insert("title".to_string(), json!(title));
    payload
}
