//! Task use-case service.
//!
//! # Responsibility
//! - Provide create/list/get/update/remove entry points for task callers.
//! - Delegate persistence to a `RecordStore` implementation.
//!
//! # Invariants
//! - Operations targeting an absent id fail with `TaskServiceError::NotFound`.
//! - Only the store's missing-key signal becomes `NotFound`; every other store
//!   failure is returned unchanged as `TaskServiceError::Store`.
//! - Service layer stays storage-agnostic and stateless.

use crate::model::task::{strip_reserved_fields, Task, TaskId, TaskPayload};
use crate::store::record_store::{RecordStore, StoreError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Collection holding task records.
pub const TASK_COLLECTION: &str = "tasks";

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// No task exists for the requested id.
    NotFound(TaskId),
    /// Store failure other than a missing key.
    Store(StoreError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Task with ID {id} not found"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for TaskServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Use-case service wrapper for task CRUD operations.
pub struct TaskService<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> TaskService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a task from an arbitrary payload.
    ///
    /// # Contract
    /// - No required-field validation; store failures propagate unchanged.
    /// - Payload `id`/`created_at`/`updated_at` keys are ignored.
    /// - Returns the stored task including its assigned id.
    pub fn create(&self, mut payload: TaskPayload) -> TaskServiceResult<Task> {
        let dropped = strip_reserved_fields(&mut payload);
        if dropped > 0 {
            debug!("event=task_create module=service status=reserved_fields_dropped count={dropped}");
        }

        let record = self
            .store
            .insert(TASK_COLLECTION, &payload)
            .inspect_err(|err| {
                warn!("event=task_create module=service status=error error={err}");
            })?;

        info!(
            "event=task_create module=service status=ok task_id={} field_count={}",
            record.key,
            record.data.len()
        );
        Ok(Task::from_record(record))
    }

    /// Lists every task in store order. Unfiltered and unpaginated.
    pub fn find_all(&self) -> TaskServiceResult<Vec<Task>> {
        let records = self.store.list_all(TASK_COLLECTION)?;
        debug!(
            "event=task_list module=service status=ok count={}",
            records.len()
        );
        Ok(records.into_iter().map(Task::from_record).collect())
    }

    /// Gets one task by id.
    ///
    /// A miss is always `TaskServiceError::NotFound(id)`, never an empty value.
    pub fn find_one(&self, id: &str) -> TaskServiceResult<Task> {
        match self.store.find_by_key(TASK_COLLECTION, id)? {
            Some(record) => Ok(Task::from_record(record)),
            None => {
                debug!("event=task_get module=service status=not_found task_id={id}");
                Err(TaskServiceError::NotFound(id.to_string()))
            }
        }
    }

    /// Merges `patch` into an existing task and returns the updated task.
    ///
    /// Patch keys replace stored keys (including `null` values); other
    /// stored keys are kept.
    pub fn update(&self, id: &str, mut patch: TaskPayload) -> TaskServiceResult<Task> {
        strip_reserved_fields(&mut patch);

        let record = self
            .store
            .update_by_key(TASK_COLLECTION, id, &patch)
            .map_err(|err| not_found_on_missing_key("task_update", id, err))?;

        info!(
            "event=task_update module=service status=ok task_id={} patched_fields={}",
            id,
            patch.len()
        );
        Ok(Task::from_record(record))
    }

    /// Deletes a task and returns it as it was before deletion.
    pub fn remove(&self, id: &str) -> TaskServiceResult<Task> {
        let record = self
            .store
            .delete_by_key(TASK_COLLECTION, id)
            .map_err(|err| not_found_on_missing_key("task_remove", id, err))?;

        info!("event=task_remove module=service status=ok task_id={id}");
        Ok(Task::from_record(record))
    }
}

fn not_found_on_missing_key(event: &str, id: &str, err: StoreError) -> TaskServiceError {
    if err.is_missing_key() {
        debug!("event={event} module=service status=not_found task_id={id}");
        return TaskServiceError::NotFound(id.to_string());
    }

    warn!("event={event} module=service status=error task_id={id} error={err}");
    TaskServiceError::Store(err)
}
