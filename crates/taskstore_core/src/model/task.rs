//! Task domain model.
//!
//! # Responsibility
//! - Define the record returned by every task use-case.
//! - Keep the caller payload schema-less (an open JSON object).
//!
//! # Invariants
//! - `id` is assigned by the store on creation and never changes.
//! - Payload keys never shadow the record metadata (`id`, `created_at`,
//!   `updated_at`); those keys are dropped from caller input.

use crate::store::record_store::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque store-assigned task identifier.
pub type TaskId = String;

/// Open set of caller-supplied task fields.
pub type TaskPayload = Map<String, Value>;

/// Keys owned by the record itself rather than by the payload.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// A stored task: identifier, store timestamps and the caller's fields.
///
/// Serializes as one flat JSON object, e.g.
/// `{"id": "...", "created_at": 0, "updated_at": 0, "title": "buy milk"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Unix epoch milliseconds, stamped on insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped on every update.
    pub updated_at: i64,
    #[serde(flatten)]
    pub fields: TaskPayload,
}

impl Task {
    /// Builds a task view from a raw store record.
    pub fn from_record(record: Record) -> Self {
        let mut fields = record.data;
        strip_reserved_fields(&mut fields);
        Self {
            id: record.key,
            created_at: record.created_at,
            updated_at: record.updated_at,
            fields,
        }
    }

    /// Returns one payload field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Removes record-owned keys from a caller payload.
///
/// Returns how many keys were dropped.
pub fn strip_reserved_fields(payload: &mut TaskPayload) -> usize {
    RESERVED_FIELDS
        .iter()
        .filter(|key| payload.remove(**key).is_some())
        .count()
}
