//! Domain model for stored tasks.
//!
//! # Invariants
//! - Every task is identified by a store-assigned `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
