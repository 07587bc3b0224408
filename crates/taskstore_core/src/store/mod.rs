//! Generic record store over named collections.
//!
//! # Responsibility
//! - Provide create/read/update/delete primitives keyed by record key.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Keys are assigned by the store and unique within a collection.
//! - Operations on an absent key report `StoreError::MissingKey`, never a
//!   silent success.

pub mod record_store;
