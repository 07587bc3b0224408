//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist schema-less JSON object records in the `records` table.
//! - Distinguish a missing key from every other storage failure.
//!
//! # Invariants
//! - `data` is always a JSON object, both in memory and on disk.
//! - `update_by_key` merges top-level keys and runs in one transaction.
//! - `updated_at` never moves backwards.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const RECORD_COLUMNS: &str = "collection, key, data, created_at, updated_at";

// Millisecond wall clock; `now` is stable within one statement.
const NOW_MS_SQL: &str = "CAST(ROUND((julianday('now') - 2440587.5) * 86400000.0) AS INTEGER)";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by record store operations.
#[derive(Debug)]
pub enum StoreError {
    /// No record with `key` exists in `collection`.
    MissingKey { collection: String, key: String },
    /// Transport or SQLite failure.
    Db(DbError),
    /// Persisted or supplied data cannot be encoded/decoded.
    InvalidData(String),
    /// Collection name is empty.
    InvalidCollection(String),
}

impl StoreError {
    /// Returns whether this error is the dedicated missing-key signal.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKey { collection, key } => {
                write!(f, "no record `{key}` in collection `{collection}`")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
            Self::InvalidCollection(name) => write!(f, "invalid collection name `{name}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingKey { .. } | Self::InvalidData(_) | Self::InvalidCollection(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub collection: String,
    /// Store-assigned key (UUID v4 text).
    pub key: String,
    pub data: Map<String, Value>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Persistence contract consumed by use-case services.
pub trait RecordStore {
    /// Inserts a new record and returns it with its assigned key.
    fn insert(&self, collection: &str, data: &Map<String, Value>) -> StoreResult<Record>;
    /// Lists every record of a collection in insertion order.
    ///
    /// Order follows `rowid`, not the wall clock.
    fn list_all(&self, collection: &str) -> StoreResult<Vec<Record>>;
    /// Looks up one record; `Ok(None)` means no match.
    fn find_by_key(&self, collection: &str, key: &str) -> StoreResult<Option<Record>>;
    /// Merges `data` into an existing record.
    ///
    /// Fails with `StoreError::MissingKey` when `key` is absent.
    fn update_by_key(
        &self,
        collection: &str,
        key: &str,
        data: &Map<String, Value>,
    ) -> StoreResult<Record>;
    /// Deletes one record and returns it as it was before deletion.
    ///
    /// Fails with `StoreError::MissingKey` when `key` is absent.
    fn delete_by_key(&self, collection: &str, key: &str) -> StoreResult<Record>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a connection returned by `db::open_db*` (migrations applied).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn insert(&self, collection: &str, data: &Map<String, Value>) -> StoreResult<Record> {
        ensure_collection(collection)?;
        let key = Uuid::new_v4().to_string();

        let raw = self.conn.query_row(
            &format!(
                "INSERT INTO records (collection, key, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, {NOW_MS_SQL}, {NOW_MS_SQL})
                 RETURNING {RECORD_COLUMNS};"
            ),
            params![collection, key, encode_data(data)?],
            read_raw_record,
        )?;

        raw.into_record()
    }

    fn list_all(&self, collection: &str) -> StoreResult<Vec<Record>> {
        ensure_collection(collection)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS}
             FROM records
             WHERE collection = ?1
             ORDER BY rowid ASC;"
        ))?;
        let raws = stmt
            .query_map([collection], read_raw_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(RawRecord::into_record).collect()
    }

    fn find_by_key(&self, collection: &str, key: &str) -> StoreResult<Option<Record>> {
        ensure_collection(collection)?;
        select_record(self.conn, collection, key)?
            .map(RawRecord::into_record)
            .transpose()
    }

    fn update_by_key(
        &self,
        collection: &str,
        key: &str,
        data: &Map<String, Value>,
    ) -> StoreResult<Record> {
        ensure_collection(collection)?;

        // IMMEDIATE takes the write lock up front so contention goes through
        // the busy handler instead of failing on the read-to-write upgrade.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(existing) = select_record(&tx, collection, key)? else {
            return Err(missing_key(collection, key));
        };

        let mut merged = existing.into_record()?.data;
        for (field, value) in data {
            merged.insert(field.clone(), value.clone());
        }

        let raw = tx.query_row(
            &format!(
                "UPDATE records
                 SET
                    data = ?3,
                    updated_at = MAX(updated_at, {NOW_MS_SQL})
                 WHERE collection = ?1
                   AND key = ?2
                 RETURNING {RECORD_COLUMNS};"
            ),
            params![collection, key, encode_data(&merged)?],
            read_raw_record,
        )?;
        tx.commit()?;

        raw.into_record()
    }

    fn delete_by_key(&self, collection: &str, key: &str) -> StoreResult<Record> {
        ensure_collection(collection)?;

        let raw = self
            .conn
            .query_row(
                &format!(
                    "DELETE FROM records
                     WHERE collection = ?1
                       AND key = ?2
                     RETURNING {RECORD_COLUMNS};"
                ),
                params![collection, key],
                read_raw_record,
            )
            .optional()?;

        match raw {
            Some(raw) => raw.into_record(),
            None => Err(missing_key(collection, key)),
        }
    }
}

/// Row as read from SQLite, before JSON decoding.
struct RawRecord {
    collection: String,
    key: String,
    data: String,
    created_at: i64,
    updated_at: i64,
}

impl RawRecord {
    fn into_record(self) -> StoreResult<Record> {
        let value: Value = serde_json::from_str(&self.data).map_err(|err| {
            StoreError::InvalidData(format!(
                "records.data for key `{}` is not valid JSON: {err}",
                self.key
            ))
        })?;
        let Value::Object(data) = value else {
            return Err(StoreError::InvalidData(format!(
                "records.data for key `{}` is not a JSON object",
                self.key
            )));
        };

        Ok(Record {
            collection: self.collection,
            key: self.key,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn read_raw_record(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        collection: row.get("collection")?,
        key: row.get("key")?,
        data: row.get("data")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_record(
    conn: &Connection,
    collection: &str,
    key: &str,
) -> StoreResult<Option<RawRecord>> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS}
                 FROM records
                 WHERE collection = ?1
                   AND key = ?2;"
            ),
            params![collection, key],
            read_raw_record,
        )
        .optional()?;
    Ok(raw)
}

fn encode_data(data: &Map<String, Value>) -> StoreResult<String> {
    serde_json::to_string(data)
        .map_err(|err| StoreError::InvalidData(format!("failed to encode record data: {err}")))
}

fn ensure_collection(collection: &str) -> StoreResult<()> {
    if collection.trim().is_empty() {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(())
}

fn missing_key(collection: &str, key: &str) -> StoreError {
    StoreError::MissingKey {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}
