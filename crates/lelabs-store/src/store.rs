use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::migrations;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Record could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database schema v{found} is newer than supported v{supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

/// Key/value record store using SQLite
///
/// Each record is a whole JSON document stored under a fixed key. Writes
/// replace the full document in a single statement, so readers never see
/// a half-written value.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) the database file and apply pending migrations
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        migrations::apply(&mut conn)?;
        info!("Opened preference store at {}", path.display());

        Ok(Self { conn })
    }

    /// In-memory database, gone when dropped
    pub fn open_in_memory() -> crate::Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrations::apply(&mut conn)?;
        Ok(Self { conn })
    }

    /// Read and decode the record stored under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> crate::Result<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Replace the record stored under `key`
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> crate::Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, json, Utc::now().timestamp()],
        )?;
        debug!("Persisted record '{}' ({} bytes)", key, json.len());
        Ok(())
    }

    pub fn delete(&self, key: &str) -> crate::Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM records WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    pub fn schema_version(&self) -> crate::Result<u32> {
        migrations::current_version(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_missing_record_is_none() {
        let store = RecordStore::open_in_memory().unwrap();
        let value: Option<Sample> = store.get("nothing-here").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_put_replaces_whole_record() {
        let store = RecordStore::open_in_memory().unwrap();
        store
            .put("k", &Sample { name: "a".into(), count: 1 })
            .unwrap();
        store
            .put("k", &Sample { name: "b".into(), count: 2 })
            .unwrap();

        let value: Sample = store.get("k").unwrap().unwrap();
        assert_eq!(value, Sample { name: "b".into(), count: 2 });
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.db");

        {
            let store = RecordStore::open(&path).unwrap();
            store
                .put("user-preferences", &Sample { name: "kept".into(), count: 7 })
                .unwrap();
        }

        let store = RecordStore::open(&path).unwrap();
        assert_eq!(store.schema_version().unwrap(), migrations::latest_version());
        let value: Sample = store.get("user-preferences").unwrap().unwrap();
        assert_eq!(value.name, "kept");
    }

    #[test]
    fn test_delete() {
        let store = RecordStore::open_in_memory().unwrap();
        store.put("k", &Sample { name: "x".into(), count: 0 }).unwrap();
        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let store = RecordStore::open_in_memory().unwrap();
        store.put("k", &"just a string").unwrap();
        let result: crate::Result<Option<Sample>> = store.get("k");
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
