use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::ports::storage::{PreferenceStore, StorageError};

pub fn load_preference(db_path: &Path, key: &str) -> Result<Option<String>> {
    let conn = open_connection(db_path)?;
    conn.query_row(
        "SELECT value FROM preference WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read preference {key}"))
}

pub fn upsert_preference(db_path: &Path, key: &str, value: &str) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute(
        "INSERT INTO preference(key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        params![key, value],
    )
    .with_context(|| format!("failed to write preference {key}"))?;
    Ok(())
}

pub fn delete_preference(db_path: &Path, key: &str) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute("DELETE FROM preference WHERE key = ?1", params![key])
        .with_context(|| format!("failed to delete preference {key}"))?;
    Ok(())
}

/// Durable preferences in the application database.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlitePreferenceStore {
    pub db_path: PathBuf,
}

impl SqlitePreferenceStore {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        init_db(&db_path)?;
        Ok(Self { db_path })
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        load_preference(&self.db_path, key)
            .map_err(|err| StorageError::Unavailable(format!("{err:#}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        upsert_preference(&self.db_path, key, value)
            .map_err(|err| StorageError::Unavailable(format!("{err:#}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        delete_preference(&self.db_path, key)
            .map_err(|err| StorageError::Unavailable(format!("{err:#}")))
    }
}
