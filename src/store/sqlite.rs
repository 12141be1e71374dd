//! SQLite-backed store; each instance owns one database file.
//!
//! Values are stored as JSON text next to an explicit 0-based index so a
//! cleared store restarts at index 0.
use super::IndexedStore;
use crate::error::{Result, WhisperError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SqliteStore<T> {
    path: PathBuf,
    conn: Option<Connection>,
    _values: PhantomData<T>,
}

impl<T> SqliteStore<T> {
    /// Open (or create) the database at `path`; existing rows are kept.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                idx   INTEGER PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
            _values: PhantomData,
        })
    }

    /// Open a fresh database at `path`, discarding any previous rows.
    pub fn create(path: &Path) -> Result<Self> {
        let store = Self::open(path)?;
        store.conn()?.execute("DELETE FROM entries", [])?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection but keep the database file on disk.
    pub fn close(mut self) {
        self.conn = None;
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(WhisperError::StoreDestroyed)
    }
}

impl<T> IndexedStore<T> for SqliteStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn append(&mut self, value: T) -> Result<()> {
        let index = IndexedStore::<T>::len(self)?;
        let encoded = serde_json::to_string(&value)?;
        self.conn()?.execute(
            "INSERT INTO entries (idx, value) VALUES (?1, ?2)",
            params![to_sql_index(index), encoded],
        )?;
        Ok(())
    }

    fn get(&self, index: usize) -> Result<T> {
        let encoded: Option<String> = self
            .conn()?
            .query_row(
                "SELECT value FROM entries WHERE idx = ?1",
                params![to_sql_index(index)],
                |row| row.get(0),
            )
            .optional()?;
        let encoded = encoded.ok_or(WhisperError::Lookup {
            what: "index",
            index,
        })?;
        Ok(serde_json::from_str(&encoded)?)
    }

    fn set(&mut self, index: usize, value: T) -> Result<()> {
        let encoded = serde_json::to_string(&value)?;
        let updated = self.conn()?.execute(
            "UPDATE entries SET value = ?1 WHERE idx = ?2",
            params![encoded, to_sql_index(index)],
        )?;
        if updated == 0 {
            return Err(WhisperError::Lookup {
                what: "index",
                index,
            });
        }
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn()?.execute("DELETE FROM entries", [])?;
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, err)| WhisperError::Storage(err))?;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        tracing::debug!(path = %self.path.display(), "destroyed sqlite store");
        Ok(())
    }
}

fn to_sql_index(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}
