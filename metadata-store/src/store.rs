//! Async-safe wrapper around a WAL-mode `rusqlite::Connection`.
//!
//! `rusqlite::Connection` is not `Send`, so every call runs on a blocking
//! pool thread via `spawn_blocking`, following
//! `mylinyuzhi-codex`'s `retrieval::storage::sqlite::SqliteStore` — including
//! its poisoned-mutex recovery, which rolls back any interrupted transaction
//! before handing the guard back out.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tokio::task::spawn_blocking;

use crate::error::{MetadataStoreError, Result};
use crate::schema::SCHEMA;

pub struct MetadataStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl MetadataStore {
    #[tracing::instrument(level = "info")]
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| MetadataStoreError::sqlite(path, e))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| MetadataStoreError::sqlite(path, e))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| MetadataStoreError::sqlite(path, e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| MetadataStoreError::sqlite(path, e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(conn: &Arc<Mutex<Connection>>, path: &Path) -> MutexGuard<'_, Connection> {
        conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(path = %path.display(), "metadata store mutex poisoned, recovering");
            let inner = poisoned.into_inner();
            if !inner.is_autocommit() {
                if let Err(e) = inner.execute("ROLLBACK", []) {
                    tracing::error!(path = %path.display(), error = %e, "rollback after poisoning failed");
                }
            }
            inner
        })
    }

    /// Run a read/write closure on the blocking pool.
    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let path = self.path.clone();
        spawn_blocking(move || {
            let guard = Self::lock(&conn, &path);
            f(&guard)
        })
        .await
        .map_err(|e| MetadataStoreError::Join(e.to_string()))?
    }

    /// Run a closure inside a transaction; the transaction commits iff the
    /// closure returns `Ok`.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let path = self.path.clone();
        spawn_blocking(move || {
            let mut guard = Self::lock(&conn, &path);
            let tx = guard
                .transaction()
                .map_err(|e| MetadataStoreError::sqlite(&path, e))?;
            let result = f(&tx)?;
            tx.commit().map_err(|e| MetadataStoreError::sqlite(&path, e))?;
            Ok(result)
        })
        .await
        .map_err(|e| MetadataStoreError::Join(e.to_string()))?
    }
}
