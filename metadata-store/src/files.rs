use rusqlite::{params, OptionalExtension};

use crate::error::{MetadataStoreError, Result};
use crate::models::{FileRecord, NewFile};
use crate::store::MetadataStore;

impl MetadataStore {
    /// Insert a file row, or update it in place if the path already exists.
    /// Returns the file id.
    pub async fn upsert_file(&self, file: NewFile) -> Result<i64> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO files (path, language, size, content_hash, last_indexed, line_count, purpose)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(path) DO UPDATE SET
                     language = excluded.language,
                     size = excluded.size,
                     content_hash = excluded.content_hash,
                     last_indexed = excluded.last_indexed,
                     line_count = excluded.line_count,
                     purpose = excluded.purpose",
                params![
                    file.path,
                    file.language,
                    file.size,
                    file.content_hash,
                    file.last_indexed,
                    file.line_count,
                    file.purpose,
                ],
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;

            conn.query_row(
                "SELECT id FROM files WHERE path = ?1",
                params![file.path],
                |row| row.get(0),
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }

    pub async fn get_file_by_path(&self, path: String) -> Result<Option<FileRecord>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, path, language, size, content_hash, last_indexed, line_count, purpose
                 FROM files WHERE path = ?1",
                params![path],
                row_to_file,
            )
            .optional()
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }

    pub async fn all_file_paths(&self) -> Result<Vec<(i64, String, i64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, path, size FROM files")
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
                })
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?);
            }
            Ok(out)
        })
        .await
    }

    /// Every persisted file record, used to compute the discovery-vs-store
    /// diff (`spec.md` §4.8 phase 2).
    pub async fn all_files(&self) -> Result<Vec<FileRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, path, language, size, content_hash, last_indexed, line_count, purpose
                     FROM files",
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let rows = stmt
                .query_map([], row_to_file)
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?);
            }
            Ok(out)
        })
        .await
    }

    /// Delete a file and, via `ON DELETE CASCADE`, its symbols, chunks,
    /// graph edges, and file dependencies.
    pub async fn delete_file_by_path(&self, path: String) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM files WHERE path = ?1", params![path])
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            Ok(())
        })
        .await
    }

    /// Drop every row from every table; used by `--full` re-indexing.
    pub async fn clear_all(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "DELETE FROM graph_edges;
                 DELETE FROM file_dependencies;
                 DELETE FROM chunks;
                 DELETE FROM symbols;
                 DELETE FROM files;
                 DELETE FROM summaries;
                 DELETE FROM chunks_fts;
                 DELETE FROM symbols_fts;",
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }
}

fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        path: row.get(1)?,
        language: row.get(2)?,
        size: row.get(3)?,
        content_hash: row.get(4)?,
        last_indexed: row.get(5)?,
        line_count: row.get(6)?,
        purpose: row.get(7)?,
    })
}
