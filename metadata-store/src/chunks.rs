use rusqlite::{params, OptionalExtension};

use crate::error::{MetadataStoreError, Result};
use crate::models::{ChunkRecord, NewChunk};
use crate::store::MetadataStore;

impl MetadataStore {
    /// Insert one file's chunks in a single transaction.
    pub async fn insert_chunks_for_file(&self, file_id: i64, chunks: Vec<NewChunk>) -> Result<Vec<i64>> {
        self.transaction(move |tx| {
            let mut ids = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                let names = chunk.symbol_names.join(" ");
                tx.execute(
                    "INSERT INTO chunks
                        (file_id, chunk_index, content, content_hash, start_line, end_line, symbol_names, token_count)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        file_id,
                        chunk.chunk_index,
                        chunk.content,
                        chunk.content_hash,
                        chunk.start_line,
                        chunk.end_line,
                        names,
                        chunk.token_count,
                    ],
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                ids.push(tx.last_insert_rowid());
            }
            Ok(ids)
        })
        .await
    }

    pub async fn chunks_for_file(&self, file_id: i64) -> Result<Vec<ChunkRecord>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, file_id, chunk_index, content, content_hash, start_line, end_line, symbol_names, token_count
                     FROM chunks WHERE file_id = ?1 ORDER BY chunk_index",
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let rows = stmt
                .query_map(params![file_id], row_to_chunk)
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?);
            }
            Ok(out)
        })
        .await
    }

    /// Total chunk count across every file, for `index_state.total_chunks`
    /// (`spec.md` §4.8 phase 11).
    pub async fn count_chunks(&self) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }

    /// Remove every chunk belonging to one file — used before re-persisting
    /// a modified file's freshly computed chunks (`spec.md` §4.8 phase 2).
    pub async fn delete_chunks_for_file(&self, file_id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM chunks WHERE file_id = ?1", params![file_id])
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            Ok(())
        })
        .await
    }

    pub async fn chunk_by_id(&self, id: i64) -> Result<Option<ChunkRecord>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, file_id, chunk_index, content, content_hash, start_line, end_line, symbol_names, token_count
                 FROM chunks WHERE id = ?1",
                params![id],
                row_to_chunk,
            )
            .optional()
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }
}

fn row_to_chunk(row: &rusqlite::Row) -> rusqlite::Result<ChunkRecord> {
    let names: String = row.get(7)?;
    Ok(ChunkRecord {
        id: row.get(0)?,
        file_id: row.get(1)?,
        chunk_index: row.get(2)?,
        content: row.get(3)?,
        content_hash: row.get(4)?,
        start_line: row.get(5)?,
        end_line: row.get(6)?,
        symbol_names: names.split_whitespace().map(str::to_string).collect(),
        token_count: row.get(8)?,
    })
}
