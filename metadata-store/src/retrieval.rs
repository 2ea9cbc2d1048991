//! Batch lookups that join a chunk/symbol to its owning file, so callers in
//! `rk-retriever` assemble search results without a separate per-row file
//! query (`spec.md` §4.7's "batch-load referenced files (avoid N+1)").

use rusqlite::{params, OptionalExtension};

use crate::error::{MetadataStoreError, Result};
use crate::models::{ChunkRecord, ChunkWithFile, SymbolRecord, SymbolWithFile};
use crate::store::MetadataStore;

impl MetadataStore {
    pub async fn chunks_with_file_for_ids(&self, ids: Vec<i64>) -> Result<Vec<ChunkWithFile>> {
        self.with_conn(move |conn| {
            let mut out = Vec::with_capacity(ids.len());
            for id in ids {
                let row = conn
                    .query_row(
                        "SELECT c.id, c.file_id, c.chunk_index, c.content, c.content_hash,
                                c.start_line, c.end_line, c.symbol_names, c.token_count,
                                f.path, f.language
                         FROM chunks c JOIN files f ON f.id = c.file_id
                         WHERE c.id = ?1",
                        params![id],
                        row_to_chunk_with_file,
                    )
                    .optional()
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                if let Some(row) = row {
                    out.push(row);
                }
            }
            Ok(out)
        })
        .await
    }

    pub async fn symbols_with_file_for_ids(&self, ids: Vec<i64>) -> Result<Vec<SymbolWithFile>> {
        self.with_conn(move |conn| {
            let mut out = Vec::with_capacity(ids.len());
            for id in ids {
                let row = conn
                    .query_row(
                        "SELECT s.id, s.file_id, s.name, s.kind, s.signature, s.start_line, s.end_line,
                                s.start_col, s.end_col, s.parent_id, s.docstring, s.exported, s.importance,
                                f.path, f.language
                         FROM symbols s JOIN files f ON f.id = s.file_id
                         WHERE s.id = ?1",
                        params![id],
                        row_to_symbol_with_file,
                    )
                    .optional()
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                if let Some(row) = row {
                    out.push(row);
                }
            }
            Ok(out)
        })
        .await
    }
}

fn row_to_chunk_with_file(row: &rusqlite::Row) -> rusqlite::Result<ChunkWithFile> {
    let names: String = row.get(7)?;
    Ok(ChunkWithFile {
        chunk: ChunkRecord {
            id: row.get(0)?,
            file_id: row.get(1)?,
            chunk_index: row.get(2)?,
            content: row.get(3)?,
            content_hash: row.get(4)?,
            start_line: row.get(5)?,
            end_line: row.get(6)?,
            symbol_names: names.split_whitespace().map(str::to_string).collect(),
            token_count: row.get(8)?,
        },
        file_path: row.get(9)?,
        language: row.get(10)?,
    })
}

fn row_to_symbol_with_file(row: &rusqlite::Row) -> rusqlite::Result<SymbolWithFile> {
    Ok(SymbolWithFile {
        symbol: SymbolRecord {
            id: row.get(0)?,
            file_id: row.get(1)?,
            name: row.get(2)?,
            kind: row.get(3)?,
            signature: row.get(4)?,
            start_line: row.get(5)?,
            end_line: row.get(6)?,
            start_col: row.get(7)?,
            end_col: row.get(8)?,
            parent_id: row.get(9)?,
            docstring: row.get(10)?,
            exported: row.get(11)?,
            importance: row.get(12)?,
        },
        file_path: row.get(13)?,
        language: row.get(14)?,
    })
}
