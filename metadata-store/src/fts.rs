use rusqlite::params;

use crate::error::{MetadataStoreError, Result};
use crate::models::FtsHit;
use crate::store::MetadataStore;

impl MetadataStore {
    /// Repopulate both FTS5 tables from their base tables. Called once at
    /// the end of a mutation batch (see `spec.md` §4.8 phase 2's "defer
    /// full-text index rebuilds until after the batch").
    pub async fn rebuild_fts(&self) -> Result<()> {
        self.transaction(|tx| {
            tx.execute_batch(
                "DELETE FROM chunks_fts;
                 DELETE FROM symbols_fts;",
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;

            tx.execute(
                "INSERT INTO chunks_fts (content, file_path, symbol_names, chunk_id)
                 SELECT c.content, f.path, c.symbol_names, c.id
                 FROM chunks c JOIN files f ON f.id = c.file_id",
                [],
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;

            tx.execute(
                "INSERT INTO symbols_fts (name, signature, docstring, symbol_id)
                 SELECT name, COALESCE(signature, ''), COALESCE(docstring, ''), id
                 FROM symbols",
                [],
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;

            Ok(())
        })
        .await
    }

    /// Query `chunks_fts`. `match_expr` is the caller's already-tokenized
    /// `OR`-joined expression (see `rk-retriever`'s tokenizer); a syntax
    /// error is swallowed and yields an empty result (`spec.md` §7
    /// *FullTextSyntaxError*).
    pub async fn search_chunks_fts(&self, match_expr: String, limit: i64) -> Result<Vec<FtsHit>> {
        self.with_conn(move |conn| {
            let mut stmt = match conn.prepare(
                "SELECT chunk_id, bm25(chunks_fts) FROM chunks_fts WHERE chunks_fts MATCH ?1
                 ORDER BY bm25(chunks_fts) LIMIT ?2",
            ) {
                Ok(s) => s,
                Err(_) => return Ok(Vec::new()),
            };
            let rows = stmt.query_map(params![match_expr, limit], |row| {
                Ok(FtsHit {
                    row_id: row.get(0)?,
                    rank: row.get(1)?,
                })
            });
            let rows = match rows {
                Ok(r) => r,
                Err(_) => return Ok(Vec::new()),
            };
            let mut out = Vec::new();
            for row in rows {
                match row {
                    Ok(hit) => out.push(hit),
                    Err(_) => return Ok(Vec::new()),
                }
            }
            Ok(out)
        })
        .await
    }

    pub async fn search_symbols_fts(&self, match_expr: String, limit: i64) -> Result<Vec<FtsHit>> {
        self.with_conn(move |conn| {
            let mut stmt = match conn.prepare(
                "SELECT symbol_id, bm25(symbols_fts) FROM symbols_fts WHERE symbols_fts MATCH ?1
                 ORDER BY bm25(symbols_fts) LIMIT ?2",
            ) {
                Ok(s) => s,
                Err(_) => return Ok(Vec::new()),
            };
            let rows = stmt.query_map(params![match_expr, limit], |row| {
                Ok(FtsHit {
                    row_id: row.get(0)?,
                    rank: row.get(1)?,
                })
            });
            let rows = match rows {
                Ok(r) => r,
                Err(_) => return Ok(Vec::new()),
            };
            let mut out = Vec::new();
            for row in rows {
                match row {
                    Ok(hit) => out.push(hit),
                    Err(_) => return Ok(Vec::new()),
                }
            }
            Ok(out)
        })
        .await
    }
}
