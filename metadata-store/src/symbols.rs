use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};

use crate::error::{MetadataStoreError, Result};
use crate::models::{NewSymbol, SymbolRecord};
use crate::store::MetadataStore;

impl MetadataStore {
    /// Insert every symbol of one file in a single transaction, resolve
    /// `parent_name` against this file's *top-level* symbols only (per
    /// `spec.md` §3's "nested siblings cannot be parents" invariant), and
    /// return the inserted ids in input order.
    pub async fn insert_symbols_for_file(&self, file_id: i64, symbols: Vec<NewSymbol>) -> Result<Vec<i64>> {
        self.transaction(move |tx| {
            let mut ids = Vec::with_capacity(symbols.len());
            let mut top_level: HashMap<String, i64> = HashMap::new();

            for sym in &symbols {
                tx.execute(
                    "INSERT INTO symbols
                        (file_id, name, kind, signature, start_line, end_line, start_col, end_col,
                         parent_id, docstring, exported, importance)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, ?10, 0)",
                    params![
                        file_id,
                        sym.name,
                        sym.kind,
                        sym.signature,
                        sym.start_line,
                        sym.end_line,
                        sym.start_col,
                        sym.end_col,
                        sym.docstring,
                        sym.exported,
                    ],
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                let id = tx.last_insert_rowid();
                ids.push(id);
                if sym.parent_name.is_none() {
                    top_level.insert(sym.name.clone(), id);
                }
            }

            for (sym, id) in symbols.iter().zip(ids.iter()) {
                if let Some(parent_name) = &sym.parent_name {
                    if let Some(parent_id) = top_level.get(parent_name) {
                        tx.execute(
                            "UPDATE symbols SET parent_id = ?1 WHERE id = ?2",
                            params![parent_id, id],
                        )
                        .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                    }
                }
            }

            Ok(ids)
        })
        .await
    }

    pub async fn symbols_for_file(&self, file_id: i64) -> Result<Vec<SymbolRecord>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, file_id, name, kind, signature, start_line, end_line, start_col, end_col,
                            parent_id, docstring, exported, importance
                     FROM symbols WHERE file_id = ?1 ORDER BY start_line",
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let rows = stmt
                .query_map(params![file_id], row_to_symbol)
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?);
            }
            Ok(out)
        })
        .await
    }

    pub async fn symbol_by_id(&self, id: i64) -> Result<Option<SymbolRecord>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, file_id, name, kind, signature, start_line, end_line, start_col, end_col,
                        parent_id, docstring, exported, importance
                 FROM symbols WHERE id = ?1",
                params![id],
                row_to_symbol,
            )
            .optional()
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }

    /// Symbols whose body contains `name` as a whole word, scoped to one
    /// file — used by the graph builder's import-edge attribution.
    pub async fn symbols_in_file_by_ids(&self, ids: Vec<i64>) -> Result<Vec<SymbolRecord>> {
        self.with_conn(move |conn| {
            let mut out = Vec::new();
            for id in ids {
                if let Some(rec) = conn
                    .query_row(
                        "SELECT id, file_id, name, kind, signature, start_line, end_line, start_col, end_col,
                                parent_id, docstring, exported, importance
                         FROM symbols WHERE id = ?1",
                        params![id],
                        row_to_symbol,
                    )
                    .optional()
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?
                {
                    out.push(rec);
                }
            }
            Ok(out)
        })
        .await
    }

    /// Remove every symbol (and, via cascade, every chunk-independent edge
    /// touching them) belonging to one file — used before re-persisting a
    /// modified file's freshly extracted symbols (`spec.md` §4.8 phase 2).
    pub async fn delete_symbols_for_file(&self, file_id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM symbols WHERE file_id = ?1", params![file_id])
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            Ok(())
        })
        .await
    }

    /// Every persisted symbol, across all files — the base of the
    /// name → candidates index the graph builder resolves import/call
    /// edges against (`spec.md` §4.5 step 1).
    pub async fn all_symbols(&self) -> Result<Vec<SymbolRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, file_id, name, kind, signature, start_line, end_line, start_col, end_col,
                            parent_id, docstring, exported, importance
                     FROM symbols",
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let rows = stmt
                .query_map([], row_to_symbol)
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?);
            }
            Ok(out)
        })
        .await
    }

    /// First symbol matching `name` exactly, used to resolve a
    /// `get_dependencies` identifier to a symbol id (`spec.md` §8 scenario
    /// 3). Ties break on id order; callers that need a specific overload
    /// should disambiguate by file beforehand.
    pub async fn find_symbol_by_name(&self, name: String) -> Result<Option<SymbolRecord>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, file_id, name, kind, signature, start_line, end_line, start_col, end_col,
                        parent_id, docstring, exported, importance
                 FROM symbols WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                row_to_symbol,
            )
            .optional()
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }

    /// Batched importance-score update, e.g. after PageRank.
    pub async fn update_importance_scores(&self, scores: Vec<(i64, f64)>) -> Result<()> {
        self.transaction(move |tx| {
            for (id, score) in scores {
                tx.execute(
                    "UPDATE symbols SET importance = ?1 WHERE id = ?2",
                    params![score, id],
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            }
            Ok(())
        })
        .await
    }
}

fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<SymbolRecord> {
    Ok(SymbolRecord {
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
    })
}
