use std::collections::HashSet;

use rusqlite::{params, OptionalExtension};

use crate::error::{MetadataStoreError, Result};
use crate::models::{
    FileRecord, GraphEdgeRecord, NewFileDependency, NewGraphEdge, SymbolRecord, SymbolWithFile,
};
use crate::store::MetadataStore;

impl MetadataStore {
    /// Insert edges in one batched transaction; `(source, target, type)`
    /// duplicates are ignored per `spec.md` §4.5.
    pub async fn insert_graph_edges(&self, edges: Vec<NewGraphEdge>) -> Result<()> {
        self.transaction(move |tx| {
            for edge in &edges {
                tx.execute(
                    "INSERT OR IGNORE INTO graph_edges
                        (source_symbol_id, target_symbol_id, edge_type, weight, source_file_id, target_file_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        edge.source_symbol_id,
                        edge.target_symbol_id,
                        edge.edge_type.as_str(),
                        edge.weight,
                        edge.source_file_id,
                        edge.target_file_id,
                    ],
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            }
            Ok(())
        })
        .await
    }

    pub async fn insert_file_dependencies(&self, deps: Vec<NewFileDependency>) -> Result<()> {
        self.transaction(move |tx| {
            for dep in &deps {
                tx.execute(
                    "INSERT OR IGNORE INTO file_dependencies (source_file_id, target_file_id, dependency_type)
                     VALUES (?1, ?2, ?3)",
                    params![dep.source_file_id, dep.target_file_id, dep.dependency_type],
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            }
            Ok(())
        })
        .await
    }

    /// Remove every edge touching one file, as source or target — used
    /// before rebuilding a modified file's graph edges (`spec.md` §4.8
    /// phase 2). Edges are also covered transitively by symbol cascade
    /// delete, but the file can outlive its symbols for one transaction
    /// during a modified re-index, so this is explicit rather than relied
    /// upon.
    pub async fn delete_graph_edges_for_file(&self, file_id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM graph_edges WHERE source_file_id = ?1 OR target_file_id = ?1",
                params![file_id],
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            Ok(())
        })
        .await
    }

    /// Remove every file dependency touching one file, as source or target.
    pub async fn delete_file_dependencies_for_file(&self, file_id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM file_dependencies WHERE source_file_id = ?1 OR target_file_id = ?1",
                params![file_id],
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            Ok(())
        })
        .await
    }

    /// All edges, for the ranker to build its in-memory graph.
    pub async fn all_graph_edges(&self) -> Result<Vec<GraphEdgeRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, source_symbol_id, target_symbol_id, edge_type, weight, source_file_id, target_file_id
                     FROM graph_edges",
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(GraphEdgeRecord {
                        id: row.get(0)?,
                        source_symbol_id: row.get(1)?,
                        target_symbol_id: row.get(2)?,
                        edge_type: row.get(3)?,
                        weight: row.get(4)?,
                        source_file_id: row.get(5)?,
                        target_file_id: row.get(6)?,
                    })
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

    pub async fn all_symbol_ids(&self) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id FROM symbols")
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, i64>(0))
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?);
            }
            Ok(out)
        })
        .await
    }

    /// Breadth-first traversal of `graph_edges` out of `symbol_id`, up to
    /// `depth` hops, returning every distinct symbol reached (joined with
    /// its owning file) in discovery order. `spec.md` §8 scenario 3:
    /// `get_dependencies` from `caller` at `depth=1` returns `foo`.
    pub async fn symbol_dependencies(&self, symbol_id: i64, depth: usize) -> Result<Vec<SymbolWithFile>> {
        self.with_conn(move |conn| {
            let mut visited: HashSet<i64> = HashSet::new();
            visited.insert(symbol_id);
            let mut order: Vec<i64> = Vec::new();
            let mut frontier = vec![symbol_id];

            for _ in 0..depth.max(1) {
                if frontier.is_empty() {
                    break;
                }
                let placeholders = placeholders(frontier.len());
                let sql = format!(
                    "SELECT DISTINCT target_symbol_id FROM graph_edges WHERE source_symbol_id IN ({placeholders})"
                );
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(frontier.iter()), |row| row.get::<_, i64>(0))
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;

                let mut next_frontier = Vec::new();
                for row in rows {
                    let target = row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                    if visited.insert(target) {
                        order.push(target);
                        next_frontier.push(target);
                    }
                }
                frontier = next_frontier;
            }

            let mut out = Vec::with_capacity(order.len());
            for id in order {
                if let Some(rec) = conn
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
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?
                {
                    out.push(rec);
                }
            }
            Ok(out)
        })
        .await
    }

    /// Breadth-first traversal of `file_dependencies` out of `file_id`, up
    /// to `depth` hops, returning every distinct file reached in discovery
    /// order.
    pub async fn file_dependencies_transitive(&self, file_id: i64, depth: usize) -> Result<Vec<FileRecord>> {
        self.with_conn(move |conn| {
            let mut visited: HashSet<i64> = HashSet::new();
            visited.insert(file_id);
            let mut order: Vec<i64> = Vec::new();
            let mut frontier = vec![file_id];

            for _ in 0..depth.max(1) {
                if frontier.is_empty() {
                    break;
                }
                let placeholders = placeholders(frontier.len());
                let sql = format!(
                    "SELECT DISTINCT target_file_id FROM file_dependencies WHERE source_file_id IN ({placeholders})"
                );
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(frontier.iter()), |row| row.get::<_, i64>(0))
                    .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;

                let mut next_frontier = Vec::new();
                for row in rows {
                    let target = row.map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
                    if visited.insert(target) {
                        order.push(target);
                        next_frontier.push(target);
                    }
                }
                frontier = next_frontier;
            }

            let mut out = Vec::with_capacity(order.len());
            for id in order {
                if let Some(rec) = conn
                    .query_row(
                        "SELECT id, path, language, size, content_hash, last_indexed, line_count, purpose
                         FROM files WHERE id = ?1",
                        params![id],
                        row_to_file,
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
}

fn placeholders(count: usize) -> String {
    (1..=count).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
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
