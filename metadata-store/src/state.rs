use rusqlite::{params, OptionalExtension};

use crate::error::{MetadataStoreError, Result};
use crate::models::StateEntry;
use crate::store::MetadataStore;

impl MetadataStore {
    /// Upsert one `index_state` row (`spec.md` §3's `StateEntry`).
    pub async fn set(&self, key: String, value: String) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO index_state (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            Ok(())
        })
        .await
    }

    pub async fn get(&self, key: String) -> Result<Option<String>> {
        self.with_conn(move |conn| {
            conn.query_row("SELECT value FROM index_state WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))
        })
        .await
    }

    /// Upsert several `index_state` rows in one batched transaction, the
    /// way `spec.md` §4.8 phase 11 sets `last_indexed`, `embedding_model`,
    /// `total_files`, and `total_chunks` together at the end of a run.
    pub async fn set_many(&self, entries: Vec<StateEntry>) -> Result<()> {
        self.transaction(move |tx| {
            for entry in &entries {
                tx.execute(
                    "INSERT INTO index_state (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![entry.key, entry.value],
                )
                .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            }
            Ok(())
        })
        .await
    }

    /// Upsert a scope-level summary (`spec.md` §4.8 phase 10).
    pub async fn upsert_summary(&self, scope_type: String, scope_id: String, content: String, token_count: i64) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO summaries (scope_type, scope_id, content, token_count)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(scope_type, scope_id) DO UPDATE SET
                     content = excluded.content, token_count = excluded.token_count",
                params![scope_type, scope_id, content, token_count],
            )
            .map_err(|e| MetadataStoreError::sqlite(std::path::Path::new(""), e))?;
            Ok(())
        })
        .await
    }
}
