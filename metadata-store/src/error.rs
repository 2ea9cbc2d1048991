use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataStoreError {
    #[error("sqlite error at {path}: {cause}")]
    Sqlite { path: PathBuf, cause: String },

    #[error("spawn_blocking join failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, MetadataStoreError>;

impl MetadataStoreError {
    pub fn sqlite(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Sqlite {
            path: path.to_path_buf(),
            cause: err.to_string(),
        }
    }
}
