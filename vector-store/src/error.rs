use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("qdrant error: {0}")]
    Qdrant(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("vector size mismatch: got={got}, want={want}")]
    DimensionMismatch { got: usize, want: usize },
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;
