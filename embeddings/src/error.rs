use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Provider(String),

    #[error("embedding dimension mismatch: got {got}, expected {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("embedding batch failed for items {start}..{end}: {cause}")]
    BatchFailure {
        start: usize,
        end: usize,
        cause: String,
    },
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
