use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrieverError {
    #[error(transparent)]
    Store(#[from] rk_metadata_store::MetadataStoreError),

    #[error(transparent)]
    Vectors(#[from] rk_vector_store::VectorStoreError),

    #[error(transparent)]
    Embedding(#[from] rk_embeddings::EmbeddingError),
}

pub type Result<T> = std::result::Result<T, RetrieverError>;
