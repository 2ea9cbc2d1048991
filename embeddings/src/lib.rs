//! The `EmbeddingProvider` contract (`spec.md` §6) and its implementations:
//! an Ollama HTTP backend grounded on
//! `rag_store::embed::ollama::OllamaEmbedder`, and a deterministic provider
//! used by tests and as a last-resort local fallback.
//!
//! Initialization is lazy and shared: concurrent callers of `initialize`
//! all await the same `tokio::sync::OnceCell`, per `spec.md` §5.

mod deterministic;
mod error;
mod ollama;

pub use deterministic::DeterministicEmbeddingProvider;
pub use error::{EmbeddingError, Result};
pub use ollama::{OllamaConfig, OllamaEmbeddingProvider};

use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Batched, async text-to-vector function with a declared output dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One-shot probe embedding to confirm the model is reachable and its
    /// output dimension matches `dimensions()`. Fatal on mismatch
    /// (`spec.md` §7 *DimensionMismatch*).
    async fn initialize(&self) -> Result<()>;

    /// Embed a batch of texts, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    async fn dispose(&self) -> Result<()> {
        Ok(())
    }

    fn model_id(&self) -> &str;

    fn dimensions(&self) -> usize;
}

/// Wraps any `EmbeddingProvider` so that `initialize` runs at most once,
/// with concurrent callers sharing the same in-flight future.
pub struct LazyEmbeddingProvider<P: EmbeddingProvider> {
    inner: P,
    init: OnceCell<()>,
}

impl<P: EmbeddingProvider> LazyEmbeddingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            init: OnceCell::new(),
        }
    }

    /// Ensure `initialize` has run exactly once across all callers.
    pub async fn ensure_initialized(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| async { self.inner.initialize().await })
            .await
            .map(|_| ())
    }

    pub fn provider(&self) -> &P {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn initialize(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 4])
        }
        fn model_id(&self) -> &str {
            "counting"
        }
        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn concurrent_initialize_calls_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = Arc::new(LazyEmbeddingProvider::new(CountingProvider {
            calls: calls.clone(),
        }));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lazy = lazy.clone();
            handles.push(tokio::spawn(async move { lazy.ensure_initialized().await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
