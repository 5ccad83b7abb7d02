use async_trait::async_trait;
use locscout_common::Result;

/// Turns query text into a fixed-length embedding vector
///
/// Implementations are deterministic for a fixed model and must return either a
/// complete vector or an error, never a partial one.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Encode text into an embedding
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Name of the model backing this provider
    fn model(&self) -> &str;
}
