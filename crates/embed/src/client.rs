use async_trait::async_trait;
use locscout_common::{LocScoutError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::provider::EmbeddingProvider;
use crate::types::{EmbedRequest, EmbedResponse};

/// Embedding provider backed by an Ollama-compatible HTTP API
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaEmbedder {
    /// Create new embedder for `model` served at `base_url`
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            LocScoutError::config(format!("Failed to create HTTP client: {}", e))
        })?;

        info!("Embedding client initialized: {} (model={})", base_url, model);
        Ok(Self {
            base_url,
            model,
            client,
        })
    }

    /// Test connection to the embedding server
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            LocScoutError::provider_unavailable(format!("Failed to connect to {}: {}", url, e))
        })?;
        Ok(response.status().is_success())
    }

    fn embeddings_url(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    /// Single attempt; callers decide whether to retry
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        debug!(
            "Generating embedding - Model: {}, Text length: {}",
            request.model,
            text.len()
        );

        let response = self
            .client
            .post(self.embeddings_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                LocScoutError::provider_unavailable(format!(
                    "Failed to send embedding request: {}",
                    e
                ))
            })?
            .error_for_status()
            .map_err(|e| {
                LocScoutError::provider_unavailable(format!("Embedding API error: {}", e))
            })?;

        let result: EmbedResponse = response.json().await.map_err(|e| {
            LocScoutError::provider_unavailable(format!(
                "Failed to parse embedding response: {}",
                e
            ))
        })?;

        if result.embedding.is_empty() {
            return Err(LocScoutError::provider_unavailable(
                "Empty embedding returned by provider",
            ));
        }

        debug!("Received embedding - Dimension: {}", result.embedding.len());
        Ok(result.embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
