//! Embedding providers.
//!
//! The pipeline treats embedding as a pure function from text to a
//! fixed-dimension vector and assumes nothing about dimensionality or
//! distance metric. [`OllamaEmbedder`] talks to a local Ollama endpoint;
//! [`MockEmbedder`] produces deterministic vectors for tests and offline
//! runs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Converts chunk texts into embedding vectors, one per input, in order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds every text in the batch. A failure on any item fails the call
    /// as a whole; partial results are never returned.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Name of the model producing the vectors.
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedding client for a local Ollama endpoint.
///
/// The endpoint has no native batch support, so batches are embedded with
/// sequential per-text requests. No retry is attempted; a failed request
/// surfaces immediately as [`RagError::Embedding`].
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:11434";

    /// Creates an embedder against the default local endpoint.
    pub fn new(model: impl Into<String>) -> Result<Self, RagError> {
        Self::with_base_url(Self::DEFAULT_BASE_URL, model)
    }

    /// Creates an embedder against a custom endpoint.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            model: model.into(),
        })
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(RagError::embedding(format!(
                "embedding request failed: HTTP {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|err| RagError::embedding(format!("invalid embedding response: {err}")))?;
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Deterministic embedder for tests and offline runs.
///
/// Vectors are derived from a hash of the input text: identical texts map to
/// identical vectors, distinct texts to distinct vectors.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dims: usize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self { dims: 8 }
    }

    pub fn with_dims(dims: usize) -> Self {
        Self { dims }
    }

    fn hash_to_vec(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dims)
            .map(|i| {
                let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
                (bits as f32) / u32::MAX as f32
            })
            .collect()
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.hash_to_vec(text)).collect())
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new();
        let texts = vec![
            "hello world".to_string(),
            "goodbye world".to_string(),
            "hello world".to_string(),
        ];

        let first = embedder.embed_batch(&texts).await.unwrap();
        let second = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);
        assert_eq!(first[0].len(), 8);
    }

    #[tokio::test]
    async fn ollama_embedder_returns_vectors_in_order() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/embeddings")
                    .json_body(json!({"model": "test-model", "prompt": "alpha"}));
                then.status(200)
                    .json_body(json!({"embedding": [1.0, 0.0, 0.0]}));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/embeddings")
                    .json_body(json!({"model": "test-model", "prompt": "beta"}));
                then.status(200)
                    .json_body(json!({"embedding": [0.0, 1.0, 0.0]}));
            })
            .await;

        let embedder = OllamaEmbedder::with_base_url(server.base_url(), "test-model").unwrap();
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_surfaces_as_embedding_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embeddings");
                then.status(500).body("model not loaded");
            })
            .await;

        let embedder = OllamaEmbedder::with_base_url(server.base_url(), "test-model").unwrap();
        let err = embedder
            .embed_batch(&["alpha".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[tokio::test]
    async fn malformed_response_surfaces_as_embedding_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embeddings");
                then.status(200).json_body(json!({"unexpected": true}));
            })
            .await;

        let embedder = OllamaEmbedder::with_base_url(server.base_url(), "test-model").unwrap();
        let err = embedder
            .embed_batch(&["alpha".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }
}
