//! Embedding generation for the product index.
//!
//! The index builder and the search tool both go through the
//! `EmbeddingGenerator` trait; production uses the REST client against an
//! OpenAI-style `/embeddings` endpoint, tests and offline development use the
//! deterministic hash embedder.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::errors::AssistantError;

#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AssistantError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Deterministic hash-based embedder for tests and offline runs.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingGenerator for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AssistantError> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        let mut embedding = vec![0.0; self.dimension];
        for (i, value) in embedding.iter_mut().enumerate() {
            let seed = hash.wrapping_add(i as u64);
            *value = ((seed % 1000) as f32 - 500.0) / 500.0;
        }
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// REST embedding client for OpenAI-compatible `/embeddings` endpoints.
pub struct RestEmbeddingClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dimension: usize,
    max_batch_size: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl RestEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, AssistantError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AssistantError::ConfigError("missing embeddings API key".to_string())
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dimension: config.dimension,
            max_batch_size: 100,
        })
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
        let url = format!("{}/embeddings", self.api_base);
        let body = json!({
            "model": self.model,
            "input": inputs,
        });
        log::debug!("Embedding request for {} inputs", inputs.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AssistantError::IndexError(format!(
                "embeddings request failed with status {}: {}",
                status, text
            )));
        }
        let parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != inputs.len() {
            return Err(AssistantError::IndexError(format!(
                "embeddings response carries {} vectors for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingGenerator for RestEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AssistantError> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AssistantError::IndexError("empty embeddings response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.max_batch_size) {
            embeddings.extend(self.request(chunk).await?);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &c).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("Crema hidratante").await.unwrap();
        let b = embedder.embed("Crema hidratante").await.unwrap();
        let c = embedder.embed("Protector solar").await.unwrap();
        assert_eq!(a.len(), 384);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_hash_embedder_batch() {
        let embedder = HashEmbedder::with_dimension(16);
        let texts = vec!["a".to_string(), "b".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].len(), 16);
    }

    #[test]
    fn test_rest_client_requires_api_key() {
        let config = EmbeddingConfig::default();
        assert!(RestEmbeddingClient::new(&config).is_err());
    }
}
