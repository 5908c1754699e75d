//! Persisted vector index over the product corpus.
//!
//! The index is a flat JSON file: document texts with their {brand, EAN}
//! metadata and one embedding per document. It is rebuilt wholesale on every
//! index run, with no incremental updates, and replaced atomically so
//! a concurrent reader never observes a half-written file.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::errors::AssistantError;
use crate::rag::embeddings::cosine_similarity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub brand: String,
    pub ean: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: IndexedDocument,
    pub score: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    documents: Vec<IndexedDocument>,
    embeddings: Vec<Vec<f32>>,
    dimension: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(
        &mut self,
        document: IndexedDocument,
        embedding: Vec<f32>,
    ) -> Result<(), AssistantError> {
        if let Some(expected) = self.dimension {
            if embedding.len() != expected {
                return Err(AssistantError::IndexError(format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    expected,
                    embedding.len()
                )));
            }
        } else {
            self.dimension = Some(embedding.len());
        }
        self.documents.push(document);
        self.embeddings.push(embedding);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Top-k documents by cosine similarity, best first.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .zip(self.embeddings.iter())
            .map(|(document, embedding)| SearchHit {
                document: document.clone(),
                score: cosine_similarity(query_embedding, embedding),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        hits
    }

    /// Serializes the index to `path`, writing to a temporary file in the
    /// same directory and renaming over the target.
    pub fn save(&self, path: &Path) -> Result<(), AssistantError> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let data = serde_json::to_vec(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&data)?;
        tmp.persist(path)
            .map_err(|e| AssistantError::IndexError(e.to_string()))?;
        log::info!("Index with {} documents written to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, AssistantError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AssistantError::IndexError(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&data)?)
    }
}
