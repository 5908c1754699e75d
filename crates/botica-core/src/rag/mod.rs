//! Semantic retrieval over the product catalog.
//!
//! The per-brand corpus is embedded into a flat, JSON-persisted vector index
//! rebuilt wholesale per run. At query time the retriever embeds the query
//! and returns the top-k documents with their {brand, EAN} metadata, which
//! the search tool joins against the inventory snapshot.

pub mod embeddings;
pub mod index_builder;
pub mod vector_store;

pub use embeddings::{cosine_similarity, EmbeddingGenerator, HashEmbedder, RestEmbeddingClient};
pub use index_builder::{build_from_catalog, build_from_corpus};
pub use vector_store::{DocumentMetadata, IndexedDocument, SearchHit, VectorIndex};

use std::path::Path;
use std::sync::Arc;

use crate::errors::AssistantError;

/// Query-time handle over a loaded index and an embedding generator.
pub struct Retriever {
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingGenerator>,
}

impl Retriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn EmbeddingGenerator>) -> Self {
        Self { index, embedder }
    }

    pub fn load(
        index_path: &Path,
        embedder: Arc<dyn EmbeddingGenerator>,
    ) -> Result<Self, AssistantError> {
        Ok(Self::new(VectorIndex::load(index_path)?, embedder))
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, AssistantError> {
        let query_embedding = self.embedder.embed(query).await?;
        Ok(self.index.search(&query_embedding, top_k))
    }

    pub fn document_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retriever_search() {
        let embedder = Arc::new(HashEmbedder::with_dimension(16));
        let mut index = VectorIndex::new();
        for (text, ean) in [("Crema hidratante", "1"), ("Protector solar", "2")] {
            let embedding = embedder.embed(text).await.unwrap();
            index
                .add_document(
                    IndexedDocument {
                        text: text.to_string(),
                        metadata: DocumentMetadata {
                            brand: "Cepage".to_string(),
                            ean: ean.to_string(),
                        },
                    },
                    embedding,
                )
                .unwrap();
        }

        let retriever = Retriever::new(index, embedder);
        let hits = retriever.search("Crema hidratante", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.metadata.ean, "1");
    }
}
