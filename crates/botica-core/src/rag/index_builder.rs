//! Wholesale index construction from the corpus or the catalog CSV export.
//!
//! Each corpus line (or catalog CSV row) becomes one indexed document with
//! {brand, EAN} metadata. A brand whose source file is missing or unreadable
//! is logged and skipped so one broken export cannot take down the rebuild;
//! an entirely empty document set is an error. The previous index file is
//! removed before building; there are no merge semantics.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::catalog::BRANDS;
use crate::corpus::CatalogRow;
use crate::errors::AssistantError;
use crate::rag::embeddings::EmbeddingGenerator;
use crate::rag::vector_store::{DocumentMetadata, IndexedDocument, VectorIndex};

fn ean_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Código EAN (\d+)").unwrap())
}

/// Pulls the EAN out of a composed corpus line.
fn extract_ean(line: &str) -> String {
    ean_re()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn collect_from_corpus(corpus_dir: &Path) -> Vec<IndexedDocument> {
    let mut documents = Vec::new();
    for brand in BRANDS {
        let path = corpus_dir.join(brand.corpus_file_name());
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                log::error!("Skipping corpus file {}: {}", path.display(), e);
                continue;
            }
        };
        let before = documents.len();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            documents.push(IndexedDocument {
                text: line.to_string(),
                metadata: DocumentMetadata {
                    brand: brand.name.to_string(),
                    ean: extract_ean(line),
                },
            });
        }
        log::info!(
            "Collected {} documents for brand {}",
            documents.len() - before,
            brand.name
        );
    }
    documents
}

fn collect_from_catalog(catalog_dir: &Path) -> Vec<IndexedDocument> {
    let mut documents = Vec::new();
    for brand in BRANDS {
        let path = catalog_dir.join(format!("{}.csv", brand.table_stem));
        let reader = match csv::Reader::from_path(&path) {
            Ok(reader) => reader,
            Err(e) => {
                log::error!("Skipping catalog file {}: {}", path.display(), e);
                continue;
            }
        };
        let before = documents.len();
        for row in reader.into_deserialize::<CatalogRow>() {
            match row {
                Ok(row) => documents.push(IndexedDocument {
                    text: row.texto,
                    metadata: DocumentMetadata {
                        brand: brand.name.to_string(),
                        ean: row.ean.trim().to_string(),
                    },
                }),
                Err(e) => log::warn!("Bad row in {}: {}", path.display(), e),
            }
        }
        log::info!(
            "Collected {} documents for brand {}",
            documents.len() - before,
            brand.name
        );
    }
    documents
}

async fn build(
    documents: Vec<IndexedDocument>,
    embedder: &dyn EmbeddingGenerator,
    index_path: &Path,
) -> Result<VectorIndex, AssistantError> {
    if documents.is_empty() {
        return Err(AssistantError::IndexError(
            "no documents collected, refusing to build an empty index".to_string(),
        ));
    }
    if index_path.exists() {
        log::info!("Removing previous index at {}", index_path.display());
        std::fs::remove_file(index_path)?;
    }

    let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    let mut index = VectorIndex::new();
    for (document, embedding) in documents.into_iter().zip(embeddings) {
        index.add_document(document, embedding)?;
    }
    index.save(index_path)?;
    Ok(index)
}

/// Rebuilds the index from the per-brand corpus text files.
pub async fn build_from_corpus(
    corpus_dir: &Path,
    embedder: &dyn EmbeddingGenerator,
    index_path: &Path,
) -> Result<VectorIndex, AssistantError> {
    build(collect_from_corpus(corpus_dir), embedder, index_path).await
}

/// Rebuilds the index from the per-brand catalog CSV exports, which carry
/// the EAN explicitly.
pub async fn build_from_catalog(
    catalog_dir: &Path,
    embedder: &dyn EmbeddingGenerator,
    index_path: &Path,
) -> Result<VectorIndex, AssistantError> {
    build(collect_from_catalog(catalog_dir), embedder, index_path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::HashEmbedder;

    #[test]
    fn test_extract_ean() {
        assert_eq!(
            extract_ean("Producto X. Código EAN 7798008411011. Descripción: y."),
            "7798008411011"
        );
        assert_eq!(extract_ean("sin código"), "");
    }

    #[tokio::test]
    async fn test_build_from_corpus_skips_missing_brands() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        let index_path = index_dir.path().join("index.json");

        std::fs::write(
            corpus.path().join("cepage_all.txt"),
            "Producto A. Código EAN 1. Descripción: a.\nProducto B. Código EAN 2. Descripción: b.",
        )
        .unwrap();

        let embedder = HashEmbedder::with_dimension(8);
        let index = build_from_corpus(corpus.path(), &embedder, &index_path).await.unwrap();
        assert_eq!(index.len(), 2);
        assert!(index_path.exists());

        let loaded = VectorIndex::load(&index_path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[tokio::test]
    async fn test_build_replaces_previous_index() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        let index_path = index_dir.path().join("index.json");
        let embedder = HashEmbedder::with_dimension(8);

        std::fs::write(
            corpus.path().join("cepage_all.txt"),
            "Producto A. Código EAN 1.\nProducto B. Código EAN 2.",
        )
        .unwrap();
        build_from_corpus(corpus.path(), &embedder, &index_path).await.unwrap();

        // Rebuild from a shrunken corpus; the old documents must be gone.
        std::fs::write(corpus.path().join("cepage_all.txt"), "Producto C. Código EAN 3.").unwrap();
        let index = build_from_corpus(corpus.path(), &embedder, &index_path).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(VectorIndex::load(&index_path).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_error() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        let embedder = HashEmbedder::with_dimension(8);
        let result =
            build_from_corpus(corpus.path(), &embedder, &index_dir.path().join("i.json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_from_catalog_carries_ean_metadata() {
        let catalog = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        let index_path = index_dir.path().join("index.json");

        let mut writer = csv::Writer::from_path(catalog.path().join("vichy.csv")).unwrap();
        writer
            .serialize(CatalogRow {
                ean: "555".to_string(),
                texto: "Producto V. Marca Vichy.".to_string(),
            })
            .unwrap();
        writer.flush().unwrap();
        drop(writer);

        let embedder = HashEmbedder::with_dimension(8);
        let index = build_from_catalog(catalog.path(), &embedder, &index_path).await.unwrap();
        assert_eq!(index.len(), 1);
        let hits = index.search(&embedder.embed("Producto V").await.unwrap(), 1);
        assert_eq!(hits[0].document.metadata.ean, "555");
        assert_eq!(hits[0].document.metadata.brand, "Vichy");
    }
}
