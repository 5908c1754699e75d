//! Semantic product search joined with live inventory data.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core_types::ToolMetadata;
use crate::errors::AssistantError;
use crate::inventory::load_snapshot;
use crate::rag::Retriever;
use crate::tools::Tool;

const NOT_FOUND: &str = "No se encontraron productos en la base de datos.";

/// `search_in_database`: retrieves the top `k_search` documents for the
/// user's problem, joins them with the stock snapshot by EAN, and keeps the
/// first `k_threshold` joined results in retrieval-rank order. Documents
/// without stock data are invisible to the customer.
pub struct SearchInDatabaseTool {
    retriever: Arc<Retriever>,
    stock_path: PathBuf,
    k_search: usize,
    k_threshold: usize,
}

impl SearchInDatabaseTool {
    pub fn new(
        retriever: Arc<Retriever>,
        stock_path: PathBuf,
        k_search: usize,
        k_threshold: usize,
    ) -> Self {
        Self {
            retriever,
            stock_path,
            k_search,
            k_threshold,
        }
    }
}

#[async_trait]
impl Tool for SearchInDatabaseTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "search_in_database".to_string(),
            description: "Busca productos relevantes para el problema del cliente y devuelve \
                          su información junto con stock, precio y promoción"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "problem": {
                        "type": "string",
                        "description": "El problema o la necesidad descripta por el cliente"
                    }
                },
                "required": ["problem"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, AssistantError> {
        let problem = arguments
            .get("problem")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AssistantError::ToolError {
                tool_name: "search_in_database".to_string(),
                message: "missing parameter 'problem'".to_string(),
            })?;

        let hits = self.retriever.search(problem, self.k_search).await?;
        let stock_by_ean: HashMap<String, String> = load_snapshot(&self.stock_path)?
            .into_iter()
            .map(|r| {
                let line = format!(
                    "Stock: {}. Precio: ${}. Promoción: {}.",
                    r.stock, r.precio, r.promo
                );
                (r.ean.clone(), line)
            })
            .collect();

        let mut context = Vec::new();
        for hit in &hits {
            let ean = &hit.document.metadata.ean;
            if ean.is_empty() {
                continue;
            }
            if let Some(stock_line) = stock_by_ean.get(ean) {
                context.push(format!("{} {}", hit.document.text, stock_line));
                if context.len() >= self.k_threshold {
                    break;
                }
            }
        }

        if context.is_empty() {
            log::info!("No stocked products matched problem {:?}", problem);
            return Ok(format!("Contexto: {}", NOT_FOUND));
        }
        Ok(format!("Contexto: {}", context.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{write_snapshot, StockRecord};
    use crate::rag::{
        DocumentMetadata, EmbeddingGenerator, HashEmbedder, IndexedDocument, VectorIndex,
    };

    fn record(ean: &str, stock: i64) -> StockRecord {
        StockRecord {
            codigo: "F01".to_string(),
            ean: ean.to_string(),
            stock,
            precio: 1500.0,
            promo: "2x1".to_string(),
            descripcion: String::new(),
        }
    }

    async fn retriever_with_documents(docs: &[(&str, &str)]) -> Retriever {
        let embedder = Arc::new(HashEmbedder::with_dimension(16));
        let mut index = VectorIndex::new();
        for (text, ean) in docs {
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
        Retriever::new(index, embedder)
    }

    #[tokio::test]
    async fn test_search_joins_only_stocked_products() {
        let dir = tempfile::tempdir().unwrap();
        let stock_path = dir.path().join("stock.csv");
        // EAN 2 has no stock entry (filtered at sync time); EAN 3 unknown.
        write_snapshot(&[record("1", 5)], &stock_path).unwrap();

        let retriever = retriever_with_documents(&[
            ("Crema A", "1"),
            ("Crema B", "2"),
            ("Crema C", "3"),
        ])
        .await;
        let tool = SearchInDatabaseTool::new(Arc::new(retriever), stock_path, 30, 5);

        let out = tool.execute(json!({"problem": "crema"})).await.unwrap();
        assert!(out.starts_with("Contexto: "));
        assert!(out.contains("Crema A Stock: 5. Precio: $1500. Promoción: 2x1."));
        assert!(!out.contains("Crema B"));
        assert!(!out.contains("Crema C"));
    }

    #[tokio::test]
    async fn test_search_truncates_to_k_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let stock_path = dir.path().join("stock.csv");
        let records: Vec<StockRecord> = (1..=8).map(|i| record(&i.to_string(), i)).collect();
        write_snapshot(&records, &stock_path).unwrap();

        let docs: Vec<(String, String)> = (1..=8)
            .map(|i| (format!("Producto {}", i), i.to_string()))
            .collect();
        let doc_refs: Vec<(&str, &str)> =
            docs.iter().map(|(t, e)| (t.as_str(), e.as_str())).collect();
        let retriever = retriever_with_documents(&doc_refs).await;
        let tool = SearchInDatabaseTool::new(Arc::new(retriever), stock_path, 30, 5);

        let out = tool.execute(json!({"problem": "producto"})).await.unwrap();
        let lines = out.trim_start_matches("Contexto: ").lines().count();
        assert_eq!(lines, 5);
    }

    #[tokio::test]
    async fn test_search_no_stock_returns_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let stock_path = dir.path().join("stock.csv");
        write_snapshot(&[], &stock_path).unwrap();

        let retriever = retriever_with_documents(&[("Crema A", "1")]).await;
        let tool = SearchInDatabaseTool::new(Arc::new(retriever), stock_path, 30, 5);

        let out = tool.execute(json!({"problem": "crema"})).await.unwrap();
        assert_eq!(out, format!("Contexto: {}", NOT_FOUND));
    }
}
