//! Tool system backing the assistant's function calls.
//!
//! The hosted assistant requests tools by name mid-run; the registry maps
//! each name to a handler plus its argument schema, so new tools are
//! additive registrations instead of another branch in a dispatch chain.
//! Every tool takes a flat JSON argument map and returns one
//! natural-language string consumed verbatim by the assistant.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::core_types::{ToolCall, ToolMetadata, ToolOutput};
use crate::errors::AssistantError;
use crate::rag::Retriever;

pub mod brands;
pub mod search;
pub mod stock;

pub use brands::{HowManyBrandsTool, IsBrandInDatabaseTool, WhichBrandsTool};
pub use search::SearchInDatabaseTool;
pub use stock::{
    StockAboveThresholdTool, StockBelowThresholdTool, StockBetweenThresholdsTool, StockCountTool,
};

#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> ToolMetadata;
    async fn execute(&self, arguments: Value) -> Result<String, AssistantError>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        self.tools.values().map(|tool| tool.metadata()).collect()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Executes one requested call. An unknown tool name or a failing tool
    /// fails this invocation only; the session decides what that means.
    pub async fn execute_call(&self, call: &ToolCall) -> Result<ToolOutput, AssistantError> {
        let tool = self.get_tool(&call.name).ok_or_else(|| AssistantError::ToolError {
            tool_name: call.name.clone(),
            message: "unknown tool".to_string(),
        })?;
        log::info!("Executing tool {}", call.name);
        let output = tool.execute(call.arguments.clone()).await?;
        Ok(ToolOutput {
            tool_call_id: call.id.clone(),
            output,
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the registry with the full tool surface the assistant is
/// configured with.
pub fn default_registry(
    retriever: Arc<Retriever>,
    stock_path: PathBuf,
    retrieval: &RetrievalConfig,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register_tool(Arc::new(SearchInDatabaseTool::new(
        retriever,
        stock_path.clone(),
        retrieval.k_search,
        retrieval.k_threshold,
    )));
    registry.register_tool(Arc::new(HowManyBrandsTool));
    registry.register_tool(Arc::new(WhichBrandsTool));
    registry.register_tool(Arc::new(IsBrandInDatabaseTool));
    registry.register_tool(Arc::new(StockCountTool::new(stock_path.clone())));
    registry.register_tool(Arc::new(StockBelowThresholdTool::new(stock_path.clone())));
    registry.register_tool(Arc::new(StockAboveThresholdTool::new(stock_path.clone())));
    registry.register_tool(Arc::new(StockBetweenThresholdsTool::new(stock_path)));
    registry
}

/// Coerces a tool argument into an integer threshold. Accepts JSON numbers
/// and numeric strings; anything else fails the invocation.
pub(crate) fn parse_threshold(
    tool_name: &str,
    arguments: &Value,
    key: &str,
) -> Result<i64, AssistantError> {
    let value = arguments.get(key).ok_or_else(|| AssistantError::ToolError {
        tool_name: tool_name.to_string(),
        message: format!("missing parameter '{}'", key),
    })?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .map(|f| f.trunc() as i64)
        .ok_or_else(|| AssistantError::ToolError {
            tool_name: tool_name.to_string(),
            message: format!("parameter '{}' is not numeric", key),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(HowManyBrandsTool));
        assert_eq!(registry.tool_count(), 1);
        assert!(registry.get_tool("how_many_brands").is_some());
        assert!(registry.get_tool("nonexistent").is_none());
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_is_error() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "nope".to_string(),
            arguments: json!({}),
        };
        assert!(registry.execute_call(&call).await.is_err());
    }

    #[test]
    fn test_parse_threshold_accepts_numbers_and_strings() {
        assert_eq!(parse_threshold("t", &json!({"threshold": 5}), "threshold").unwrap(), 5);
        assert_eq!(parse_threshold("t", &json!({"threshold": "12"}), "threshold").unwrap(), 12);
        assert_eq!(parse_threshold("t", &json!({"threshold": 7.9}), "threshold").unwrap(), 7);
        assert!(parse_threshold("t", &json!({"threshold": "doce"}), "threshold").is_err());
        assert!(parse_threshold("t", &json!({}), "threshold").is_err());
    }
}
