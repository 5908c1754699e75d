//! Error types for failure handling across the assistant.
//!
//! A single unified error hierarchy covers every subsystem: the catalog
//! pipeline, the vector index, the inventory sync, tool execution, and the
//! hosted assistant protocol. Categorizing errors by source lets the CLI and
//! the session loop decide which failures abort a run and which are skipped
//! with a log line.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AssistantError {
    #[error("Assistant API interaction failed: {0}")]
    AssistantApi(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolError { tool_name: String, message: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("Catalog error: {0}")]
    CatalogError(String),
    #[error("Index error: {0}")]
    IndexError(String),
    #[error("Inventory error: {0}")]
    InventoryError(String),
    #[error("Spreadsheet API error: {0}")]
    SheetError(String),
    #[error("Log export failed: {0}")]
    ExportError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for AssistantError {
    fn from(err: std::io::Error) -> Self {
        AssistantError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::AssistantApi(err.to_string())
    }
}

impl From<serde_json::Error> for AssistantError {
    fn from(err: serde_json::Error) -> Self {
        AssistantError::ParsingError(err.to_string())
    }
}

impl From<csv::Error> for AssistantError {
    fn from(err: csv::Error) -> Self {
        AssistantError::InventoryError(err.to_string())
    }
}
