//! Inventory counting tools: single linear scans over the stock snapshot.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::core_types::ToolMetadata;
use crate::errors::AssistantError;
use crate::inventory::{load_snapshot, StockRecord};
use crate::tools::{parse_threshold, Tool};

fn count_matching<F>(path: &PathBuf, predicate: F) -> Result<usize, AssistantError>
where
    F: Fn(&StockRecord) -> bool,
{
    Ok(load_snapshot(path)?.iter().filter(|r| predicate(r)).count())
}

pub struct StockCountTool {
    stock_path: PathBuf,
}

impl StockCountTool {
    pub fn new(stock_path: PathBuf) -> Self {
        Self { stock_path }
    }
}

#[async_trait]
impl Tool for StockCountTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "how_many_products_in_stock".to_string(),
            description: "Cuenta los productos con stock disponible".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<String, AssistantError> {
        let count = count_matching(&self.stock_path, |r| r.stock > 0)?;
        Ok(format!("Hay {} productos en stock.", count))
    }
}

pub struct StockBelowThresholdTool {
    stock_path: PathBuf,
}

impl StockBelowThresholdTool {
    pub fn new(stock_path: PathBuf) -> Self {
        Self { stock_path }
    }
}

#[async_trait]
impl Tool for StockBelowThresholdTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "how_many_products_with_stock_below_threshold".to_string(),
            description: "Cuenta los productos con stock por debajo de un umbral".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "threshold": {
                        "type": "number",
                        "description": "Umbral de unidades en stock"
                    }
                },
                "required": ["threshold"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, AssistantError> {
        let threshold = parse_threshold(
            "how_many_products_with_stock_below_threshold",
            &arguments,
            "threshold",
        )?;
        let count = count_matching(&self.stock_path, |r| r.stock < threshold)?;
        Ok(format!(
            "Hay {} productos con stock por debajo de {} unidades.",
            count, threshold
        ))
    }
}

pub struct StockAboveThresholdTool {
    stock_path: PathBuf,
}

impl StockAboveThresholdTool {
    pub fn new(stock_path: PathBuf) -> Self {
        Self { stock_path }
    }
}

#[async_trait]
impl Tool for StockAboveThresholdTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "how_many_products_with_stock_above_threshold".to_string(),
            description: "Cuenta los productos con stock por encima de un umbral".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "threshold": {
                        "type": "number",
                        "description": "Umbral de unidades en stock"
                    }
                },
                "required": ["threshold"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, AssistantError> {
        let threshold = parse_threshold(
            "how_many_products_with_stock_above_threshold",
            &arguments,
            "threshold",
        )?;
        let count = count_matching(&self.stock_path, |r| r.stock > threshold)?;
        Ok(format!(
            "Hay {} productos con stock por encima de {} unidades.",
            count, threshold
        ))
    }
}

pub struct StockBetweenThresholdsTool {
    stock_path: PathBuf,
}

impl StockBetweenThresholdsTool {
    pub fn new(stock_path: PathBuf) -> Self {
        Self { stock_path }
    }
}

#[async_trait]
impl Tool for StockBetweenThresholdsTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "how_many_products_with_stock_between_thresholds".to_string(),
            description: "Cuenta los productos con stock dentro de un intervalo cerrado"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "lower_threshold": {
                        "type": "number",
                        "description": "Límite inferior del intervalo"
                    },
                    "upper_threshold": {
                        "type": "number",
                        "description": "Límite superior del intervalo"
                    }
                },
                "required": ["lower_threshold", "upper_threshold"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, AssistantError> {
        let name = "how_many_products_with_stock_between_thresholds";
        let lower = parse_threshold(name, &arguments, "lower_threshold")?;
        let upper = parse_threshold(name, &arguments, "upper_threshold")?;
        let count = count_matching(&self.stock_path, |r| r.stock >= lower && r.stock <= upper)?;
        Ok(format!(
            "Hay {} productos con stock entre {} y {} unidades.",
            count, lower, upper
        ))
    }
}
