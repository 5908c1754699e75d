//! Brand membership tools.
//!
//! These answer from the fixed brand table, not from the live index or the
//! stock snapshot: the catalog of carried brands changes by schema update,
//! and the assistant's answers should match what the corpus was built from.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::catalog::brand_names;
use crate::core_types::ToolMetadata;
use crate::errors::AssistantError;
use crate::tools::Tool;

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub struct HowManyBrandsTool;

#[async_trait]
impl Tool for HowManyBrandsTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "how_many_brands".to_string(),
            description: "Responde cuántas marcas hay en la base de datos".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<String, AssistantError> {
        Ok(format!("Hay {} marcas en total.", brand_names().len()))
    }
}

pub struct WhichBrandsTool;

#[async_trait]
impl Tool for WhichBrandsTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "which_brands".to_string(),
            description: "Enumera las marcas disponibles en la base de datos".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<String, AssistantError> {
        Ok(format!("Las marcas son: {}.", brand_names().join(", ")))
    }
}

pub struct IsBrandInDatabaseTool;

#[async_trait]
impl Tool for IsBrandInDatabaseTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "is_brand_in_database".to_string(),
            description: "Indica si una marca está en la base de datos".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "marca": {
                        "type": "string",
                        "description": "Nombre de la marca a consultar"
                    }
                },
                "required": ["marca"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, AssistantError> {
        let marca = arguments
            .get("marca")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AssistantError::ToolError {
                tool_name: "is_brand_in_database".to_string(),
                message: "missing parameter 'marca'".to_string(),
            })?;
        let query = marca.trim().to_lowercase();
        let known = brand_names()
            .iter()
            .any(|name| name.to_lowercase() == query);
        Ok(format!(
            "La marca {} {} está en la base de datos.",
            capitalize(&query),
            if known { "sí" } else { "no" }
        ))
    }
}
