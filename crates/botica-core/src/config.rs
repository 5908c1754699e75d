//! Configuration loading for the assistant.
//!
//! Configuration lives in a YAML file; secrets (API keys, assistant id,
//! spreadsheet token) may be omitted from the file and supplied through
//! environment variables instead. Environment values win over file values so
//! a checked-in config never needs to carry credentials.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::AssistantError;

const ENV_API_KEY: &str = "BOTICA_API_KEY";
const ENV_ASSISTANT_ID: &str = "BOTICA_ASSISTANT_ID";
const ENV_SHEETS_TOKEN: &str = "BOTICA_SHEETS_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BoticaConfig {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_tables_dir")]
    pub tables_dir: String,
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: String,
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default = "default_stock_path")]
    pub stock_path: String,
    #[serde(default = "default_chat_log_path")]
    pub chat_log_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_k_search")]
    pub k_search: usize,
    #[serde(default = "default_k_threshold")]
    pub k_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_range")]
    pub range: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_initial_message")]
    pub initial_message: String,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_tables_dir() -> String {
    "database/tables".to_string()
}

fn default_corpus_dir() -> String {
    "database/txt".to_string()
}

fn default_catalog_dir() -> String {
    "database/csv".to_string()
}

fn default_index_path() -> String {
    "database/index.json".to_string()
}

fn default_stock_path() -> String {
    "database/stock.csv".to_string()
}

fn default_chat_log_path() -> String {
    "logs/chat.log".to_string()
}

fn default_k_search() -> usize {
    30
}

fn default_k_threshold() -> usize {
    5
}

fn default_sheet_range() -> String {
    "A:F".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_initial_message() -> String {
    "Hola, ¿en qué puedo ayudarte hoy?".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            assistant_id: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tables_dir: default_tables_dir(),
            corpus_dir: default_corpus_dir(),
            catalog_dir: default_catalog_dir(),
            index_path: default_index_path(),
            stock_path: default_stock_path(),
            chat_log_path: default_chat_log_path(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k_search: default_k_search(),
            k_threshold: default_k_threshold(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: default_sheet_range(),
            api_token: None,
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            initial_message: default_initial_message(),
        }
    }
}

impl BoticaConfig {
    /// Loads configuration from a YAML file, then applies environment
    /// overrides. A missing file yields the defaults (environment overrides
    /// still apply), so the offline commands work without any config on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssistantError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&raw)
                .map_err(|e| AssistantError::ConfigError(format!("{}: {}", path.display(), e)))?
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            self.assistant.api_key = Some(key.clone());
            self.embeddings.api_key = Some(key);
        }
        if let Ok(id) = std::env::var(ENV_ASSISTANT_ID) {
            self.assistant.assistant_id = Some(id);
        }
        if let Ok(token) = std::env::var(ENV_SHEETS_TOKEN) {
            self.inventory.api_token = Some(token);
        }
    }

    /// API key for the assistant endpoint, required for the chat path.
    pub fn require_api_key(&self) -> Result<&str, AssistantError> {
        self.assistant
            .api_key
            .as_deref()
            .ok_or_else(|| {
                AssistantError::ConfigError(format!(
                    "missing assistant API key (set assistant.api_key or {})",
                    ENV_API_KEY
                ))
            })
    }

    pub fn require_assistant_id(&self) -> Result<&str, AssistantError> {
        self.assistant
            .assistant_id
            .as_deref()
            .ok_or_else(|| {
                AssistantError::ConfigError(format!(
                    "missing assistant id (set assistant.assistant_id or {})",
                    ENV_ASSISTANT_ID
                ))
            })
    }
}
