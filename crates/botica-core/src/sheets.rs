//! Spreadsheet API seam for the inventory sync.
//!
//! The stock master lives in a hosted spreadsheet. The sync only needs two
//! operations (read the whole range, write the whole range back), so the
//! seam stays narrow and the HTTP client, authentication included, can be
//! swapped for a mock in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::InventoryConfig;
use crate::errors::AssistantError;

#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Fetches all rows of the configured range, header row included.
    async fn fetch(&self) -> Result<Vec<Vec<String>>, AssistantError>;

    /// Overwrites the configured range with the given rows.
    async fn update(&self, rows: &[Vec<String>]) -> Result<(), AssistantError>;
}

/// Google Sheets v4 values API client with bearer-token auth.
pub struct HttpSheetsClient {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    range: String,
    token: String,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl HttpSheetsClient {
    pub fn new(config: &InventoryConfig) -> Result<Self, AssistantError> {
        let token = config.api_token.clone().ok_or_else(|| {
            AssistantError::ConfigError("missing spreadsheet API token".to_string())
        })?;
        if config.spreadsheet_id.is_empty() {
            return Err(AssistantError::ConfigError(
                "missing spreadsheet id".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            range: config.range.clone(),
            token,
        })
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SheetsClient for HttpSheetsClient {
    async fn fetch(&self) -> Result<Vec<Vec<String>>, AssistantError> {
        let url = format!(
            "{}/{}/values/{}",
            self.api_base, self.spreadsheet_id, self.range
        );
        log::debug!("Fetching spreadsheet range {}", self.range);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AssistantError::SheetError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AssistantError::SheetError(format!(
                "values.get failed with status {}: {}",
                status, text
            )));
        }
        let parsed: ValuesResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::SheetError(e.to_string()))?;
        Ok(parsed.values)
    }

    async fn update(&self, rows: &[Vec<String>]) -> Result<(), AssistantError> {
        let url = format!(
            "{}/{}/values/{}?valueInputOption=RAW",
            self.api_base, self.spreadsheet_id, self.range
        );
        let body = json!({ "values": rows });
        log::debug!("Updating spreadsheet range {} ({} rows)", self.range, rows.len());
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::SheetError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AssistantError::SheetError(format!(
                "values.update failed with status {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}

/// In-memory client for tests: serves fixed rows and can fail a configured
/// number of update calls before succeeding.
pub struct MockSheetsClient {
    rows: Vec<Vec<String>>,
    update_failures: std::sync::Mutex<u32>,
    updates: std::sync::Mutex<Vec<Vec<Vec<String>>>>,
}

impl MockSheetsClient {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            update_failures: std::sync::Mutex::new(0),
            updates: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// The next `n` update calls will fail with a transient error.
    pub fn fail_updates(self, n: u32) -> Self {
        *self.update_failures.lock().unwrap() = n;
        self
    }

    /// Rows submitted through successful update calls.
    pub fn submitted_updates(&self) -> Vec<Vec<Vec<String>>> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetsClient for MockSheetsClient {
    async fn fetch(&self) -> Result<Vec<Vec<String>>, AssistantError> {
        Ok(self.rows.clone())
    }

    async fn update(&self, rows: &[Vec<String>]) -> Result<(), AssistantError> {
        let mut failures = self.update_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(AssistantError::SheetError(
                "simulated transient failure".to_string(),
            ));
        }
        self.updates.lock().unwrap().push(rows.to_vec());
        Ok(())
    }
}
