//! Inventory synchronization between the hosted spreadsheet and the local
//! stock snapshot.
//!
//! `pull` refreshes the snapshot wholesale: every row is re-read, coerced,
//! zero-stock rows are dropped, and the CSV is replaced atomically. `push`
//! is the scripted write-back used for price updates; it retries a bounded
//! number of times with a fixed delay and re-raises the final error.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::errors::AssistantError;
use crate::sheets::SheetsClient;

/// Snapshot column order: codigo, ean, stock, precio, promo, descripcion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub codigo: String,
    pub ean: String,
    pub stock: i64,
    pub precio: f64,
    pub promo: String,
    pub descripcion: String,
}

const STOCK_COLUMN: usize = 2;
const PRICE_COLUMN: usize = 3;

/// Parses a raw stock cell: thousands-separator dots are stripped before the
/// integer parse ("1.250" means 1250 units).
pub fn parse_stock(raw: &str) -> Option<i64> {
    let cleaned = raw.trim().replace('.', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().ok()
}

pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Fetches the stock sheet and writes the local snapshot. Zero- and
/// negative-stock rows are dropped; rows whose stock or price cannot be
/// parsed are skipped with a warning. Returns the number of rows written.
pub async fn pull(
    client: &dyn SheetsClient,
    snapshot_path: &Path,
) -> Result<usize, AssistantError> {
    let rows = client.fetch().await?;
    if rows.is_empty() {
        return Err(AssistantError::InventoryError(
            "stock sheet returned no rows".to_string(),
        ));
    }

    let mut records = Vec::new();
    // Row 0 carries the sheet's own headers; column order is fixed.
    for (number, row) in rows.iter().enumerate().skip(1) {
        let stock = match parse_stock(cell(row, STOCK_COLUMN)) {
            Some(stock) => stock,
            None => {
                log::warn!("Row {}: unparsable stock {:?}, skipped", number + 1, cell(row, STOCK_COLUMN));
                continue;
            }
        };
        if stock <= 0 {
            continue;
        }
        let precio = match parse_price(cell(row, PRICE_COLUMN)) {
            Some(precio) => precio,
            None => {
                log::warn!("Row {}: unparsable price {:?}, skipped", number + 1, cell(row, PRICE_COLUMN));
                continue;
            }
        };
        records.push(StockRecord {
            codigo: cell(row, 0).to_string(),
            ean: cell(row, 1).trim().to_string(),
            stock,
            precio,
            promo: cell(row, 4).to_string(),
            descripcion: cell(row, 5).to_string(),
        });
    }

    write_snapshot(&records, snapshot_path)?;
    log::info!(
        "Stock snapshot refreshed: {} rows written to {}",
        records.len(),
        snapshot_path.display()
    );
    Ok(records.len())
}

/// Serializes the snapshot CSV, replacing the target atomically.
pub fn write_snapshot(records: &[StockRecord], path: &Path) -> Result<(), AssistantError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(&buffer)?;
    tmp.persist(path)
        .map_err(|e| AssistantError::InventoryError(e.to_string()))?;
    Ok(())
}

/// Reads the snapshot back for the query tools.
pub fn load_snapshot(path: &Path) -> Result<Vec<StockRecord>, AssistantError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AssistantError::InventoryError(format!("{}: {}", path.display(), e)))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Re-reads the stock sheet, recomputes the price column with `multiplier`,
/// and writes the sheet back. The update is attempted `max_retries` times
/// with a fixed `delay` between attempts; the final attempt's error is
/// re-raised.
pub async fn push(
    client: &dyn SheetsClient,
    multiplier: f64,
    max_retries: u32,
    delay: Duration,
) -> Result<(), AssistantError> {
    let mut rows = client.fetch().await?;
    if rows.is_empty() {
        return Err(AssistantError::InventoryError(
            "stock sheet returned no rows".to_string(),
        ));
    }

    for row in rows.iter_mut().skip(1) {
        if let Some(price) = parse_price(cell(row, PRICE_COLUMN)) {
            let updated = price * multiplier;
            while row.len() <= PRICE_COLUMN {
                row.push(String::new());
            }
            row[PRICE_COLUMN] = updated.to_string();
        }
    }

    let mut last_error = None;
    for attempt in 1..=max_retries {
        match client.update(&rows).await {
            Ok(()) => {
                log::info!("Spreadsheet updated on attempt {}", attempt);
                return Ok(());
            }
            Err(e) => {
                log::error!("Update attempt {} failed: {}", attempt, e);
                last_error = Some(e);
                if attempt < max_retries {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| AssistantError::InventoryError("no update attempt ran".to_string())))
}
