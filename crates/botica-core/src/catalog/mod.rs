//! Brand catalog adaptation: raw spreadsheets to canonical records.
//!
//! Each brand's worksheets are mapped through its declarative schema entry
//! into the shared {product, code, description} record shape, with the EAN
//! carried separately as the inventory join key. Rows where both product and
//! code resolve empty are schema-alignment artifacts and are dropped.

pub mod schema;
pub mod workbook;

pub use schema::{brand_names, find_brand, BrandSchema, Recipe, Segment, SheetSchema, BRANDS};
pub use workbook::{load_csv_sheet, load_workbook, RawSheet};

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::errors::AssistantError;
use crate::normalize::{clean_cell, join_non_empty, make_keywords, reduce_dots, squash_units};

/// The normalized three-field product representation shared across brands.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub product: String,
    pub code: String,
    pub description: String,
    pub brand: String,
    pub ean: String,
}

impl CanonicalRecord {
    /// The corpus line for this record.
    pub fn corpus_line(&self) -> String {
        format!("{} {} {}", self.product, self.code, self.description)
    }
}

struct RenderContext<'a> {
    values: &'a HashMap<&'static str, String>,
    brand: &'static str,
    sheet: &'a SheetSchema,
}

impl<'a> RenderContext<'a> {
    fn value(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn render_segment(segment: &Segment, ctx: &RenderContext<'_>) -> Option<String> {
    match segment {
        Segment::Labeled { label, column } => {
            let v = ctx.value(column);
            (!v.is_empty()).then(|| format!("{} {}.", label, v))
        }
        Segment::LabeledColon { label, column } => {
            let v = ctx.value(column);
            (!v.is_empty()).then(|| format!("{}: {}.", label, v))
        }
        Segment::Bare { column } => {
            let v = ctx.value(column);
            (!v.is_empty()).then(|| format!("{}.", v))
        }
        Segment::BrandTag { label } => Some(format!("{} {}.", label, ctx.brand)),
        Segment::Keywords { columns } => {
            let cells: Vec<String> = columns.iter().map(|c| ctx.value(c).to_string()).collect();
            let keywords = make_keywords(&cells);
            (!keywords.is_empty()).then(|| format!("Keywords: {}", keywords))
        }
        Segment::JoinLabeled { label, columns } => {
            let cells: Vec<String> = columns.iter().map(|c| ctx.value(c).to_string()).collect();
            let joined = join_non_empty(&cells);
            (!joined.is_empty()).then(|| format!("{}: {}", label, joined))
        }
        Segment::Presentation { size, units } => {
            let size = ctx.value(size);
            let units = ctx.value(units);
            (!size.is_empty() && !units.is_empty())
                .then(|| format!("Presentación {}{}.", size, units))
        }
        Segment::PresentationJoin { columns } => {
            let joined = squash_units(
                &columns
                    .iter()
                    .map(|c| ctx.value(c))
                    .filter(|v| !v.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            (!joined.is_empty()).then(|| format!("Presentación: {}.", joined))
        }
        Segment::Dimensions { columns, unit } => {
            let values: Vec<&str> = columns.iter().map(|c| ctx.value(c)).collect();
            values.iter().all(|v| !v.is_empty()).then(|| {
                let sized: Vec<String> = values.iter().map(|v| format!("{}{}", v, unit)).collect();
                format!("Dimensiones {}.", sized.join(" x "))
            })
        }
        Segment::Weight { column, unit } => {
            let v = ctx.value(column);
            (!v.is_empty()).then(|| format!("Peso {}{}.", v, unit))
        }
        Segment::Remainder { exclude } => {
            let mut sentences = Vec::new();
            for column in ctx.sheet.columns {
                if ctx.sheet.drop.contains(column) || exclude.contains(column) {
                    continue;
                }
                let v = ctx.value(column);
                if !v.is_empty() {
                    sentences.push(format!("{}: {}.", capitalize_first(column), v));
                }
            }
            (!sentences.is_empty()).then(|| sentences.join(" "))
        }
    }
}

fn render_field(segments: &[Segment], ctx: &RenderContext<'_>) -> String {
    let sentences: Vec<String> = segments
        .iter()
        .filter_map(|s| render_segment(s, ctx))
        .collect();
    reduce_dots(sentences.join(" ").trim())
}

/// Adapts a brand workbook into canonical records. Sheets beyond the schema's
/// sheet count are logged and ignored; a workbook with fewer sheets than the
/// schema simply produces fewer records.
pub fn adapt(brand: &'static BrandSchema, sheets: &[RawSheet]) -> Vec<CanonicalRecord> {
    let mut records = Vec::new();
    for (index, sheet) in sheets.iter().enumerate() {
        let Some(sheet_schema) = brand.sheets.get(index) else {
            log::warn!(
                "Brand {} has no schema for sheet {}, ignoring it",
                brand.name,
                index + 1
            );
            continue;
        };
        records.extend(adapt_sheet(brand, sheet_schema, sheet));
    }
    log::info!("Adapted {} records for brand {}", records.len(), brand.name);
    records
}

fn adapt_sheet(
    brand: &'static BrandSchema,
    sheet_schema: &SheetSchema,
    sheet: &RawSheet,
) -> Vec<CanonicalRecord> {
    let mut records = Vec::new();
    let mut seen_rows: HashSet<String> = HashSet::new();

    // Row 0 is the header; the schema's column list is authoritative.
    for row in sheet.rows.iter().skip(1 + sheet_schema.skip_rows) {
        let mut values: HashMap<&'static str, String> = HashMap::new();
        for (i, column) in sheet_schema.columns.iter().enumerate() {
            let raw = row.get(i).map(String::as_str).unwrap_or("");
            values.insert(*column, clean_cell(raw));
        }
        if values.values().all(|v| v.is_empty()) {
            continue;
        }
        let fingerprint = sheet_schema
            .columns
            .iter()
            .map(|c| values[c].as_str())
            .collect::<Vec<_>>()
            .join("\u{1f}");
        if !seen_rows.insert(fingerprint) {
            continue;
        }

        let ctx = RenderContext {
            values: &values,
            brand: brand.name,
            sheet: sheet_schema,
        };
        let product = render_field(brand.recipe.product, &ctx);
        let code = render_field(brand.recipe.code, &ctx);
        if product.is_empty() && code.is_empty() {
            continue;
        }
        let description = render_field(brand.recipe.description, &ctx);
        let ean = ctx.value(brand.ean_column).to_string();

        records.push(CanonicalRecord {
            product,
            code,
            description,
            brand: brand.name.to_string(),
            ean,
        });
    }
    records
}

/// Loads and adapts one brand from its source table under `tables_dir`.
/// Accepts `{stem}.xlsx`, or `{stem}.csv` / `{stem}_N.csv` per-sheet exports.
pub fn load_brand_records(
    brand: &'static BrandSchema,
    tables_dir: &Path,
) -> Result<Vec<CanonicalRecord>, AssistantError> {
    let xlsx = tables_dir.join(format!("{}.xlsx", brand.table_stem));
    if xlsx.exists() {
        let sheets = load_workbook(&xlsx)?;
        return Ok(adapt(brand, &sheets));
    }

    let mut sheets = Vec::new();
    let single = tables_dir.join(format!("{}.csv", brand.table_stem));
    if single.exists() {
        sheets.push(load_csv_sheet(&single)?);
    } else {
        for index in 0..brand.sheets.len() {
            let per_sheet = tables_dir.join(format!("{}_{}.csv", brand.table_stem, index + 1));
            if per_sheet.exists() {
                sheets.push(load_csv_sheet(&per_sheet)?);
            }
        }
    }
    if sheets.is_empty() {
        return Err(AssistantError::CatalogError(format!(
            "no source table for brand {} under {}",
            brand.name,
            tables_dir.display()
        )));
    }
    Ok(adapt(brand, &sheets))
}
