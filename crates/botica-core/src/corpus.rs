//! Corpus and catalog-CSV generation from canonical records.
//!
//! The corpus is one plain-text file per brand, `{brand_lowercase}_all.txt`,
//! one product line per record, newline-joined with no trailing newline.
//! The catalog CSV export carries the same lines tagged with their EAN so the
//! index builder can attach join metadata without re-running the adapters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{load_brand_records, BrandSchema, CanonicalRecord, BRANDS};
use crate::errors::AssistantError;

/// One row of a brand's catalog CSV export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow {
    pub ean: String,
    pub texto: String,
}

/// Writes the corpus file for one brand. Record order is preserved; the file
/// ends without a trailing newline.
pub fn write_brand_corpus(
    brand: &BrandSchema,
    records: &[CanonicalRecord],
    corpus_dir: &Path,
) -> Result<(), AssistantError> {
    let lines: Vec<String> = records.iter().map(CanonicalRecord::corpus_line).collect();
    let path = corpus_dir.join(brand.corpus_file_name());
    std::fs::write(&path, lines.join("\n"))?;
    log::info!(
        "Wrote {} lines to corpus file {}",
        lines.len(),
        path.display()
    );
    Ok(())
}

/// Writes the catalog CSV export for one brand: `ean,texto` per record.
pub fn write_brand_catalog_csv(
    brand: &BrandSchema,
    records: &[CanonicalRecord],
    catalog_dir: &Path,
) -> Result<(), AssistantError> {
    let path = catalog_dir.join(format!("{}.csv", brand.table_stem));
    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(CatalogRow {
            ean: record.ean.clone(),
            texto: record.corpus_line(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Builds the whole corpus: adapts every brand table found under
/// `tables_dir` and writes its corpus file and catalog CSV. A brand whose
/// source table is missing or malformed is logged and skipped; the build
/// continues with the remaining brands. Returns the number of brands built.
pub fn build_corpus(
    tables_dir: &Path,
    corpus_dir: &Path,
    catalog_dir: &Path,
) -> Result<usize, AssistantError> {
    std::fs::create_dir_all(corpus_dir)?;
    std::fs::create_dir_all(catalog_dir)?;

    let mut built = 0;
    for brand in BRANDS {
        match load_brand_records(brand, tables_dir) {
            Ok(records) => {
                write_brand_corpus(brand, &records, corpus_dir)?;
                write_brand_catalog_csv(brand, &records, catalog_dir)?;
                built += 1;
            }
            Err(e) => {
                log::error!("Skipping brand {}: {}", brand.name, e);
            }
        }
    }
    if built == 0 {
        return Err(AssistantError::CatalogError(format!(
            "no brand table could be adapted from {}",
            tables_dir.display()
        )));
    }
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_brand;

    fn record(product: &str, code: &str, description: &str, ean: &str) -> CanonicalRecord {
        CanonicalRecord {
            product: product.to_string(),
            code: code.to_string(),
            description: description.to_string(),
            brand: "Cepage".to_string(),
            ean: ean.to_string(),
        }
    }

    #[test]
    fn test_corpus_file_no_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let brand = find_brand("cepage").unwrap();
        let records = vec![
            record("Producto A. Marca Cepage.", "Código EAN 1.", "Descripción: a.", "1"),
            record("Producto B. Marca Cepage.", "Código EAN 2.", "Descripción: b.", "2"),
        ];
        write_brand_corpus(brand, &records, dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("cepage_all.txt")).unwrap();
        assert_eq!(
            content,
            "Producto A. Marca Cepage. Código EAN 1. Descripción: a.\n\
             Producto B. Marca Cepage. Código EAN 2. Descripción: b."
        );
        assert!(!content.ends_with('\n'));
    }

    #[test]
    fn test_catalog_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let brand = find_brand("cepage").unwrap();
        let records = vec![record("Producto A.", "Código EAN 1.", "", "1")];
        write_brand_catalog_csv(brand, &records, dir.path()).unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("cepage.csv")).unwrap();
        let rows: Vec<CatalogRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ean, "1");
        assert!(rows[0].texto.contains("Producto A."));
    }

    #[test]
    fn test_build_corpus_skips_missing_brands() {
        let tables = tempfile::tempdir().unwrap();
        let corpus = tempfile::tempdir().unwrap();
        let catalog = tempfile::tempdir().unwrap();

        // Only one brand table exists, as a CSV export.
        let cepage = find_brand("cepage").unwrap();
        let mut writer =
            csv::Writer::from_path(tables.path().join("cepage.csv")).unwrap();
        writer
            .write_record(cepage.sheets[0].columns)
            .unwrap();
        let mut row = vec![""; cepage.sheets[0].columns.len()];
        row[5] = "123";
        row[6] = "Crema X";
        writer.write_record(&row).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let built = build_corpus(tables.path(), corpus.path(), catalog.path()).unwrap();
        assert_eq!(built, 1);
        assert!(corpus.path().join("cepage_all.txt").exists());
        assert!(!corpus.path().join("vichy_all.txt").exists());
    }

    #[test]
    fn test_build_corpus_all_missing_is_error() {
        let tables = tempfile::tempdir().unwrap();
        let corpus = tempfile::tempdir().unwrap();
        let catalog = tempfile::tempdir().unwrap();
        assert!(build_corpus(tables.path(), corpus.path(), catalog.path()).is_err());
    }
}
