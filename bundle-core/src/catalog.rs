//! Bundle catalog input
//!
//! Parses the `;`-delimited CSV export (columns `sku` and `pzns_in_set`)
//! into [`BundleRow`]s. Structural problems — a missing required column or a
//! table with no usable rows — are validation errors raised here, before any
//! network activity. Rows with a blank value in either required column are
//! dropped, matching the upstream export's null handling.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Column holding the bundle SKU
pub const COLUMN_SKU: &str = "sku";
/// Column holding the comma-separated constituent product codes
pub const COLUMN_PZNS: &str = "pzns_in_set";

/// One parsed input row: a bundle SKU plus its constituent product codes.
///
/// Codes are trimmed but otherwise kept as given; blank entries survive
/// parsing so the blank-code policy can decide their fate downstream. At
/// least one non-blank code is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRow {
    pub sku: String,
    pub product_codes: Vec<String>,
}

impl BundleRow {
    /// Constituent codes joined with `, `, as reported in the manifest
    pub fn codes_joined(&self) -> String {
        self.product_codes.join(", ")
    }
}

/// Parse a bundle catalog from any reader.
pub fn parse_catalog<R: Read>(input: R) -> Result<Vec<BundleRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let sku_idx = headers.iter().position(|h| h == COLUMN_SKU);
    let pzn_idx = headers.iter().position(|h| h == COLUMN_PZNS);

    let missing: Vec<&str> = [(COLUMN_SKU, sku_idx), (COLUMN_PZNS, pzn_idx)]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }
    let (sku_idx, pzn_idx) = (sku_idx.unwrap_or(0), pzn_idx.unwrap_or(0));

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let sku = record.get(sku_idx).unwrap_or("").trim();
        let raw_codes = record.get(pzn_idx).unwrap_or("").trim();
        if sku.is_empty() || raw_codes.is_empty() {
            dropped += 1;
            continue;
        }

        let product_codes: Vec<String> =
            raw_codes.split(',').map(|c| c.trim().to_string()).collect();
        if product_codes.iter().all(|c| c.is_empty()) {
            dropped += 1;
            continue;
        }

        rows.push(BundleRow {
            sku: sku.to_string(),
            product_codes,
        });
    }

    if dropped > 0 {
        debug!(dropped, "Dropped rows with blank required values");
    }

    if rows.is_empty() {
        return Err(Error::Validation(
            "Input table contains no usable rows".to_string(),
        ));
    }

    Ok(rows)
}

/// Parse a bundle catalog from a file on disk.
pub fn parse_catalog_file(path: &Path) -> Result<Vec<BundleRow>> {
    let file = File::open(path)?;
    parse_catalog(file)
}
