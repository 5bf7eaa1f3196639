//! Report serialization
//!
//! Renders the bundle manifest and the missing-images log as `;`-delimited
//! CSV bytes. Missing-image records are grouped by bundle SKU here, at the
//! serialization boundary, never earlier.

use crate::error::{Error, Result};
use crate::types::{ErrorRow, ManifestRow};
use std::collections::HashMap;

/// File name of the bundle manifest report
pub const MANIFEST_FILENAME: &str = "bundle_list.csv";
/// File name of the missing-images report
pub const MISSING_FILENAME: &str = "missing_images.csv";

/// Serialize the bundle manifest (`sku;pzns_in_set;bundle type;cross-country`).
pub fn manifest_csv(rows: &[ManifestRow]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(vec![]);
    writer.write_record(["sku", "pzns_in_set", "bundle type", "cross-country"])?;
    for row in rows {
        writer.write_record([
            row.sku.as_str(),
            row.pzns_in_set.as_str(),
            row.bundle_type.as_str(),
            if row.cross_country { "Yes" } else { "No" },
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Serialize the missing-images report (`PZN Bundle;PZN with image missing`).
///
/// One output row per bundle SKU, first-seen order, with that bundle's
/// missing codes joined by `, `.
pub fn missing_csv(rows: &[ErrorRow]) -> Result<Vec<u8>> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&str>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.bundle_sku.as_str())
            .or_insert_with(|| {
                order.push(row.bundle_sku.as_str());
                Vec::new()
            })
            .push(row.missing_code.as_str());
    }

    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(vec![]);
    writer.write_record(["PZN Bundle", "PZN with image missing"])?;
    for sku in order {
        let codes = grouped.get(sku).map(|c| c.join(", ")).unwrap_or_default();
        writer.write_record([sku, codes.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}
