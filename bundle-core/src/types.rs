//! Shared record types produced by a processing run

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One file produced by the run, relative to the archive root
#[derive(Debug, Clone)]
pub struct OutputEntry {
    /// Forward-slash path inside the archive, e.g. `bundle_2/BND1-h1.jpg`
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

/// One manifest line per input row, reflecting the requested composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRow {
    pub sku: String,
    /// Constituent codes as given, joined with `, `
    pub pzns_in_set: String,
    /// `bundle of {n}` for uniform bundles, `mixed` otherwise
    pub bundle_type: String,
    /// Whether any constituent resolved via a regional fallback suffix
    pub cross_country: bool,
}

/// One missing-image record; grouped by bundle SKU only at report time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRow {
    pub bundle_sku: String,
    pub missing_code: String,
}

/// Counters for one completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub produced_files: usize,
    pub missing_codes: usize,
    pub cross_country_bundles: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Everything a run yields; handed to the packager and the caller
#[derive(Debug)]
pub struct RunOutput {
    pub run_id: Uuid,
    pub entries: Vec<OutputEntry>,
    pub manifest: Vec<ManifestRow>,
    pub missing: Vec<ErrorRow>,
    pub summary: RunSummary,
}
