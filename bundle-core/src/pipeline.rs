//! Pipeline orchestrator
//!
//! Walks the parsed bundle rows, resolves and composes images, and
//! accumulates the output entries, manifest rows and missing-image records
//! for one processing run.
//!
//! # Error handling
//! - Per-bundle error isolation: a product whose image cannot be resolved
//!   (or decoded) degrades to a recorded miss; the run always completes.
//! - Structural input problems are rejected earlier, in the catalog parser.
//!
//! # Example
//! ```rust,ignore
//! let source = HttpImageSource::new(&config.resolver)?;
//! let pipeline = BundlePipeline::new(config, source);
//! let output = pipeline.run(&rows).await;
//! ```

use crate::catalog::BundleRow;
use crate::classify::{self, BundleClass, CROSS_COUNTRY_BUCKET, MIXED_SETS_BUCKET};
use crate::compose;
use crate::config::{BlankCodePolicy, RunConfig};
use crate::error::Result;
use crate::resolver::{ImageResolver, ImageSource, ResolvedImage};
use crate::types::{ErrorRow, ManifestRow, OutputEntry, RunOutput, RunSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Progress events emitted while a run is underway.
///
/// Advisory only; consumers may render them, log them, or drop them.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    /// Run accepted, row count known
    RunStarted {
        run_id: Uuid,
        rows_total: usize,
        timestamp: DateTime<Utc>,
    },
    /// One input row fully processed; `rows_done / rows_total` is the
    /// monotonic progress fraction
    RowCompleted {
        rows_done: usize,
        rows_total: usize,
        sku: String,
        timestamp: DateTime<Utc>,
    },
    /// All rows processed
    RunCompleted {
        run_id: Uuid,
        produced_files: usize,
        missing_codes: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Orchestrates one processing run over a parsed bundle catalog.
pub struct BundlePipeline<S> {
    config: RunConfig,
    resolver: ImageResolver<S>,
    event_tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl<S: ImageSource> BundlePipeline<S> {
    /// Create a pipeline over an image source.
    pub fn new(config: RunConfig, source: S) -> Self {
        Self {
            config,
            resolver: ImageResolver::new(source),
            event_tx: None,
        }
    }

    /// Create a pipeline with a progress channel.
    pub fn with_events(config: RunConfig, source: S, event_tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self {
            config,
            resolver: ImageResolver::new(source),
            event_tx: Some(event_tx),
        }
    }

    /// Process every row and return whatever was producible.
    ///
    /// Rows are processed in input order, one at a time; manifest and
    /// missing records come back in that same order.
    pub async fn run(&self, rows: &[BundleRow]) -> RunOutput {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let rows_total = rows.len();

        info!(run_id = %run_id, rows_total, "Starting bundle image run");
        self.emit(ProgressEvent::RunStarted {
            run_id,
            rows_total,
            timestamp: started_at,
        })
        .await;

        let mut entries: Vec<OutputEntry> = Vec::new();
        let mut manifest: Vec<ManifestRow> = Vec::with_capacity(rows_total);
        let mut missing: Vec<ErrorRow> = Vec::new();
        let mut cross_country_bundles = 0usize;

        for (index, row) in rows.iter().enumerate() {
            let class = classify::classify(&row.product_codes);
            debug!(
                sku = %row.sku,
                arity = class.arity,
                uniform = class.is_uniform,
                "Processing bundle"
            );

            let cross_country = if class.is_uniform {
                self.process_uniform(row, class, &mut entries, &mut missing)
                    .await
            } else {
                self.process_mixed(row, &mut entries, &mut missing).await
            };
            if cross_country {
                cross_country_bundles += 1;
            }

            // The manifest always reflects the requested composition, even
            // when every lookup for the row missed.
            manifest.push(ManifestRow {
                sku: row.sku.clone(),
                pzns_in_set: row.codes_joined(),
                bundle_type: class.bundle_type(),
                cross_country,
            });

            self.emit(ProgressEvent::RowCompleted {
                rows_done: index + 1,
                rows_total,
                sku: row.sku.clone(),
                timestamp: Utc::now(),
            })
            .await;
        }

        let finished_at = Utc::now();
        info!(
            run_id = %run_id,
            produced = entries.len(),
            missing = missing.len(),
            "Run complete"
        );
        self.emit(ProgressEvent::RunCompleted {
            run_id,
            produced_files: entries.len(),
            missing_codes: missing.len(),
            timestamp: finished_at,
        })
        .await;

        let summary = RunSummary {
            total_rows: rows_total,
            produced_files: entries.len(),
            missing_codes: missing.len(),
            cross_country_bundles,
            started_at,
            finished_at,
        };

        RunOutput {
            run_id,
            entries,
            manifest,
            missing,
            summary,
        }
    }

    /// Uniform bundle: one lookup for the single distinct code, composited
    /// for arities 2 and 3. Returns whether the regional fallback was used.
    async fn process_uniform(
        &self,
        row: &BundleRow,
        class: BundleClass,
        entries: &mut Vec<OutputEntry>,
        missing: &mut Vec<ErrorRow>,
    ) -> bool {
        let Some(code) = row
            .product_codes
            .iter()
            .map(|c| c.trim())
            .find(|c| !c.is_empty())
        else {
            return false;
        };

        match self.resolver.resolve(code, self.config.fallback).await {
            Some(resolved) => {
                let cross_country = resolved.is_cross_country();
                let bucket = if cross_country {
                    CROSS_COUNTRY_BUCKET.to_string()
                } else {
                    class.bucket(&row.sku)
                };

                match self.bundle_bytes(resolved, class) {
                    Ok(bytes) => {
                        entries.push(OutputEntry {
                            relative_path: format!("{}/{}-h1.jpg", bucket, row.sku),
                            bytes,
                        });
                    }
                    Err(e) => {
                        warn!(
                            sku = %row.sku,
                            code = %code,
                            error = %e,
                            "Composition failed, recording as missing"
                        );
                        missing.push(ErrorRow {
                            bundle_sku: row.sku.clone(),
                            missing_code: code.to_string(),
                        });
                    }
                }
                cross_country
            }
            None => {
                missing.push(ErrorRow {
                    bundle_sku: row.sku.clone(),
                    missing_code: code.to_string(),
                });
                false
            }
        }
    }

    /// Composite for arities 2 and 3; pass the fetched bytes through
    /// unmodified for every other multiplicity.
    fn bundle_bytes(&self, resolved: ResolvedImage, class: BundleClass) -> Result<Vec<u8>> {
        if !class.composable() {
            return Ok(resolved.bytes);
        }
        let img = compose::decode(&resolved.bytes)?;
        let composed = compose::compose(
            &img,
            class.arity as u32,
            self.config.layout,
            self.config.trim_mode,
        );
        compose::encode_jpeg(&composed)
    }

    /// Mixed bundle: one lookup per constituent, duplicates processed
    /// independently, no composition. Returns whether any constituent used
    /// the regional fallback.
    async fn process_mixed(
        &self,
        row: &BundleRow,
        entries: &mut Vec<OutputEntry>,
        missing: &mut Vec<ErrorRow>,
    ) -> bool {
        let mut cross_country = false;

        for raw_code in &row.product_codes {
            let code = raw_code.trim();
            if code.is_empty() {
                match self.config.blank_codes {
                    BlankCodePolicy::Skip => {
                        debug!(sku = %row.sku, "Skipping blank constituent code");
                    }
                    BlankCodePolicy::RecordMiss => {
                        missing.push(ErrorRow {
                            bundle_sku: row.sku.clone(),
                            missing_code: String::new(),
                        });
                    }
                }
                continue;
            }

            match self.resolver.resolve(code, self.config.fallback).await {
                Some(resolved) => {
                    let relative_path = if resolved.is_cross_country() {
                        cross_country = true;
                        format!(
                            "{}/{}/{}/{}.jpg",
                            MIXED_SETS_BUCKET, row.sku, CROSS_COUNTRY_BUCKET, code
                        )
                    } else {
                        format!("{}/{}/{}.jpg", MIXED_SETS_BUCKET, row.sku, code)
                    };
                    entries.push(OutputEntry {
                        relative_path,
                        bytes: resolved.bytes,
                    });
                }
                None => {
                    missing.push(ErrorRow {
                        bundle_sku: row.sku.clone(),
                        missing_code: code.to_string(),
                    });
                }
            }
        }

        cross_country
    }

    /// Emit a progress event if a channel is configured.
    async fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }
}
