//! bundle-core - Bundle Image Pipeline
//!
//! Turns a parsed bundle catalog (SKU + constituent product codes) into
//! composed product-display images, a bundle manifest, and a missing-images
//! report, plus a ZIP archive of the produced tree.
//!
//! The upload/download UI around this library is an external caller: it
//! hands in a CSV reader and configuration, and consumes archive bytes and
//! report rows.

pub mod archive;
pub mod catalog;
pub mod classify;
pub mod compose;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod types;

pub use crate::catalog::{parse_catalog, parse_catalog_file, BundleRow};
pub use crate::config::{
    BlankCodePolicy, FallbackRegion, Layout, ResolverConfig, RunConfig, TrimMode,
};
pub use crate::error::{Error, Result};
pub use crate::pipeline::{BundlePipeline, ProgressEvent};
pub use crate::resolver::{normalize_code, HttpImageSource, ImageResolver, ImageSource};
pub use crate::types::{ErrorRow, ManifestRow, OutputEntry, RunOutput, RunSummary};
