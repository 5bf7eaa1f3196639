//! Bundle classification
//!
//! Derives arity, uniformity and the base output bucket from a bundle's
//! constituent codes. Blank codes never count towards arity or uniformity.

use std::collections::HashSet;

/// Bucket for uniform bundles that resolved via a regional fallback suffix
pub const CROSS_COUNTRY_BUCKET: &str = "cross-country";

/// Parent bucket for mixed bundles
pub const MIXED_SETS_BUCKET: &str = "mixed_sets";

/// Classification of one bundle row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleClass {
    /// Count of non-blank constituent codes
    pub arity: usize,
    /// All non-blank codes identical
    pub is_uniform: bool,
}

impl BundleClass {
    /// Manifest label: `bundle of {arity}` for uniform bundles, `mixed` otherwise
    pub fn bundle_type(&self) -> String {
        if self.is_uniform {
            format!("bundle of {}", self.arity)
        } else {
            "mixed".to_string()
        }
    }

    /// Base output bucket, before any cross-country override
    pub fn bucket(&self, sku: &str) -> String {
        if self.is_uniform {
            format!("bundle_{}", self.arity)
        } else {
            format!("{}/{}", MIXED_SETS_BUCKET, sku)
        }
    }

    /// Uniform bundles of exactly 2 or 3 copies get composited; everything
    /// else passes the fetched image through unmodified.
    pub fn composable(&self) -> bool {
        self.is_uniform && (self.arity == 2 || self.arity == 3)
    }
}

/// Classify a bundle from its constituent codes.
pub fn classify(product_codes: &[String]) -> BundleClass {
    let non_blank: Vec<&str> = product_codes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    let distinct: HashSet<&str> = non_blank.iter().copied().collect();

    BundleClass {
        arity: non_blank.len(),
        is_uniform: distinct.len() <= 1,
    }
}
