//! Run configuration for the bundle image pipeline
//!
//! All knobs are explicit structs handed to the pipeline per call; the core
//! reads no ambient state. The CLI layer resolves its flag/env/TOML tiers
//! into these types before invoking the library.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default image store host (production CDN)
pub const DEFAULT_IMAGE_HOST: &str = "cdn.shop-apotheke.com";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tiling direction for composed bundle images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Copies placed left-to-right
    Horizontal,
    /// Copies placed top-to-bottom
    Vertical,
    /// Vertical when the trimmed image is taller than wide, else horizontal
    #[default]
    Automatic,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Layout::Horizontal),
            "vertical" => Ok(Layout::Vertical),
            "automatic" | "auto" => Ok(Layout::Automatic),
            other => Err(format!(
                "unknown layout '{}' (expected horizontal, vertical or automatic)",
                other
            )),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Horizontal => write!(f, "horizontal"),
            Layout::Vertical => write!(f, "vertical"),
            Layout::Automatic => write!(f, "automatic"),
        }
    }
}

/// Regional/language image variant tried after the core suffixes miss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackRegion {
    Fr,
    De,
    Nl,
    Be,
}

impl FallbackRegion {
    /// Lookup suffix for this region, e.g. `1-fr`
    pub fn suffix(&self) -> &'static str {
        match self {
            FallbackRegion::Fr => "1-fr",
            FallbackRegion::De => "1-de",
            FallbackRegion::Nl => "1-nl",
            FallbackRegion::Be => "1-be",
        }
    }
}

impl FromStr for FallbackRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(FallbackRegion::Fr),
            "de" => Ok(FallbackRegion::De),
            "nl" => Ok(FallbackRegion::Nl),
            "be" => Ok(FallbackRegion::Be),
            other => Err(format!(
                "unknown fallback region '{}' (expected fr, de, nl or be)",
                other
            )),
        }
    }
}

impl fmt::Display for FallbackRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackRegion::Fr => write!(f, "fr"),
            FallbackRegion::De => write!(f, "de"),
            FallbackRegion::Nl => write!(f, "nl"),
            FallbackRegion::Be => write!(f, "be"),
        }
    }
}

/// Reference color the compositor trims against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrimMode {
    /// Trim against fixed white (255, 255, 255)
    #[default]
    White,
    /// Trim against the image's own top-left corner pixel
    CornerPixel,
}

impl FromStr for TrimMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(TrimMode::White),
            "corner-pixel" | "corner" => Ok(TrimMode::CornerPixel),
            other => Err(format!(
                "unknown trim mode '{}' (expected white or corner-pixel)",
                other
            )),
        }
    }
}

/// What to do with blank product codes inside a mixed bundle's list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlankCodePolicy {
    /// Ignore blank constituents
    #[default]
    Skip,
    /// Record each blank constituent as a missing image for the bundle
    RecordMiss,
}

impl FromStr for BlankCodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(BlankCodePolicy::Skip),
            "record-miss" | "record" => Ok(BlankCodePolicy::RecordMiss),
            other => Err(format!(
                "unknown blank-code policy '{}' (expected skip or record-miss)",
                other
            )),
        }
    }
}

/// HTTP image store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Host name of the image store, without scheme
    pub image_host: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            image_host: DEFAULT_IMAGE_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Full configuration for one processing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Tiling direction for composed images
    pub layout: Layout,
    /// Regional variant tried when the core suffixes miss
    pub fallback: Option<FallbackRegion>,
    /// Background reference for trimming
    pub trim_mode: TrimMode,
    /// Handling of blank codes in mixed bundles
    pub blank_codes: BlankCodePolicy,
    /// Image store settings
    pub resolver: ResolverConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.layout, Layout::Automatic);
        assert!(config.fallback.is_none());
        assert_eq!(config.trim_mode, TrimMode::White);
        assert_eq!(config.blank_codes, BlankCodePolicy::Skip);
        assert_eq!(config.resolver.image_host, DEFAULT_IMAGE_HOST);
        assert_eq!(config.resolver.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("horizontal".parse::<Layout>().unwrap(), Layout::Horizontal);
        assert_eq!("Vertical".parse::<Layout>().unwrap(), Layout::Vertical);
        assert_eq!("auto".parse::<Layout>().unwrap(), Layout::Automatic);
        assert!("diagonal".parse::<Layout>().is_err());
    }

    #[test]
    fn test_fallback_suffixes() {
        assert_eq!("fr".parse::<FallbackRegion>().unwrap().suffix(), "1-fr");
        assert_eq!("de".parse::<FallbackRegion>().unwrap().suffix(), "1-de");
        assert_eq!("nl".parse::<FallbackRegion>().unwrap().suffix(), "1-nl");
        assert_eq!("be".parse::<FallbackRegion>().unwrap().suffix(), "1-be");
        assert!("us".parse::<FallbackRegion>().is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "record-miss".parse::<BlankCodePolicy>().unwrap(),
            BlankCodePolicy::RecordMiss
        );
        assert_eq!(
            "corner-pixel".parse::<TrimMode>().unwrap(),
            TrimMode::CornerPixel
        );
    }
}
