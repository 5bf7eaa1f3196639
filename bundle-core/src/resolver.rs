//! Image store lookup
//!
//! Resolves a product code to image bytes by trying an ordered list of
//! candidate suffixes against the remote image store: the manufacturer image
//! (`p1`) first, the fotobox image (`p10`) second, then an optional
//! regional/language variant as a last resort. The two core lookups are
//! independent, so they are issued concurrently and resolved with strict
//! priority.
//!
//! A non-success response, transport error or timeout is a miss for that
//! suffix; no retry is performed. A product with no hit on any candidate
//! resolves to `None`, which the orchestrator records as a missing image.

use crate::config::{FallbackRegion, ResolverConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Primary candidate: manufacturer image
pub const PRIMARY_SUFFIX: &str = "1";
/// Secondary candidate: fotobox image
pub const SECONDARY_SUFFIX: &str = "10";

const USER_AGENT: &str = "bundle-image-pipeline/0.1.0";

/// Normalize a product code for the image store's ID scheme.
///
/// Codes starting with `0` or `1` carry a `D` prefix in the store. Fixed,
/// non-configurable transform mirroring the external scheme.
pub fn normalize_code(code: &str) -> String {
    if code.starts_with('0') || code.starts_with('1') {
        format!("D{}", code)
    } else {
        code.to_string()
    }
}

/// Lookup URL for one candidate image.
pub fn image_url(host: &str, normalized_code: &str, suffix: &str) -> String {
    format!("https://{}/images/{}-p{}.jpg", host, normalized_code, suffix)
}

/// A successfully resolved image and the suffix that produced it.
///
/// The suffix lets callers detect whether a regional fallback path was
/// taken, which changes the output bucket.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub suffix: String,
}

impl ResolvedImage {
    /// True when this image came from a regional fallback suffix
    pub fn is_cross_country(&self) -> bool {
        self.suffix.starts_with("1-")
    }
}

/// Seam over the remote image store.
///
/// The production implementation is [`HttpImageSource`]; tests substitute an
/// in-memory map. A `None` return is a miss for that suffix, whatever the
/// underlying cause.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, normalized_code: &str, suffix: &str) -> Option<Vec<u8>>;
}

/// HTTP image store client
pub struct HttpImageSource {
    http_client: reqwest::Client,
    host: String,
}

impl HttpImageSource {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            host: config.image_host.clone(),
        })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, normalized_code: &str, suffix: &str) -> Option<Vec<u8>> {
        let url = image_url(&self.host, normalized_code, suffix);
        debug!(code = %normalized_code, suffix = %suffix, url = %url, "Fetching candidate image");

        match self.http_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => match response.bytes().await {
                Ok(bytes) => {
                    debug!(
                        code = %normalized_code,
                        suffix = %suffix,
                        bytes = bytes.len(),
                        "Candidate image found"
                    );
                    Some(bytes.to_vec())
                }
                Err(e) => {
                    warn!(code = %normalized_code, suffix = %suffix, error = %e, "Body read failed, counting as miss");
                    None
                }
            },
            Ok(response) => {
                debug!(
                    code = %normalized_code,
                    suffix = %suffix,
                    status = %response.status(),
                    "Candidate image not available"
                );
                None
            }
            Err(e) => {
                warn!(code = %normalized_code, suffix = %suffix, error = %e, "Transport error, counting as miss");
                None
            }
        }
    }
}

/// Prioritized multi-suffix resolution over an [`ImageSource`]
pub struct ImageResolver<S> {
    source: S,
}

impl<S: ImageSource> ImageResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve a product code to image bytes, or `None` when every
    /// candidate suffix misses.
    pub async fn resolve(
        &self,
        product_code: &str,
        fallback: Option<FallbackRegion>,
    ) -> Option<ResolvedImage> {
        let code = normalize_code(product_code);

        // Either hit is acceptable; if both succeed the primary wins.
        let (primary, secondary) = tokio::join!(
            self.source.fetch(&code, PRIMARY_SUFFIX),
            self.source.fetch(&code, SECONDARY_SUFFIX)
        );

        if let Some(bytes) = primary {
            return Some(ResolvedImage {
                bytes,
                suffix: PRIMARY_SUFFIX.to_string(),
            });
        }
        if let Some(bytes) = secondary {
            return Some(ResolvedImage {
                bytes,
                suffix: SECONDARY_SUFFIX.to_string(),
            });
        }

        if let Some(region) = fallback {
            if let Some(bytes) = self.source.fetch(&code, region.suffix()).await {
                return Some(ResolvedImage {
                    bytes,
                    suffix: region.suffix().to_string(),
                });
            }
        }

        debug!(code = %product_code, "No candidate suffix produced an image");
        None
    }
}
