//! CLI configuration resolution
//!
//! Settings resolve in tiers: command-line flag, then environment variable
//! (both handled by clap), then TOML config file, then built-in default.
//! The result is the explicit [`RunConfig`] the core library expects.

use anyhow::{anyhow, Context, Result};
use bundle_core::{
    BlankCodePolicy, FallbackRegion, Layout, ResolverConfig, RunConfig, TrimMode,
};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Optional TOML config file contents
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub layout: Option<Layout>,
    pub fallback: Option<FallbackRegion>,
    pub trim_mode: Option<TrimMode>,
    pub blank_codes: Option<BlankCodePolicy>,
    pub image_host: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Load the TOML config file when one was given.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

fn parse_flag<T>(flag: Option<&str>, name: &str) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    flag.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid --{}: {}", name, e))
    })
    .transpose()
}

/// Flag-level overrides for a `run` invocation
#[derive(Debug, Default)]
pub struct RunOverrides<'a> {
    pub layout: Option<&'a str>,
    pub fallback: Option<&'a str>,
    pub trim_mode: Option<&'a str>,
    pub blank_codes: Option<&'a str>,
    pub image_host: Option<&'a str>,
    pub timeout_secs: Option<u64>,
}

/// Merge flags, config file and defaults into the core's run configuration.
pub fn resolve_run_config(overrides: RunOverrides<'_>, file: &FileConfig) -> Result<RunConfig> {
    // `--fallback none` explicitly disables a fallback set in the file.
    let fallback = match overrides.fallback {
        Some(s) if s.eq_ignore_ascii_case("none") => None,
        Some(s) => Some(
            s.parse::<FallbackRegion>()
                .map_err(|e| anyhow!("Invalid --fallback: {}", e))?,
        ),
        None => file.fallback,
    };

    Ok(RunConfig {
        layout: parse_flag(overrides.layout, "layout")?
            .or(file.layout)
            .unwrap_or_default(),
        fallback,
        trim_mode: parse_flag(overrides.trim_mode, "trim-mode")?
            .or(file.trim_mode)
            .unwrap_or_default(),
        blank_codes: parse_flag(overrides.blank_codes, "blank-codes")?
            .or(file.blank_codes)
            .unwrap_or_default(),
        resolver: resolve_resolver_config(overrides.image_host, overrides.timeout_secs, file),
    })
}

/// Merge flags, config file and defaults into the image store settings.
pub fn resolve_resolver_config(
    image_host: Option<&str>,
    timeout_secs: Option<u64>,
    file: &FileConfig,
) -> ResolverConfig {
    let defaults = ResolverConfig::default();
    ResolverConfig {
        image_host: image_host
            .map(str::to_string)
            .or_else(|| file.image_host.clone())
            .unwrap_or(defaults.image_host),
        timeout_secs: timeout_secs.or(file.timeout_secs).unwrap_or(defaults.timeout_secs),
    }
}
