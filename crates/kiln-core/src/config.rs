//! Configuration module
//!
//! Provides the configuration for the media delivery and upload core:
//! signed-URL caching, chunked upload sizing and retry schedule, and
//! thumbnail extraction.

use std::env;

// Defaults
const SIGNED_URL_TTL_SECS: u64 = 180;
const SIGNED_URL_MARGIN_MS: u64 = 30_000;
const URL_CACHE_CAPACITY: usize = 256;
const CHUNK_SIZE_BYTES: usize = 6 * 1024 * 1024;
const MAX_UPLOAD_BYTES: u64 = 3 * 1024 * 1024 * 1024;
const THUMBNAIL_TIMEOUT_SECS: u64 = 10;
const THUMBNAIL_SEEK_SECS: f64 = 1.0;
const VISIBILITY_SEED_THRESHOLD: f64 = 0.5;

/// Retry delays between transient chunk failures. A bounded backoff
/// schedule, not unbounded retry; once exhausted the upload fails.
const RETRY_DELAYS_MS: [u64; 5] = [0, 3_000, 5_000, 10_000, 20_000];

/// Media core configuration.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// TTL requested for signed playback URLs.
    pub signed_url_ttl_secs: u64,
    /// Safety margin subtracted from expiry when judging cache staleness.
    pub signed_url_margin_ms: u64,
    /// Capacity of the bounded signed-URL LRU cache.
    pub url_cache_capacity: usize,
    /// Fixed chunk size for resumable uploads.
    pub chunk_size_bytes: usize,
    /// Backoff schedule between transient chunk failures, in milliseconds.
    pub retry_delays_ms: Vec<u64>,
    /// Hard ceiling on upload size; larger sources are rejected before a
    /// session is opened.
    pub max_upload_bytes: u64,
    /// Overall budget for still-frame capture before giving up.
    pub thumbnail_timeout_secs: u64,
    /// Seek offset for the captured frame, in seconds.
    pub thumbnail_seek_secs: f64,
    /// Path to the ffmpeg binary for the native capture strategy.
    pub ffmpeg_path: String,
    /// Minimum visible fraction for the viewability seed of the very first
    /// active item, before any layout has been recorded.
    pub visibility_seed_threshold: f64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            signed_url_ttl_secs: SIGNED_URL_TTL_SECS,
            signed_url_margin_ms: SIGNED_URL_MARGIN_MS,
            url_cache_capacity: URL_CACHE_CAPACITY,
            chunk_size_bytes: CHUNK_SIZE_BYTES,
            retry_delays_ms: RETRY_DELAYS_MS.to_vec(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            thumbnail_timeout_secs: THUMBNAIL_TIMEOUT_SECS,
            thumbnail_seek_secs: THUMBNAIL_SEEK_SECS,
            ffmpeg_path: "ffmpeg".to_string(),
            visibility_seed_threshold: VISIBILITY_SEED_THRESHOLD,
        }
    }
}

impl MediaConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable. Unparseable values are
    /// logged and ignored rather than failing startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            signed_url_ttl_secs: env_u64("KILN_SIGNED_URL_TTL_SECS", defaults.signed_url_ttl_secs),
            signed_url_margin_ms: env_u64(
                "KILN_SIGNED_URL_MARGIN_MS",
                defaults.signed_url_margin_ms,
            ),
            url_cache_capacity: env_usize("KILN_URL_CACHE_CAPACITY", defaults.url_cache_capacity),
            chunk_size_bytes: env_usize("KILN_CHUNK_SIZE_BYTES", defaults.chunk_size_bytes),
            retry_delays_ms: env_u64_list("KILN_RETRY_DELAYS_MS", defaults.retry_delays_ms),
            max_upload_bytes: env_u64("KILN_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            thumbnail_timeout_secs: env_u64(
                "KILN_THUMBNAIL_TIMEOUT_SECS",
                defaults.thumbnail_timeout_secs,
            ),
            thumbnail_seek_secs: env_f64("KILN_THUMBNAIL_SEEK_SECS", defaults.thumbnail_seek_secs),
            ffmpeg_path: env::var("KILN_FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            visibility_seed_threshold: env_f64(
                "KILN_VISIBILITY_SEED_THRESHOLD",
                defaults.visibility_seed_threshold,
            ),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    parse_env(name, default)
}

fn env_usize(name: &str, default: usize) -> usize {
    parse_env(name, default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    parse_env(name, default)
}

fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "Unparseable config value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_u64_list(name: &str, default: Vec<u64>) -> Vec<u64> {
    match env::var(name) {
        Ok(raw) => {
            let parsed: Result<Vec<u64>, _> =
                raw.split(',').map(|part| part.trim().parse()).collect();
            match parsed {
                Ok(values) if !values.is_empty() => values,
                _ => {
                    tracing::warn!(var = name, value = %raw, "Unparseable delay list, using default");
                    default
                }
            }
        }
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_values() {
        let config = MediaConfig::default();
        assert_eq!(config.signed_url_ttl_secs, 180);
        assert_eq!(config.signed_url_margin_ms, 30_000);
        assert_eq!(config.chunk_size_bytes, 6 * 1024 * 1024);
        assert_eq!(config.max_upload_bytes, 3 * 1024 * 1024 * 1024);
        assert_eq!(config.retry_delays_ms, vec![0, 3_000, 5_000, 10_000, 20_000]);
    }
}
