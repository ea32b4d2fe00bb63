//! Environment-driven boundary configuration.
//!
//! The boundary consumes three pieces of deployment configuration: the
//! shared API secret, the per-category upload ceilings, and the data
//! directory that hosts the persistent prompt cache. All of it comes from
//! `GJALLAR_*` environment variables with per-field defaults; there is no
//! config file.
//!
//! Lookup is injectable ([`BoundaryConfig::from_lookup`]) so tests never
//! have to mutate process-global environment state.

use std::path::PathBuf;

/// Environment variable holding the shared API secret.
pub const ENV_API_TOKEN: &str = "GJALLAR_API_TOKEN";

/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "GJALLAR_DATA_DIR";

/// Environment variable overriding the audio upload ceiling, in MB.
pub const ENV_MAX_UPLOAD_MB_AUDIO: &str = "GJALLAR_MAX_UPLOAD_MB_AUDIO";

/// Environment variable overriding the image upload ceiling, in MB.
pub const ENV_MAX_UPLOAD_MB_IMAGE: &str = "GJALLAR_MAX_UPLOAD_MB_IMAGE";

/// Default audio upload ceiling in MB (reference clips can be long).
const DEFAULT_MAX_UPLOAD_MB_AUDIO: u64 = 100;

/// Default image upload ceiling in MB (avatars).
const DEFAULT_MAX_UPLOAD_MB_IMAGE: u64 = 5;

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Byte ceilings for the upload categories the backend accepts.
///
/// Each ceiling is passed per call to the upload reader; this struct only
/// carries the configured values.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    /// Maximum audio payload size in bytes (default: 100 MB).
    pub audio_bytes: u64,
    /// Maximum image payload size in bytes (default: 5 MB).
    pub image_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            audio_bytes: DEFAULT_MAX_UPLOAD_MB_AUDIO * 1024 * 1024,
            image_bytes: DEFAULT_MAX_UPLOAD_MB_IMAGE * 1024 * 1024,
        }
    }
}

/// Boundary configuration consumed by the request gate and the caches.
#[derive(Debug, Clone)]
pub struct BoundaryConfig {
    /// Shared API secret. `None` means remote requests are always rejected.
    pub api_token: Option<String>,
    /// Root data directory; the prompt cache lives under `<data_dir>/cache`.
    pub data_dir: PathBuf,
    /// Upload byte ceilings per payload category.
    pub limits: UploadLimits,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            data_dir: default_data_dir(),
            limits: UploadLimits::default(),
        }
    }
}

impl BoundaryConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_token: lookup(ENV_API_TOKEN)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            data_dir: lookup(ENV_DATA_DIR)
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
            limits: UploadLimits {
                audio_bytes: limit_mb(&lookup, ENV_MAX_UPLOAD_MB_AUDIO, DEFAULT_MAX_UPLOAD_MB_AUDIO)
                    * 1024
                    * 1024,
                image_bytes: limit_mb(&lookup, ENV_MAX_UPLOAD_MB_IMAGE, DEFAULT_MAX_UPLOAD_MB_IMAGE)
                    * 1024
                    * 1024,
            },
        }
    }

    /// Directory holding persisted voice prompts: `<data_dir>/cache`.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}

/// Parse a megabyte count from the lookup, clamped to ≥ 1.
///
/// Unset or unparsable values fall back to `default_mb`.
fn limit_mb(lookup: &impl Fn(&str) -> Option<String>, name: &str, default_mb: u64) -> u64 {
    lookup(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_mb)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + '_ {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = BoundaryConfig::from_lookup(|_| None);
        assert_eq!(config.api_token, None);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.limits.audio_bytes, 100 * 1024 * 1024);
        assert_eq!(config.limits.image_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn token_is_trimmed_and_blank_means_unset() {
        let config = BoundaryConfig::from_lookup(lookup_from(&[(ENV_API_TOKEN, "  s3cr3t  ")]));
        assert_eq!(config.api_token.as_deref(), Some("s3cr3t"));

        let config = BoundaryConfig::from_lookup(lookup_from(&[(ENV_API_TOKEN, "   ")]));
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn limits_parse_and_clamp() {
        let config = BoundaryConfig::from_lookup(lookup_from(&[
            (ENV_MAX_UPLOAD_MB_AUDIO, "20"),
            (ENV_MAX_UPLOAD_MB_IMAGE, "0"),
        ]));
        assert_eq!(config.limits.audio_bytes, 20 * 1024 * 1024);
        // Clamped to the 1 MB floor.
        assert_eq!(config.limits.image_bytes, 1024 * 1024);
    }

    #[test]
    fn unparsable_limit_falls_back_to_default() {
        let config =
            BoundaryConfig::from_lookup(lookup_from(&[(ENV_MAX_UPLOAD_MB_AUDIO, "lots")]));
        assert_eq!(config.limits.audio_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn cache_dir_is_under_data_dir() {
        let config = BoundaryConfig::from_lookup(lookup_from(&[(ENV_DATA_DIR, "/srv/gjallar")]));
        assert_eq!(config.cache_dir(), PathBuf::from("/srv/gjallar/cache"));
    }
}
