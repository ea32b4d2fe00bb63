//! Two-tier, content-addressed cache for voice prompts.
//!
//! A voice prompt is derived once per unique (reference audio, reference
//! text) pair by an expensive model call, then reused for every later
//! synthesis request with the same inputs. [`PromptCache`] keeps the
//! derived prompts in two tiers:
//!
//! - an in-process map (moka, bounded LRU) that answers within the
//!   current process lifetime, and
//! - a persistent store (see [`store`]) that survives restarts.
//!
//! Keys are content hashes ([`make_key`]), so identical inputs always
//! resolve to the same entry and no invalidation primitive is needed:
//! recomputing a key's value yields the same bytes.
//!
//! # Lookup protocol
//!
//! [`PromptCache::get`] checks memory first, then the store. A store hit
//! is promoted into memory before being returned. A store entry that
//! fails to deserialize is deleted and reported as a miss — corruption
//! self-heals instead of surfacing to the request.
//!
//! # Single-flight
//!
//! Concurrent misses on the same key would each trigger the expensive
//! generation step. [`PromptCache::get_or_compute`] coalesces them: one
//! caller runs the computation, the rest await its result. `get`/`put`
//! remain available for callers that drive generation themselves and can
//! tolerate duplicated work.

mod prompt;
pub mod store;

pub use prompt::{PromptTensor, VoicePrompt};
pub use store::{FsPromptStore, PromptStorage, StoreError, PROMPT_FILE_EXTENSION};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::telemetry;
use crate::{GjallarError, Result};

/// Default maximum number of prompts held in the in-process tier.
///
/// Prompts are megabytes each, so the bound is a count, not a byte size.
/// Eviction only drops the in-memory copy; the durable copy remains.
const DEFAULT_MAX_ENTRIES: u64 = 128;

/// Compute the cache key for a (content bytes, reference text) pair.
///
/// SHA-256 over the raw bytes followed by the UTF-8 text, rendered as
/// lowercase hex. Deterministic across calls, processes, and machines;
/// depends on nothing but the two inputs' byte content.
pub fn make_key(content_bytes: &[u8], reference_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content_bytes);
    hasher.update(reference_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Configuration for [`PromptCache`].
///
/// ```rust
/// # use gjallar::PromptCacheConfig;
/// let config = PromptCacheConfig::new()
///     .max_entries(32)
///     .dir("/var/lib/gjallar/cache");
/// ```
#[derive(Debug, Clone)]
pub struct PromptCacheConfig {
    /// Maximum entries in the in-process tier. Default: 128.
    pub max_entries: u64,
    /// Directory for the persistent tier.
    pub dir: PathBuf,
}

impl Default for PromptCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            dir: default_cache_dir(),
        }
    }
}

impl PromptCacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of in-process entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the persistent tier directory.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }
}

/// Default persistent location: `~/.cache/gjallar/prompts`.
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("gjallar")
        .join("prompts")
}

/// Two-tier voice prompt cache.
///
/// Construct one at process start and share it by handle across request
/// handlers; the in-process tier is internally synchronized.
pub struct PromptCache {
    memory: moka::future::Cache<String, VoicePrompt>,
    store: Arc<dyn PromptStorage>,
}

impl PromptCache {
    /// Create a cache with a filesystem-backed persistent tier.
    pub fn new(config: &PromptCacheConfig) -> Result<Self> {
        let store = FsPromptStore::new(&config.dir)?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create a cache over an injected persistent store.
    pub fn with_store(config: &PromptCacheConfig, store: Arc<dyn PromptStorage>) -> Self {
        let memory = moka::future::Cache::builder()
            .max_capacity(config.max_entries)
            .build();
        Self { memory, store }
    }

    /// Look up a prompt by key.
    ///
    /// Memory tier first, then the persistent store with promotion into
    /// memory on a hit. Returns `None` on a miss, including the
    /// self-healed corruption case.
    pub async fn get(&self, key: &str) -> Option<VoicePrompt> {
        if let Some(prompt) = self.memory.get(key).await {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => "memory").increment(1);
            return Some(prompt);
        }

        match self.load_from_store(key).await {
            Some(prompt) => {
                self.memory.insert(key.to_string(), prompt.clone()).await;
                Some(prompt)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Insert a prompt under `key` in both tiers.
    ///
    /// The memory tier is updated unconditionally; the write-through to
    /// the persistent store must succeed for the call to succeed, so both
    /// tiers end consistent after a successful `put`.
    pub async fn put(&self, key: &str, prompt: VoicePrompt) -> Result<()> {
        self.memory.insert(key.to_string(), prompt.clone()).await;
        self.store.save(key, &prompt).await?;
        Ok(())
    }

    /// Look up `key`, running `compute` at most once on a miss.
    ///
    /// Concurrent callers for the same absent key coalesce onto a single
    /// in-flight computation; its result lands in both tiers and is
    /// handed to every waiter. A failed computation is not cached.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<VoicePrompt>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VoicePrompt>>,
    {
        let init = async {
            if let Some(prompt) = self.load_from_store(key).await {
                return Ok(prompt);
            }
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

            let prompt = compute().await?;
            metrics::counter!(telemetry::PROMPTS_GENERATED_TOTAL).increment(1);
            self.store.save(key, &prompt).await?;
            Ok(prompt)
        };

        self.memory
            .try_get_with(key.to_string(), init)
            .await
            .map_err(|e: Arc<GjallarError>| match Arc::try_unwrap(e) {
                Ok(err) => err,
                // The error is shared with other coalesced waiters.
                Err(shared) => GjallarError::Generation(shared.to_string()),
            })
    }

    /// Number of prompts currently in the in-process tier.
    pub fn len(&self) -> u64 {
        self.memory.entry_count()
    }

    /// Whether the in-process tier is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load from the persistent tier, self-healing corrupt entries.
    ///
    /// Unreadable files are logged and reported as misses: cache-layer
    /// failures cost a recomputation, never a failed request.
    async fn load_from_store(&self, key: &str) -> Option<VoicePrompt> {
        match self.store.load(key).await {
            Ok(Some(prompt)) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => "disk").increment(1);
                Some(prompt)
            }
            Ok(None) => None,
            Err(StoreError::Corrupt(e)) => {
                metrics::counter!(telemetry::CACHE_CORRUPT_TOTAL).increment(1);
                warn!(key, error = %e, "corrupt voice prompt on disk, discarding");
                if let Err(e) = self.store.delete(key).await {
                    warn!(key, error = %e, "failed to remove corrupt prompt file");
                }
                None
            }
            Err(e) => {
                warn!(key, error = %e, "failed to read prompt store");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_key_deterministic() {
        let k1 = make_key(b"audio-bytes", "hello there");
        let k2 = make_key(b"audio-bytes", "hello there");
        assert_eq!(k1, k2);
    }

    #[test]
    fn make_key_is_hex_sha256() {
        let key = make_key(b"", "");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn make_key_differs_on_content() {
        let k1 = make_key(b"audio-a", "text");
        let k2 = make_key(b"audio-b", "text");
        assert_ne!(k1, k2);
    }

    #[test]
    fn make_key_differs_on_text() {
        let k1 = make_key(b"audio", "text-a");
        let k2 = make_key(b"audio", "text-b");
        assert_ne!(k1, k2);
    }
}
