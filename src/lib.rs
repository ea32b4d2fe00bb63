//! Gjallar - request boundary for voice synthesis backends
//!
//! This crate is the front door that stands between untrusted requests
//! and an expensive voice-synthesis pipeline. It covers three
//! responsibilities:
//!
//! - **Trust gating** — classify whether the serving endpoint is
//!   loopback-only or exposed remotely, and enforce a shared-secret
//!   bearer token on remote requests ([`RequestGate`]).
//! - **Bounded ingestion** — stream untrusted upload payloads under a
//!   hard byte ceiling, in memory or spooled to a temp file with
//!   guaranteed cleanup ([`upload`]).
//! - **Prompt caching** — reuse the expensive per-(audio, text) voice
//!   prompt through a content-addressed, two-tier cache with corruption
//!   self-healing and single-flight computation ([`PromptCache`]).
//!
//! The HTTP framework, the synthesis model, and the on-disk blob format
//! all stay outside: handlers pass in already-parsed request parts, an
//! async byte source, and a compute closure.
//!
//! # Example
//!
//! ```rust,no_run
//! use gjallar::{
//!     BoundaryConfig, PromptCache, PromptCacheConfig, PromptTensor, RequestGate,
//!     RequestIdentity, VoicePrompt, make_key, upload,
//! };
//!
//! #[tokio::main]
//! async fn main() -> gjallar::Result<()> {
//!     // Once at startup.
//!     let config = BoundaryConfig::from_env();
//!     let gate = RequestGate::from_config(&config);
//!     let cache = PromptCache::new(&PromptCacheConfig::new().dir(config.cache_dir()))?;
//!
//!     // Per request: classify + authenticate, then ingest the payload.
//!     let request = RequestIdentity {
//!         bind_host: Some("0.0.0.0".into()),
//!         authorization: Some("Bearer s3cr3t".into()),
//!         ..Default::default()
//!     };
//!     gate.authorize(&request)?;
//!
//!     let body: &[u8] = b"...reference audio...";
//!     let audio =
//!         upload::read_limited(body, config.limits.audio_bytes, upload::DEFAULT_CHUNK_SIZE)
//!             .await?;
//!
//!     // Reuse the expensive voice prompt when the inputs were seen before.
//!     let key = make_key(&audio, "reference text");
//!     let prompt = cache
//!         .get_or_compute(&key, || async {
//!             // The real call goes to the synthesis model.
//!             Ok(VoicePrompt::Tensor(PromptTensor::vector(vec![0.0; 4])))
//!         })
//!         .await?;
//!     let _ = prompt;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod upload;

// Re-export main types at crate root
pub use auth::{ACCESS_TOKEN_PARAM, RequestGate, RequestIdentity, TrustContext};
pub use cache::{
    FsPromptStore, PromptCache, PromptCacheConfig, PromptStorage, PromptTensor, VoicePrompt,
    make_key,
};
pub use config::{BoundaryConfig, UploadLimits};
pub use error::{GjallarError, Result};
pub use upload::{DEFAULT_CHUNK_SIZE, read_limited, spool_to_temp};
