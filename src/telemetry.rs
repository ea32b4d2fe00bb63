//! Telemetry metric name constants.
//!
//! Centralised metric names for gjallar operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `gjallar_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `tier` — cache tier that answered: "memory" or "disk"

/// Total remote requests denied by the auth gate.
pub const AUTH_DENIED_TOTAL: &str = "gjallar_auth_denied_total";

/// Total uploads rejected for exceeding their byte ceiling.
pub const UPLOADS_REJECTED_TOTAL: &str = "gjallar_uploads_rejected_total";

/// Total prompt cache hits.
///
/// Labels: `tier` ("memory" | "disk").
pub const CACHE_HITS_TOTAL: &str = "gjallar_cache_hits_total";

/// Total prompt cache misses (neither tier answered).
pub const CACHE_MISSES_TOTAL: &str = "gjallar_cache_misses_total";

/// Total corrupt prompt files discarded by the self-healing load path.
pub const CACHE_CORRUPT_TOTAL: &str = "gjallar_cache_corrupt_total";

/// Total voice prompts generated on a confirmed cache miss.
pub const PROMPTS_GENERATED_TOTAL: &str = "gjallar_prompts_generated_total";
