//! Request trust classification and shared-secret authentication.
//!
//! Two small, pure layers compose into the enforcement policy:
//!
//! - [`TrustContext::classify`] decides whether the serving endpoint is
//!   reachable only via loopback. Classification is computed fresh per
//!   request — a server can be rebound — and never touches the network.
//! - [`extract_token`] / [`token_is_valid`] pull a bearer or query
//!   credential out of already-parsed request parts and compare it against
//!   the configured secret in constant time.
//!
//! [`RequestGate`] ties both together: loopback-bound requests bypass the
//! token check entirely, remote requests must present the shared secret,
//! and a gate with no configured secret rejects every remote request
//! (fail closed). Construct one gate at startup and hand it to request
//! handlers by reference.
//!
//! Credentials never appear in logs or error messages.

use tracing::debug;

use crate::telemetry;
use crate::{GjallarError, Result};

/// Host identities that resolve to the local machine.
const LOOPBACK_HOSTS: &[&str] = &["127.0.0.1", "localhost", "::1"];

/// Conventional query parameter carrying the credential when no
/// `Authorization` header is present.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Whether `host` names a loopback identity.
///
/// Case-insensitive; surrounding whitespace and IPv6 bracket notation
/// (`[::1]`) are stripped before comparison.
pub fn is_loopback_host(host: &str) -> bool {
    let normalized = host.trim().to_ascii_lowercase();
    let bare = normalized
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(normalized.as_str());
    LOOPBACK_HOSTS.contains(&bare)
}

/// Per-request trust classification.
///
/// Derived per request and never persisted.
#[derive(Debug, Clone)]
pub struct TrustContext {
    /// The host the classification was based on, if any was available.
    pub host: Option<String>,
    /// Whether that host is a loopback identity.
    pub is_loopback: bool,
}

impl TrustContext {
    /// Classify a request from its server bind host, falling back to the
    /// request's own hostname when bind information is unavailable.
    ///
    /// Blank strings count as unavailable. When neither source yields a
    /// host, the context is conservatively non-loopback: missing host
    /// information must never disable authentication.
    pub fn classify(bind_host: Option<&str>, fallback_hostname: Option<&str>) -> Self {
        let host = bind_host
            .filter(|h| !h.trim().is_empty())
            .or_else(|| fallback_hostname.filter(|h| !h.trim().is_empty()));
        match host {
            Some(h) => Self {
                is_loopback: is_loopback_host(h),
                host: Some(h.to_string()),
            },
            None => Self {
                host: None,
                is_loopback: false,
            },
        }
    }

    /// Whether the endpoint is exposed beyond the local machine.
    pub fn is_remote(&self) -> bool {
        !self.is_loopback
    }
}

/// Extract the token value from an `Authorization` header.
///
/// The header must split into exactly a scheme and a value, with the
/// scheme matching `Bearer` case-insensitively. Anything else — missing
/// value, wrong scheme, empty token after trimming — yields `None`.
pub fn parse_bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.trim().splitn(2, char::is_whitespace);
    let scheme = parts.next()?;
    let token = parts.next()?.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Extract a credential from a request: bearer header first, then the
/// `access_token` query parameter. Blank values count as absent.
pub fn extract_token<'a>(
    authorization: Option<&'a str>,
    query_token: Option<&'a str>,
) -> Option<&'a str> {
    if let Some(token) = authorization.and_then(parse_bearer_token) {
        return Some(token);
    }
    query_token.map(str::trim).filter(|t| !t.is_empty())
}

/// Compare a provided credential against the configured secret.
///
/// Absence of either side is always invalid, so an unconfigured secret
/// can never be bypassed. The comparison itself is constant-time in the
/// token content.
pub fn token_is_valid(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (Some(p), Some(e)) if !p.is_empty() && !e.is_empty() => {
            constant_time_eq(p.as_bytes(), e.as_bytes())
        }
        _ => false,
    }
}

/// Byte equality without early exit on the first mismatch.
///
/// The length check short-circuits; content comparison must not.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// The already-parsed request parts the gate needs.
///
/// Produced by the HTTP layer; this crate never parses raw HTTP.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity {
    /// Host the server socket is bound to, when the transport exposes it.
    pub bind_host: Option<String>,
    /// Hostname from the request URL, used as a classification fallback.
    pub hostname: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Raw `access_token` query parameter value.
    pub access_token: Option<String>,
}

/// Auth gate combining trust classification with token validation.
///
/// Constructed once at startup from [`BoundaryConfig`](crate::BoundaryConfig)
/// and shared by reference across request handlers.
pub struct RequestGate {
    api_token: Option<String>,
}

impl RequestGate {
    /// Create a gate for the given shared secret.
    ///
    /// Blank secrets are normalized to `None`, which keeps the gate fail
    /// closed for remote requests.
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            api_token: api_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }

    /// Create a gate from boundary configuration.
    pub fn from_config(config: &crate::BoundaryConfig) -> Self {
        Self::new(config.api_token.clone())
    }

    /// Whether a secret is configured at all.
    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Admit or reject a request.
    ///
    /// Loopback-bound requests pass unconditionally. Remote requests must
    /// present the configured secret via bearer header or query parameter.
    pub fn authorize(&self, request: &RequestIdentity) -> Result<()> {
        let trust = TrustContext::classify(request.bind_host.as_deref(), request.hostname.as_deref());
        if trust.is_loopback {
            return Ok(());
        }

        let provided = extract_token(
            request.authorization.as_deref(),
            request.access_token.as_deref(),
        );
        if token_is_valid(provided, self.api_token.as_deref()) {
            Ok(())
        } else {
            metrics::counter!(telemetry::AUTH_DENIED_TOTAL).increment(1);
            debug!(host = trust.host.as_deref(), "denied unauthenticated remote request");
            Err(GjallarError::AuthenticationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_hosts_recognized() {
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("LOCALHOST"));
        assert!(is_loopback_host("::1"));
        assert!(is_loopback_host("[::1]"));
        assert!(is_loopback_host("  localhost  "));
        assert!(!is_loopback_host("0.0.0.0"));
        assert!(!is_loopback_host("192.168.1.10"));
        assert!(!is_loopback_host(""));
    }

    #[test]
    fn classify_prefers_bind_host() {
        let trust = TrustContext::classify(Some("0.0.0.0"), Some("localhost"));
        assert!(trust.is_remote());

        let trust = TrustContext::classify(Some("127.0.0.1"), Some("example.com"));
        assert!(trust.is_loopback);
    }

    #[test]
    fn classify_falls_back_to_hostname() {
        let trust = TrustContext::classify(None, Some("localhost"));
        assert!(trust.is_loopback);

        // Blank bind host counts as unavailable.
        let trust = TrustContext::classify(Some("  "), Some("localhost"));
        assert!(trust.is_loopback);
    }

    #[test]
    fn classify_without_host_is_remote() {
        let trust = TrustContext::classify(None, None);
        assert!(trust.is_remote());
        assert_eq!(trust.host, None);
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(parse_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer_token("Bearer   abc123  "), Some("abc123"));
        assert_eq!(parse_bearer_token("Basic abc123"), None);
        assert_eq!(parse_bearer_token("Bearer"), None);
        assert_eq!(parse_bearer_token("Bearer   "), None);
        assert_eq!(parse_bearer_token(""), None);
    }

    #[test]
    fn extraction_falls_back_to_query_param() {
        assert_eq!(extract_token(Some("Bearer abc"), Some("xyz")), Some("abc"));
        assert_eq!(extract_token(None, Some(" xyz ")), Some("xyz"));
        assert_eq!(extract_token(Some("Basic abc"), Some("xyz")), Some("xyz"));
        assert_eq!(extract_token(None, Some("   ")), None);
        assert_eq!(extract_token(None, None), None);
    }

    #[test]
    fn validity_requires_both_sides() {
        assert!(token_is_valid(Some("abc123"), Some("abc123")));
        assert!(!token_is_valid(Some("abc123"), Some("zzz")));
        assert!(!token_is_valid(None, Some("abc123")));
        assert!(!token_is_valid(Some("abc123"), None));
        assert!(!token_is_valid(None, None));
        assert!(!token_is_valid(Some(""), Some("")));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"same", b"same"));
        assert!(!constant_time_eq(b"same", b"different"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(constant_time_eq(b"", b""));
    }
}
