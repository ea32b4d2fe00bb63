//! Gjallar error types

use crate::cache::StoreError;

/// Gjallar error types
#[derive(Debug, thiserror::Error)]
pub enum GjallarError {
    /// Missing or invalid credential on a remote-classified request.
    ///
    /// Deliberately carries no detail about what was presented.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Uploaded payload exceeded the caller-supplied byte ceiling.
    ///
    /// The message includes the limit in MB for user-facing display.
    #[error("upload too large: maximum size is {}MB", .limit_bytes / (1024 * 1024))]
    UploadTooLarge { limit_bytes: u64 },

    /// The injected voice-prompt generator failed.
    ///
    /// Also produced when a coalesced cache computation fails and the
    /// original error is shared between several waiting callers.
    #[error("voice prompt generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Gjallar operations
pub type Result<T> = std::result::Result<T, GjallarError>;
