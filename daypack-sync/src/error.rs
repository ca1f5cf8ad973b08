//! Sync error types.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Public engine operations convert most of these into boolean or optional
/// results; the typed taxonomy exists so the provider layer can make
/// per-variant decisions (benign not-found, one-shot conflict retry) and so
/// logs carry a precise cause.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no remote configuration available")]
    ConfigMissing,

    #[error("authentication rejected: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("write rejected, revision token is stale: {0}")]
    RevisionConflict(String),

    #[error("envelope hash mismatch for {module}: stored {stored}, computed {computed}")]
    Integrity {
        module: String,
        stored: String,
        computed: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] daypack_crypto::CryptoError),

    #[error("local storage error: {0}")]
    Storage(String),

    #[error("module registry error: {0}")]
    Registry(String),
}
