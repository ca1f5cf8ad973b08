//! Shared types for sync operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote repository hosting provider.
///
/// The two dialects expose the same repository-contents resource but differ
/// in base URL, default branch, and write semantics (Gitee separates create
/// from update and rejects naive creation calls).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    Gitee,
}

impl Provider {
    /// Branch used when the config omits one.
    pub fn default_branch(&self) -> &'static str {
        match self {
            Provider::GitHub => "main",
            Provider::Gitee => "master",
        }
    }

    /// API base URL for the hosted instance of this provider.
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::GitHub => "https://api.github.com",
            Provider::Gitee => "https://gitee.com/api/v5",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::GitHub => f.write_str("github"),
            Provider::Gitee => f.write_str("gitee"),
        }
    }
}

/// Remote connection credentials, persisted as one encrypted blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub provider: Provider,
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// Never empty after save/load; filled with the provider default when omitted.
    #[serde(default)]
    pub branch: String,
}

/// A remote file fetched through the contents API.
#[derive(Clone, Debug)]
pub struct RemoteFile {
    pub path: String,
    /// Provider-assigned revision token, used as the optimistic-concurrency
    /// guard on writes.
    pub sha: String,
    /// Decoded UTF-8 content.
    pub content: String,
    pub size: u64,
}

/// A directory listing entry. Listings carry no file content.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub size: u64,
}

/// JSON wrapper stored remotely for each module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncEnvelope {
    pub data: Value,
    /// ISO-8601 timestamp of the push that produced this envelope.
    #[serde(rename = "lastSyncTime")]
    pub last_sync_time: String,
    /// SHA-256 hex digest of `data`'s JSON serialization.
    pub hash: String,
}

/// Per-module sync state as reported by `SyncEngine::status`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncStatus {
    pub filename: String,
    pub local_hash: String,
    /// Empty when the remote envelope does not exist (never synced).
    pub cloud_hash: String,
    pub needs_sync: bool,
    pub last_sync_time: Option<String>,
}

/// What `auto_sync` (or a bulk operation) did for one module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAction {
    Pushed,
    Pulled,
    Deleted,
    UpToDate,
    /// The module could not be processed (local read failed).
    Skipped,
}

/// Per-module outcome of a bulk sync operation.
#[derive(Clone, Debug)]
pub struct SyncOutcome {
    pub name: String,
    pub action: SyncAction,
    pub ok: bool,
}
