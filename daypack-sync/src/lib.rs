//! Repository-backed sync engine for Daypack.
//!
//! Keeps independently-owned local data domains (tasks, habits, bookmarks,
//! calendar, pomodoro, settings) consistent with JSON files in a remote
//! source-control repository, across two REST dialects with different write
//! semantics:
//! - Encrypted-at-rest connection config over a host-supplied key-value store
//! - A provider client normalizing GitHub and Gitee contents APIs, including
//!   Gitee's creation fallback chain and stale-sha retry
//! - Read-request coalescing with a short TTL
//! - Content-hash change detection driving a last-writer-wins push/pull policy

pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod provider;
pub mod registry;
pub mod request_cache;
pub mod store;
pub mod types;

pub use config::{ConfigStore, CONFIG_STORAGE_KEY};
pub use engine::{remote_path, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use hash::{content_hash, HashTracker};
pub use provider::RepoClient;
pub use registry::{DataModule, ModuleRegistry};
pub use request_cache::RequestCache;
pub use store::{FileStore, KvStore, MemoryStore};
pub use types::*;
