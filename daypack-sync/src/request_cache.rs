//! Read-request de-duplication.
//!
//! Identical GET requests issued within a short window share one network
//! call: the first caller's in-flight future is handed to later callers as a
//! shared future, and everyone observes the same outcome. This is call
//! coalescing, not mutual exclusion — writes never pass through here.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Status and body captured from an HTTP response.
///
/// Cached outcomes must be `Clone`, so the response is fully read before it
/// enters the cache; transport failures are carried as their display string.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
}

type SharedFetch = Shared<BoxFuture<'static, Result<CachedResponse, String>>>;

struct CacheEntry {
    inserted_at: Instant,
    fetch: SharedFetch,
}

/// De-duplicates concurrent identical read requests.
///
/// Keys are `"<METHOD> <fully-qualified URL>"`. Entries expire a fixed
/// interval after insertion, whether or not the underlying request has
/// completed; expired entries are purged opportunistically on access.
pub struct RequestCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached outcome for `key`, or runs `fetch` and caches it.
    ///
    /// When a fresh entry exists, `fetch` is dropped unexecuted.
    pub async fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<CachedResponse, String>
    where
        F: Future<Output = Result<CachedResponse, String>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock().unwrap();
            entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);

            match entries.get(key) {
                Some(entry) => entry.fetch.clone(),
                None => {
                    let shared = fetch.boxed().shared();
                    entries.insert(
                        key.to_string(),
                        CacheEntry {
                            inserted_at: Instant::now(),
                            fetch: shared.clone(),
                        },
                    );
                    shared
                }
            }
        };

        shared.await
    }

    /// Drops every entry whose key starts with `prefix`.
    ///
    /// The provider client calls this after a successful write so the next
    /// read of the same path observes the new revision instead of a cached
    /// pre-write response.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}
