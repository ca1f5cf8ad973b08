//! Content hashing and local change detection.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// SHA-256 hex digest over a value's JSON serialization.
///
/// `serde_json` keys objects with a sorted map, so the same `Value` always
/// serializes the same way within this process — which is all the comparison
/// logic relies on.
pub fn content_hash(value: &Value) -> String {
    hex::encode(Sha256::digest(value.to_string().as_bytes()))
}

/// Remembers the last-observed content hash per module.
///
/// Baselines live for the process lifetime (cleared explicitly); they decide
/// push-vs-pull direction in `auto_sync`.
#[derive(Default)]
pub struct HashTracker {
    baselines: Mutex<HashMap<String, String>>,
}

impl HashTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded hash for a module, if any.
    pub fn baseline(&self, name: &str) -> Option<String> {
        self.baselines.lock().unwrap().get(name).cloned()
    }

    /// Records a hash without consulting the previous value.
    pub fn set_baseline(&self, name: &str, hash: &str) {
        self.baselines
            .lock()
            .unwrap()
            .insert(name.to_string(), hash.to_string());
    }

    /// Compares a fresh hash of `value` against the stored baseline.
    ///
    /// The first observation of a module seeds the baseline and reports
    /// unchanged — a baseline cannot signal change before it exists. A
    /// differing later observation updates the baseline and reports changed.
    pub fn has_changed(&self, name: &str, value: &Value) -> bool {
        let hash = content_hash(value);
        let mut baselines = self.baselines.lock().unwrap();

        match baselines.get(name) {
            None => {
                baselines.insert(name.to_string(), hash);
                false
            }
            Some(prev) if *prev != hash => {
                baselines.insert(name.to_string(), hash);
                true
            }
            Some(_) => false,
        }
    }

    /// Drops every baseline.
    pub fn clear(&self) {
        self.baselines.lock().unwrap().clear();
    }
}
