//! Data module descriptors and their registry.

use crate::error::{SyncError, SyncResult};
use serde_json::Value;
use std::sync::Arc;

/// One local data domain (tasks, habits, bookmarks, ...).
///
/// Modules are owned by the host application; the engine treats `read` and
/// `write` as opaque capabilities and never inspects the value's shape
/// beyond hashing and envelope storage.
pub trait DataModule: Send + Sync {
    /// Unique module name, used as the hash-baseline key.
    fn name(&self) -> &str;

    /// Unique local filename; the remote copy lives at `sync-<filename>`.
    fn filename(&self) -> &str;

    /// Snapshot of the module's current data.
    fn read(&self) -> SyncResult<Value>;

    /// Replaces the module's data with a pulled value.
    fn write(&self, value: &Value) -> SyncResult<()>;
}

/// The fixed set of modules one engine instance syncs.
///
/// Owned by the engine (constructor-injected), never a process-wide
/// singleton, so independent engines can coexist in tests.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn DataModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module, rejecting duplicate names or filenames.
    pub fn register(&mut self, module: Arc<dyn DataModule>) -> SyncResult<()> {
        if self.modules.iter().any(|m| m.name() == module.name()) {
            return Err(SyncError::Registry(format!(
                "duplicate module name: {}",
                module.name()
            )));
        }
        if self.modules.iter().any(|m| m.filename() == module.filename()) {
            return Err(SyncError::Registry(format!(
                "duplicate module filename: {}",
                module.filename()
            )));
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DataModule>> {
        self.modules.iter().find(|m| m.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DataModule>> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
