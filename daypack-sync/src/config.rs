//! Remote-connection configuration with encryption at rest.

use crate::error::SyncResult;
use crate::store::KvStore;
use crate::types::RemoteConfig;
use daypack_crypto::{decrypt_string, encrypt_string, CipherKey};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Storage key the encrypted config blob is persisted under.
pub const CONFIG_STORAGE_KEY: &str = "daypack.sync.config";

/// Application-embedded key for config-at-rest encryption.
///
/// Fixed key, so the blob is opaque on disk but anyone holding this binary
/// can decrypt it. Secure key custody is an explicit non-goal for
/// single-user local use.
const EMBEDDED_KEY: [u8; 32] = *b"daypack-local-config-at-rest-key";

/// Encrypts, persists, and loads remote credentials.
///
/// The persisted form is a single encrypted blob under [`CONFIG_STORAGE_KEY`]
/// in the host-supplied [`KvStore`]; the decrypted active config is kept in
/// memory and read on every remote operation.
pub struct ConfigStore {
    store: Arc<dyn KvStore>,
    key: CipherKey,
    current: RwLock<Option<RemoteConfig>>,
}

impl ConfigStore {
    /// Creates a store using the application-embedded key.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_key(store, CipherKey::from_bytes(EMBEDDED_KEY))
    }

    /// Creates a store with an explicit key.
    pub fn with_key(store: Arc<dyn KvStore>, key: CipherKey) -> Self {
        Self {
            store,
            key,
            current: RwLock::new(None),
        }
    }

    /// Encrypts and persists `config`, making it the active config.
    ///
    /// An omitted branch is resolved to the provider default before
    /// persisting, so a branch is never empty downstream.
    pub async fn save(&self, mut config: RemoteConfig) -> SyncResult<()> {
        if config.branch.trim().is_empty() {
            config.branch = config.provider.default_branch().to_string();
        }

        let plaintext = serde_json::to_string(&config)?;
        let blob = encrypt_string(&self.key, &plaintext)?;
        self.store.set(CONFIG_STORAGE_KEY, &blob)?;

        debug!(provider = %config.provider, "saved remote config");
        *self.current.write().await = Some(config);
        Ok(())
    }

    /// Loads the persisted config, making it the active config.
    ///
    /// Returns `None` when no blob exists or the blob fails to decrypt or
    /// parse — a damaged blob is treated as "not configured", not an error.
    pub async fn load(&self) -> Option<RemoteConfig> {
        let blob = self.store.get(CONFIG_STORAGE_KEY)?;

        let plaintext = match decrypt_string(&self.key, &blob) {
            Ok(p) => p,
            Err(e) => {
                warn!("persisted config failed to decrypt: {e}");
                return None;
            }
        };

        let mut config: RemoteConfig = match serde_json::from_str(&plaintext) {
            Ok(c) => c,
            Err(e) => {
                warn!("persisted config failed to parse: {e}");
                return None;
            }
        };

        // Blobs written before the branch default existed may carry an empty
        // branch; resolve on load as well as on save.
        if config.branch.trim().is_empty() {
            config.branch = config.provider.default_branch().to_string();
        }

        *self.current.write().await = Some(config.clone());
        Some(config)
    }

    /// Removes the persisted blob and forgets the active config.
    pub async fn clear(&self) -> SyncResult<()> {
        self.store.remove(CONFIG_STORAGE_KEY)?;
        *self.current.write().await = None;
        debug!("cleared remote config");
        Ok(())
    }

    /// Snapshot of the active in-memory config.
    pub async fn active(&self) -> Option<RemoteConfig> {
        self.current.read().await.clone()
    }
}
