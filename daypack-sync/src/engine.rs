//! Sync orchestration over registered modules.
//!
//! The engine composes the provider client, module registry, and hash
//! tracker into per-module and bulk operations. Direction policy is
//! last-writer-wins: a module whose local data changed since its baseline is
//! pushed; an unchanged module with a differing remote is pulled (remote
//! assumed authoritative). Two replicas edited independently while offline
//! are not detected — there is no three-way merge.

use crate::error::{SyncError, SyncResult};
use crate::hash::{content_hash, HashTracker};
use crate::provider::RepoClient;
use crate::registry::{DataModule, ModuleRegistry};
use crate::types::{SyncAction, SyncEnvelope, SyncOutcome, SyncStatus};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Remote path for a module's envelope file.
pub fn remote_path(filename: &str) -> String {
    format!("sync-{filename}")
}

/// Per-module and bulk sync operations plus status reporting.
pub struct SyncEngine {
    client: Arc<RepoClient>,
    registry: ModuleRegistry,
    hashes: HashTracker,
}

impl SyncEngine {
    pub fn new(client: Arc<RepoClient>, registry: ModuleRegistry) -> Self {
        Self {
            client,
            registry,
            hashes: HashTracker::new(),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn hash_tracker(&self) -> &HashTracker {
        &self.hashes
    }

    /// Pushes one module's data to the remote envelope file.
    ///
    /// On success the module's baseline becomes the pushed hash, so an
    /// immediate repeat push writes an envelope with the same hash.
    pub async fn push_module(&self, module: &dyn DataModule) -> bool {
        let data = match module.read() {
            Ok(d) => d,
            Err(e) => {
                warn!("local read for {} failed: {e}", module.name());
                return false;
            }
        };

        let hash = content_hash(&data);
        let envelope = SyncEnvelope {
            data,
            last_sync_time: Utc::now().to_rfc3339(),
            hash: hash.clone(),
        };

        let body = match serde_json::to_string_pretty(&envelope) {
            Ok(b) => b,
            Err(e) => {
                warn!("envelope for {} failed to serialize: {e}", module.name());
                return false;
            }
        };

        let path = remote_path(module.filename());
        let message = format!("sync: update {}", module.filename());

        match self.client.put_file(&path, &body, &message, None).await {
            Ok(true) => {
                self.hashes.set_baseline(module.name(), &hash);
                debug!("pushed {}", module.name());
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("push for {} failed: {e}", module.name());
                false
            }
        }
    }

    /// Pulls the remote envelope into one module.
    ///
    /// A missing remote file is a failed pull. An envelope whose stored hash
    /// disagrees with the recomputed hash of its data is applied anyway —
    /// the mismatch is logged as an integrity warning, not treated as fatal.
    pub async fn pull_module(&self, module: &dyn DataModule) -> bool {
        let path = remote_path(module.filename());

        let file = match self.client.get_file(&path).await {
            Ok(Some(f)) => f,
            Ok(None) => {
                debug!("no remote copy of {} to pull", module.name());
                return false;
            }
            Err(e) => {
                warn!("remote read for {} failed: {e}", module.name());
                return false;
            }
        };

        let envelope: SyncEnvelope = match serde_json::from_str(&file.content) {
            Ok(env) => env,
            Err(e) => {
                warn!("envelope for {} failed to parse: {e}", module.name());
                return false;
            }
        };

        let computed = content_hash(&envelope.data);
        if computed != envelope.hash {
            let mismatch = SyncError::Integrity {
                module: module.name().to_string(),
                stored: envelope.hash.clone(),
                computed,
            };
            warn!("{mismatch}; applying anyway");
        }

        if let Err(e) = module.write(&envelope.data) {
            warn!("local write for {} failed: {e}", module.name());
            return false;
        }

        self.hashes.set_baseline(module.name(), &envelope.hash);
        debug!("pulled {}", module.name());
        true
    }

    /// Reports per-module sync state, checking every module concurrently.
    ///
    /// Each module's check settles independently: a module whose local read
    /// or remote fetch fails reports empty hashes and `needs_sync = false`
    /// instead of aborting the others.
    pub async fn status(&self) -> Vec<SyncStatus> {
        let checks = self.registry.iter().map(|module| async move {
            match self.check_module(module.as_ref()).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("status check for {} failed: {e}", module.name());
                    SyncStatus {
                        filename: module.filename().to_string(),
                        local_hash: String::new(),
                        cloud_hash: String::new(),
                        needs_sync: false,
                        last_sync_time: None,
                    }
                }
            }
        });

        futures::future::join_all(checks).await
    }

    async fn check_module(&self, module: &dyn DataModule) -> SyncResult<SyncStatus> {
        let local = module.read()?;
        let local_hash = content_hash(&local);

        let remote = self.client.get_file(&remote_path(module.filename())).await?;
        let (cloud_hash, last_sync_time) = match remote {
            Some(file) => match serde_json::from_str::<SyncEnvelope>(&file.content) {
                Ok(env) => (env.hash, Some(env.last_sync_time)),
                // An unreadable envelope counts as never synced.
                Err(_) => (String::new(), None),
            },
            None => (String::new(), None),
        };

        // An empty cloud hash never equals a local hash: "never synced" is
        // always a mismatch.
        let needs_sync = local_hash != cloud_hash;

        Ok(SyncStatus {
            filename: module.filename().to_string(),
            local_hash,
            cloud_hash,
            needs_sync,
            last_sync_time,
        })
    }

    /// Syncs every out-of-date module in the baseline-decided direction.
    ///
    /// Push when the module's local data changed since its baseline or the
    /// remote has no recorded hash; pull otherwise. Concurrent invocations
    /// for the same module are not mutually excluded and can race.
    pub async fn auto_sync(&self) -> Vec<SyncOutcome> {
        self.ensure_baselines();

        let statuses = self.status().await;
        let mut outcomes = Vec::with_capacity(statuses.len());

        for (module, status) in self.registry.iter().zip(statuses.iter()) {
            let name = module.name().to_string();

            if !status.needs_sync {
                outcomes.push(SyncOutcome {
                    name,
                    action: SyncAction::UpToDate,
                    ok: true,
                });
                continue;
            }

            let local_changed = match module.read() {
                Ok(data) => self.hashes.has_changed(module.name(), &data),
                Err(e) => {
                    warn!("local read for {} failed, skipping: {e}", module.name());
                    outcomes.push(SyncOutcome {
                        name,
                        action: SyncAction::Skipped,
                        ok: false,
                    });
                    continue;
                }
            };

            if local_changed || status.cloud_hash.is_empty() {
                let ok = self.push_module(module.as_ref()).await;
                outcomes.push(SyncOutcome {
                    name,
                    action: SyncAction::Pushed,
                    ok,
                });
            } else {
                let ok = self.pull_module(module.as_ref()).await;
                outcomes.push(SyncOutcome {
                    name,
                    action: SyncAction::Pulled,
                    ok,
                });
            }
        }

        let pushed = outcomes
            .iter()
            .filter(|o| o.action == SyncAction::Pushed)
            .count();
        let pulled = outcomes
            .iter()
            .filter(|o| o.action == SyncAction::Pulled)
            .count();
        info!(
            "auto sync finished: {} modules, {pushed} pushed, {pulled} pulled",
            outcomes.len()
        );

        outcomes
    }

    /// Unconditionally pushes every module, ignoring status.
    pub async fn push_all(&self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::with_capacity(self.registry.len());
        for module in self.registry.iter() {
            let ok = self.push_module(module.as_ref()).await;
            outcomes.push(SyncOutcome {
                name: module.name().to_string(),
                action: SyncAction::Pushed,
                ok,
            });
        }
        info!("pushed all {} modules", outcomes.len());
        outcomes
    }

    /// Unconditionally pulls every module, ignoring status.
    pub async fn pull_all(&self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::with_capacity(self.registry.len());
        for module in self.registry.iter() {
            let ok = self.pull_module(module.as_ref()).await;
            outcomes.push(SyncOutcome {
                name: module.name().to_string(),
                action: SyncAction::Pulled,
                ok,
            });
        }
        info!("pulled all {} modules", outcomes.len());
        outcomes
    }

    /// Deletes every module's remote envelope file.
    pub async fn cleanup(&self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::with_capacity(self.registry.len());
        for module in self.registry.iter() {
            let path = remote_path(module.filename());
            let message = format!("sync: remove {}", module.filename());

            let ok = match self.client.delete_file(&path, &message).await {
                Ok(ok) => ok,
                Err(e) => {
                    warn!("cleanup for {} failed: {e}", module.name());
                    false
                }
            };
            outcomes.push(SyncOutcome {
                name: module.name().to_string(),
                action: SyncAction::Deleted,
                ok,
            });
        }
        outcomes
    }

    /// Seeds a baseline for every module that has none yet.
    ///
    /// Seeding must not consume the change signal: `has_changed` still
    /// decides direction later in the same `auto_sync` pass.
    fn ensure_baselines(&self) {
        for module in self.registry.iter() {
            if self.hashes.baseline(module.name()).is_none() {
                match module.read() {
                    Ok(data) => self
                        .hashes
                        .set_baseline(module.name(), &content_hash(&data)),
                    Err(e) => warn!("baseline seed for {} failed: {e}", module.name()),
                }
            }
        }
    }
}
