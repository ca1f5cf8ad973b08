//! Repository-contents client for the two provider dialects.
//!
//! GitHub and Gitee expose the same repository-contents resource with
//! materially different write semantics: GitHub upserts via PUT with an
//! optional sha, while Gitee separates POST (create) from PUT (update),
//! requires a sha on update, and rejects some naive creation calls outright.
//! The client normalizes both behind one contract and keeps the divergence
//! local: an ordered creation fallback chain for Gitee, and a single
//! refetch-and-retry for its stale-sha write rejections.

use crate::config::ConfigStore;
use crate::error::{SyncError, SyncResult};
use crate::request_cache::{CachedResponse, RequestCache};
use crate::types::{Provider, RemoteConfig, RemoteEntry, RemoteFile};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One attempt shape for creating a file on Gitee.
///
/// Tried in declaration order with early exit on first success.
#[derive(Clone, Copy, Debug)]
enum CreateStrategy {
    /// Plain creation call (POST, no sha).
    Direct,
    /// POST an empty placeholder, then PUT the real content with the
    /// placeholder's returned sha.
    Placeholder,
    /// PUT carrying an explicitly empty sha.
    EmptySha,
}

const CREATE_STRATEGIES: [CreateStrategy; 3] = [
    CreateStrategy::Direct,
    CreateStrategy::Placeholder,
    CreateStrategy::EmptySha,
];

/// Normalized file operations against the active provider.
///
/// Credentials are read from the [`ConfigStore`] on every operation, so a
/// re-login or provider switch takes effect without rebuilding the client.
/// Reads are de-duplicated through a [`RequestCache`]; writes bypass it and
/// invalidate the affected path's cached reads on success.
pub struct RepoClient {
    http: Client,
    config: Arc<ConfigStore>,
    cache: RequestCache,
    api_base: Option<String>,
}

impl RepoClient {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self::build(config, None)
    }

    /// Points the client at a self-hosted API base instead of the provider's
    /// hosted URL (GitHub Enterprise, private Gitee).
    pub fn with_api_base(config: Arc<ConfigStore>, api_base: impl Into<String>) -> Self {
        Self::build(config, Some(api_base.into()))
    }

    fn build(config: Arc<ConfigStore>, api_base: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            config,
            cache: RequestCache::new(),
            api_base,
        }
    }

    async fn active_config(&self) -> SyncResult<RemoteConfig> {
        self.config.active().await.ok_or(SyncError::ConfigMissing)
    }

    fn contents_url(&self, cfg: &RemoteConfig, path: &str) -> String {
        let base = self
            .api_base
            .as_deref()
            .unwrap_or_else(|| cfg.provider.api_base())
            .trim_end_matches('/');

        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!("{base}/repos/{}/{}/contents/{encoded}", cfg.owner, cfg.repo)
    }

    /// Fetches a file, or `None` when the provider answers anything but
    /// success — a missing remote copy is an expected outcome, not an error.
    pub async fn get_file(&self, path: &str) -> SyncResult<Option<RemoteFile>> {
        let cfg = self.active_config().await?;
        let url = format!("{}?ref={}", self.contents_url(&cfg, path), cfg.branch);

        let resp = self.cached_get(&url, &cfg.token).await.map_err(SyncError::Network)?;
        if !(200..300).contains(&resp.status) {
            if resp.status != 404 {
                debug!("read of {path} returned {}", resp.status);
            }
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&resp.body)?;
        // A directory path answers with an array; only file objects carry content.
        let Some(obj) = value.as_object() else {
            return Ok(None);
        };

        let content = match obj.get("content").and_then(Value::as_str) {
            Some(raw) => decode_content(raw)?,
            None => String::new(),
        };

        Ok(Some(RemoteFile {
            path: obj
                .get("path")
                .and_then(Value::as_str)
                .unwrap_or(path)
                .to_string(),
            sha: obj
                .get("sha")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            content,
            size: obj.get("size").and_then(Value::as_u64).unwrap_or(0),
        }))
    }

    /// Writes a file, creating it when absent.
    ///
    /// Without a caller-supplied sha the current one is discovered via
    /// [`get_file`](Self::get_file). Creation on Gitee runs the fallback
    /// chain; a stale-sha rejection on Gitee triggers exactly one
    /// refetch-and-retry. Returns whether the write landed.
    pub async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> SyncResult<bool> {
        let cfg = self.active_config().await?;

        let sha: Option<String> = match sha {
            Some(s) => Some(s.to_string()),
            None => self.get_file(path).await?.map(|f| f.sha),
        };

        if sha.is_none() && cfg.provider == Provider::Gitee {
            return self.create_with_fallback(&cfg, path, content, message).await;
        }

        match self
            .write_contents(&cfg, path, content, message, sha.as_deref())
            .await
        {
            Ok(()) => {
                self.invalidate_reads(&cfg, path);
                Ok(true)
            }
            Err(SyncError::RevisionConflict(detail)) if cfg.provider == Provider::Gitee => {
                debug!("stale sha writing {path} ({detail}), refetching and retrying once");
                // Drop the cached pre-write read so the refetch sees the
                // revision that beat us.
                self.invalidate_reads(&cfg, path);
                let fresh = self.get_file(path).await?.map(|f| f.sha);

                match self
                    .write_contents(&cfg, path, content, message, fresh.as_deref())
                    .await
                {
                    Ok(()) => {
                        self.invalidate_reads(&cfg, path);
                        Ok(true)
                    }
                    Err(e) => {
                        warn!("retried write for {path} failed: {e}");
                        Ok(false)
                    }
                }
            }
            Err(e @ SyncError::Network(_)) => Err(e),
            Err(e) => {
                warn!("write for {path} failed: {e}");
                Ok(false)
            }
        }
    }

    /// Deletes a file. An already-absent file satisfies the caller's intent,
    /// so it reports success.
    pub async fn delete_file(&self, path: &str, message: &str) -> SyncResult<bool> {
        let cfg = self.active_config().await?;

        let Some(file) = self.get_file(path).await? else {
            debug!("{path} already absent, delete is a no-op");
            return Ok(true);
        };

        let url = self.contents_url(&cfg, path);
        let request = match cfg.provider {
            Provider::GitHub => self.http.delete(&url).bearer_auth(&cfg.token).json(
                &serde_json::json!({
                    "message": message,
                    "sha": file.sha,
                    "branch": cfg.branch,
                }),
            ),
            // Gitee takes delete parameters in the query string.
            Provider::Gitee => self.http.delete(&url).bearer_auth(&cfg.token).query(&[
                ("message", message),
                ("sha", file.sha.as_str()),
                ("branch", cfg.branch.as_str()),
            ]),
        };

        let resp = request
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if resp.status().is_success() {
            self.invalidate_reads(&cfg, path);
            Ok(true)
        } else {
            warn!("delete of {path} returned {}", resp.status());
            Ok(false)
        }
    }

    /// Lists the files directly under `path`. Subdirectories are filtered
    /// out; listings never recurse.
    pub async fn list_files(&self, path: &str) -> SyncResult<Vec<RemoteEntry>> {
        let cfg = self.active_config().await?;
        let url = format!("{}?ref={}", self.contents_url(&cfg, path), cfg.branch);

        let resp = self.cached_get(&url, &cfg.token).await.map_err(SyncError::Network)?;
        if !(200..300).contains(&resp.status) {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(&resp.body)?;
        let Some(items) = value.as_array() else {
            return Ok(Vec::new());
        };

        Ok(items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("file"))
            .map(|item| RemoteEntry {
                name: item
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                path: item
                    .get("path")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                sha: item
                    .get("sha")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                size: item.get("size").and_then(Value::as_u64).unwrap_or(0),
            })
            .collect())
    }

    // ── Write plumbing ──

    async fn create_with_fallback(
        &self,
        cfg: &RemoteConfig,
        path: &str,
        content: &str,
        message: &str,
    ) -> SyncResult<bool> {
        for strategy in CREATE_STRATEGIES {
            match self.try_create(cfg, strategy, path, content, message).await {
                Ok(()) => {
                    debug!("created {path} via {strategy:?}");
                    self.invalidate_reads(cfg, path);
                    return Ok(true);
                }
                // A dead network fails every strategy identically; stop early.
                Err(e @ SyncError::Network(_)) => return Err(e),
                Err(e) => debug!("creation strategy {strategy:?} failed for {path}: {e}"),
            }
        }

        warn!("all creation strategies failed for {path}");
        Ok(false)
    }

    async fn try_create(
        &self,
        cfg: &RemoteConfig,
        strategy: CreateStrategy,
        path: &str,
        content: &str,
        message: &str,
    ) -> SyncResult<()> {
        match strategy {
            CreateStrategy::Direct => {
                self.post_contents(cfg, path, content, message).await?;
                Ok(())
            }
            CreateStrategy::Placeholder => {
                let sha = self
                    .post_contents(cfg, path, "", message)
                    .await?
                    .ok_or_else(|| {
                        SyncError::Api("placeholder creation returned no sha".to_string())
                    })?;
                self.write_contents(cfg, path, content, message, Some(&sha))
                    .await
            }
            CreateStrategy::EmptySha => {
                self.write_contents(cfg, path, content, message, Some(""))
                    .await
            }
        }
    }

    /// POST creation call. Returns the created file's sha when the provider
    /// includes one in the response.
    async fn post_contents(
        &self,
        cfg: &RemoteConfig,
        path: &str,
        content: &str,
        message: &str,
    ) -> SyncResult<Option<String>> {
        let url = self.contents_url(cfg, path);
        let body = serde_json::json!({
            "message": message,
            "content": BASE64.encode(content.as_bytes()),
            "branch": cfg.branch,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&cfg.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let resp_body = self.ensure_write_success(cfg, resp).await?;
        Ok(extract_written_sha(&resp_body))
    }

    /// Single PUT write carrying base64 content, commit message, branch, and
    /// the sha when present (the optimistic-concurrency guard).
    async fn write_contents(
        &self,
        cfg: &RemoteConfig,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> SyncResult<()> {
        let url = self.contents_url(cfg, path);
        let mut body = serde_json::json!({
            "message": message,
            "content": BASE64.encode(content.as_bytes()),
            "branch": cfg.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = Value::String(sha.to_string());
        }

        let resp = self
            .http
            .put(&url)
            .bearer_auth(&cfg.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        self.ensure_write_success(cfg, resp).await?;
        Ok(())
    }

    /// Maps a write response onto the error taxonomy, returning the body on
    /// success.
    async fn ensure_write_success(
        &self,
        cfg: &RemoteConfig,
        resp: reqwest::Response,
    ) -> SyncResult<String> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }

        let detail = format!("{status}: {}", truncate_body(&body));
        match status.as_u16() {
            401 | 403 => Err(SyncError::AuthFailed(detail)),
            404 => Err(SyncError::NotFound(detail)),
            409 => Err(SyncError::RevisionConflict(detail)),
            // Gitee reports a stale sha as a plain 400 whose message names
            // the field.
            400 if cfg.provider == Provider::Gitee && body.contains("sha") => {
                Err(SyncError::RevisionConflict(detail))
            }
            _ => Err(SyncError::Api(detail)),
        }
    }

    /// Issues a GET through the request cache. Concurrent identical reads
    /// share one network call; entries age out after the cache TTL.
    async fn cached_get(&self, url: &str, token: &str) -> Result<CachedResponse, String> {
        let key = format!("GET {url}");
        let http = self.http.clone();
        let url = url.to_string();
        let token = token.to_string();

        self.cache
            .get_or_fetch(&key, async move {
                let resp = http
                    .get(&url)
                    .bearer_auth(&token)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;
                let status = resp.status().as_u16();
                let body = resp.text().await.map_err(|e| e.to_string())?;
                Ok(CachedResponse { status, body })
            })
            .await
    }

    /// Drops cached reads of `path` (any query string) after a write, so the
    /// next read observes the new revision.
    fn invalidate_reads(&self, cfg: &RemoteConfig, path: &str) {
        self.cache
            .invalidate_prefix(&format!("GET {}", self.contents_url(cfg, path)));
    }
}

/// Decodes provider file content: base64, possibly newline-wrapped, holding
/// UTF-8 text. Multi-byte sequences survive because decoding operates on the
/// full byte stream, never on char-sized chunks.
fn decode_content(raw: &str) -> SyncResult<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| SyncError::Api(format!("invalid base64 content: {e}")))?;

    String::from_utf8(bytes).map_err(|e| SyncError::Api(format!("content is not UTF-8: {e}")))
}

/// Pulls `content.sha` out of a write response body.
fn extract_written_sha(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("content")?
        .get("sha")?
        .as_str()
        .map(str::to_string)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}
