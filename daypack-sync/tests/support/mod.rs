//! Shared helpers for integration tests against wiremock servers.
#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use daypack_sync::{
    content_hash, ConfigStore, DataModule, MemoryStore, Provider, RemoteConfig, RepoClient,
    SyncError, SyncResult,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Client whose active config points at a mock server.
pub async fn client_for(server_uri: &str, provider: Provider) -> Arc<RepoClient> {
    let store = Arc::new(MemoryStore::new());
    let config = Arc::new(ConfigStore::new(store));
    config
        .save(RemoteConfig {
            provider,
            token: "t0ken".into(),
            owner: "acme".into(),
            repo: "daypack-data".into(),
            branch: String::new(),
        })
        .await
        .expect("config save must succeed");

    Arc::new(RepoClient::with_api_base(config, server_uri))
}

/// Client with no saved config at all.
pub fn unconfigured_client(server_uri: &str) -> Arc<RepoClient> {
    let config = Arc::new(ConfigStore::new(Arc::new(MemoryStore::new())));
    Arc::new(RepoClient::with_api_base(config, server_uri))
}

/// Contents-API file object, base64 content wrapped at 60 columns the way
/// GitHub serves it.
pub fn contents_response(path: &str, content: &str, sha: &str) -> Value {
    let encoded = BASE64.encode(content.as_bytes());
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "type": "file",
        "name": path.rsplit('/').next().unwrap_or(path),
        "path": path,
        "sha": sha,
        "size": content.len(),
        "content": wrapped,
        "encoding": "base64",
    })
}

/// Envelope body as the engine stores it remotely.
pub fn envelope_body(data: &Value) -> String {
    json!({
        "data": data,
        "lastSyncTime": "2026-08-01T09:30:00+00:00",
        "hash": content_hash(data),
    })
    .to_string()
}

/// Decodes the envelope JSON out of a captured write request body.
pub fn decode_written_content(request_body: &[u8]) -> String {
    let body: Value = serde_json::from_slice(request_body).expect("write body must be JSON");
    let encoded = body["content"].as_str().expect("write body must carry content");
    let bytes = BASE64.decode(encoded).expect("content must be base64");
    String::from_utf8(bytes).expect("content must be UTF-8")
}

/// In-memory module recording every `write` it receives.
pub struct MemoryModule {
    name: String,
    filename: String,
    data: Mutex<Value>,
    written: Mutex<Vec<Value>>,
}

impl MemoryModule {
    pub fn new(name: &str, filename: &str, initial: Value) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            filename: filename.to_string(),
            data: Mutex::new(initial),
            written: Mutex::new(Vec::new()),
        })
    }

    pub fn set_data(&self, value: Value) {
        *self.data.lock().unwrap() = value;
    }

    pub fn data(&self) -> Value {
        self.data.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Value> {
        self.written.lock().unwrap().clone()
    }
}

impl DataModule for MemoryModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn read(&self) -> SyncResult<Value> {
        Ok(self.data.lock().unwrap().clone())
    }

    fn write(&self, value: &Value) -> SyncResult<()> {
        self.written.lock().unwrap().push(value.clone());
        *self.data.lock().unwrap() = value.clone();
        Ok(())
    }
}

/// Module whose local reads always fail.
pub struct BrokenModule {
    pub name: String,
    pub filename: String,
}

impl BrokenModule {
    pub fn new(name: &str, filename: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            filename: filename.to_string(),
        })
    }
}

impl DataModule for BrokenModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn read(&self) -> SyncResult<Value> {
        Err(SyncError::Storage("backing store unavailable".into()))
    }

    fn write(&self, _value: &Value) -> SyncResult<()> {
        Err(SyncError::Storage("backing store unavailable".into()))
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
