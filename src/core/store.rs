//! Snapshot persistence.
//!
//! Two backends sit behind [`SnapshotStore`]:
//! - `Local`: a pretty-printed JSON file under `.taskgame/data/`
//! - `Remote`: one file inside a GitHub Gist
//!
//! [`FallbackStore`] combines them the way the household app always has:
//! read the remote copy when it is reachable, otherwise the local file;
//! write both, with the local file acting as the backup.

use crate::core::config::RemoteTarget;
use crate::core::error::TaskGameError;
use crate::core::schemas;
use crate::core::snapshot::Snapshot;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Store type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Local JSON file, always available.
    Local,
    /// Hosted document store, optional.
    Remote,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Local => write!(f, "local"),
            StoreKind::Remote => write!(f, "remote"),
        }
    }
}

/// Which copies a save reached. `remote` is `None` when no remote is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub remote: Option<bool>,
    pub local: bool,
}

pub trait SnapshotStore {
    /// `Ok(None)` means the store is reachable but holds no snapshot yet.
    fn load(&self) -> Result<Option<Snapshot>, TaskGameError>;
    fn save(&self, snapshot: &Snapshot) -> Result<SaveReport, TaskGameError>;
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct LocalFileStore {
    path: PathBuf,
}

impl LocalFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for LocalFileStore {
    fn load(&self) -> Result<Option<Snapshot>, TaskGameError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), "loaded local snapshot");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<SaveReport, TaskGameError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "saved local snapshot");
        Ok(SaveReport {
            remote: None,
            local: true,
        })
    }

    fn describe(&self) -> String {
        format!("{} ({})", StoreKind::Local, self.path.display())
    }
}

/// One file inside a GitHub Gist.
pub struct GistStore {
    target: RemoteTarget,
    client: Client,
}

impl GistStore {
    pub fn new(target: RemoteTarget) -> Result<Self, TaskGameError> {
        Ok(Self {
            target,
            client: http_client()?,
        })
    }

    fn gist_url(&self) -> String {
        format!("{}/gists/{}", self.target.api_base, self.target.gist_id)
    }

    /// Pulls the snapshot file out of a gist API response. A gist without
    /// the file is `Ok(None)`; truncated content is fetched from `raw_url`.
    pub fn extract_snapshot(
        &self,
        gist: &JsonValue,
    ) -> Result<Option<Snapshot>, TaskGameError> {
        let Some(file) = gist
            .get("files")
            .and_then(|files| files.get(&self.target.file_name))
        else {
            return Ok(None);
        };
        let truncated = file
            .get("truncated")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let content = match (truncated, file.get("raw_url").and_then(|v| v.as_str())) {
            (true, Some(raw_url)) => {
                debug!(raw_url, "gist content truncated, fetching raw file");
                let resp = self
                    .client
                    .get(raw_url)
                    .header("Authorization", format!("token {}", self.target.token))
                    .send()?;
                check_status(&resp, "GET", raw_url)?;
                resp.text()?
            }
            _ => file
                .get("content")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    TaskGameError::RemoteError(format!(
                        "gist file '{}' has no content",
                        self.target.file_name
                    ))
                })?
                .to_string(),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Body of the PATCH request that replaces the snapshot file.
    pub fn update_payload(file_name: &str, snapshot: &Snapshot) -> Result<JsonValue, TaskGameError> {
        Ok(serde_json::json!({
            "files": {
                file_name: { "content": serde_json::to_string_pretty(snapshot)? }
            },
            "description": schemas::REMOTE_UPDATE_DESCRIPTION
        }))
    }

    /// Creates a new private gist holding `snapshot` and returns its id.
    pub fn create(
        api_base: &str,
        token: &str,
        file_name: &str,
        snapshot: &Snapshot,
    ) -> Result<String, TaskGameError> {
        let url = format!("{}/gists", api_base.trim_end_matches('/'));
        let payload = serde_json::json!({
            "description": schemas::REMOTE_CREATE_DESCRIPTION,
            "public": false,
            "files": {
                file_name: { "content": serde_json::to_string_pretty(snapshot)? },
                "README.md": { "content": schemas::REMOTE_README }
            }
        });
        let resp = http_client()?
            .post(&url)
            .header("Authorization", format!("token {}", token))
            .header("Accept", schemas::REMOTE_ACCEPT_HEADER)
            .json(&payload)
            .send()?;
        check_status(&resp, "POST", &url)?;
        let body: JsonValue = resp.json()?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TaskGameError::RemoteError("gist create response has no id".to_string()))?;
        info!(gist_id = id, "created remote gist");
        Ok(id.to_string())
    }
}

impl SnapshotStore for GistStore {
    fn load(&self) -> Result<Option<Snapshot>, TaskGameError> {
        let url = self.gist_url();
        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("token {}", self.target.token))
            .header("Accept", schemas::REMOTE_ACCEPT_HEADER)
            .send()?;
        check_status(&resp, "GET", &url)?;
        let gist: JsonValue = resp.json()?;
        self.extract_snapshot(&gist)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<SaveReport, TaskGameError> {
        let url = self.gist_url();
        let payload = Self::update_payload(&self.target.file_name, snapshot)?;
        let resp = self
            .client
            .patch(&url)
            .header("Authorization", format!("token {}", self.target.token))
            .header("Accept", schemas::REMOTE_ACCEPT_HEADER)
            .json(&payload)
            .send()?;
        check_status(&resp, "PATCH", &url)?;
        Ok(SaveReport {
            remote: Some(true),
            local: false,
        })
    }

    fn describe(&self) -> String {
        format!("{} (gist {})", StoreKind::Remote, self.target.gist_id)
    }
}

fn http_client() -> Result<Client, TaskGameError> {
    Ok(Client::builder()
        .user_agent(concat!("taskgame/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

fn check_status(
    resp: &reqwest::blocking::Response,
    method: &str,
    url: &str,
) -> Result<(), TaskGameError> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(TaskGameError::RemoteError(format!(
            "{} {} returned {}",
            method,
            url,
            resp.status()
        )))
    }
}

/// Remote-first reads, write-everywhere saves.
pub struct FallbackStore<R: SnapshotStore = GistStore> {
    remote: Option<R>,
    local: LocalFileStore,
}

impl<R: SnapshotStore> FallbackStore<R> {
    pub fn new(remote: Option<R>, local: LocalFileStore) -> Self {
        Self { remote, local }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn local(&self) -> &LocalFileStore {
        &self.local
    }
}

impl<R: SnapshotStore> SnapshotStore for FallbackStore<R> {
    fn load(&self) -> Result<Option<Snapshot>, TaskGameError> {
        if let Some(remote) = &self.remote {
            match remote.load() {
                Ok(Some(snapshot)) => {
                    debug!(store = %remote.describe(), "snapshot loaded");
                    return Ok(Some(snapshot));
                }
                Ok(None) => warn!(
                    store = %remote.describe(),
                    "remote store holds no snapshot, using local data"
                ),
                Err(e) => warn!(
                    store = %remote.describe(),
                    error = %e,
                    "could not load from remote store, using local data"
                ),
            }
        }
        self.local.load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<SaveReport, TaskGameError> {
        let remote = self.remote.as_ref().map(|remote| match remote.save(snapshot) {
            Ok(_) => true,
            Err(e) => {
                warn!(store = %remote.describe(), error = %e, "remote save failed");
                false
            }
        });
        let local = self.local.save(snapshot)?;
        Ok(SaveReport {
            remote,
            local: local.local,
        })
    }

    fn describe(&self) -> String {
        match &self.remote {
            Some(remote) => format!("{} + {}", remote.describe(), self.local.describe()),
            None => self.local.describe(),
        }
    }
}
