//! Project discovery and `.taskgame/config.toml` loading.

use crate::core::error::TaskGameError;
use crate::core::schemas;
use crate::plugins::accrual::AccrualPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub accrual: AccrualPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File name under `.taskgame/data/`.
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: schemas::DEFAULT_DATA_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub gist_id: Option<String>,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
    pub file_name: String,
    pub api_base: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            gist_id: None,
            token_env: schemas::DEFAULT_REMOTE_TOKEN_ENV.to_string(),
            file_name: schemas::DEFAULT_DATA_FILE.to_string(),
            api_base: schemas::DEFAULT_REMOTE_API_BASE.to_string(),
        }
    }
}

/// Fully resolved remote settings. Only exists when both an id and a token
/// are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub gist_id: String,
    pub token: String,
    pub file_name: String,
    pub api_base: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), TaskGameError> {
        if self.storage.data_file.trim().is_empty() {
            return Err(TaskGameError::ValidationError(
                "storage.data_file must not be empty".to_string(),
            ));
        }
        if self.accrual.days_per_step == 0 {
            return Err(TaskGameError::ValidationError(
                "accrual.days_per_step must be at least 1".to_string(),
            ));
        }
        if self.remote.file_name.trim().is_empty() {
            return Err(TaskGameError::ValidationError(
                "remote.file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves the remote target from the process environment.
    pub fn resolve_remote(&self) -> Option<RemoteTarget> {
        self.resolve_remote_with(|key| std::env::var(key).ok())
    }

    /// Resolves the remote target with an explicit variable lookup.
    /// `TASKGAME_GIST_ID` wins over `remote.gist_id`.
    pub fn resolve_remote_with<F>(&self, lookup: F) -> Option<RemoteTarget>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gist_id = lookup(schemas::REMOTE_GIST_ID_ENV)
            .or_else(|| self.remote.gist_id.clone())
            .filter(|id| !id.trim().is_empty())?;
        let token = lookup(&self.remote.token_env).filter(|t| !t.trim().is_empty())?;
        Some(RemoteTarget {
            gist_id,
            token,
            file_name: self.remote.file_name.clone(),
            api_base: self.remote.api_base.trim_end_matches('/').to_string(),
        })
    }
}

pub fn project_dir(root: &Path) -> PathBuf {
    root.join(schemas::PROJECT_DIR_NAME)
}

pub fn config_path(root: &Path) -> PathBuf {
    project_dir(root).join(schemas::CONFIG_FILE_NAME)
}

pub fn data_path(root: &Path, config: &Config) -> PathBuf {
    project_dir(root)
        .join(schemas::DATA_DIR_NAME)
        .join(&config.storage.data_file)
}

/// Walks up from `start_dir` until a `.taskgame/` directory is found.
pub fn find_project_root(start_dir: &Path) -> Result<PathBuf, TaskGameError> {
    let mut current_dir = PathBuf::from(start_dir);
    loop {
        if project_dir(&current_dir).exists() {
            return Ok(current_dir);
        }
        if !current_dir.pop() {
            return Err(TaskGameError::NotFound(
                "'.taskgame' directory not found in current or parent directories. Run `taskgame init` first.".to_string(),
            ));
        }
    }
}

/// Loads `.taskgame/config.toml` under `root`. A missing file is the
/// default configuration, not an error.
pub fn load_config(root: &Path) -> Result<Config, TaskGameError> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Config file written by `taskgame init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# TaskGame configuration

[storage]
data_file = "colocation_data.json"

[remote]
# gist_id = "<id printed by `taskgame remote create`>"
token_env = "GITHUB_TOKEN"
file_name = "colocation_data.json"
api_base = "https://api.github.com"

[accrual]
days_per_step = 7
max_bonus = 3
"#;
