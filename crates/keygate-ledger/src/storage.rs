//! Gate storage
//!
//! Persists protocol state, role memberships, the proxy identity and the
//! event journal as JSON files under a base directory.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::access::AccessControl;
use crate::gate::GateState;
use crate::outbox::LogRecord;
use crate::proxy::ProxySettings;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

pub struct GateStorage {
    base_path: PathBuf,
}

impl GateStorage {
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load protocol state; a fresh deployment has none yet
    pub fn load_state(&self) -> StorageResult<GateState> {
        Ok(load_json(&self.state_path())?.unwrap_or_default())
    }

    pub fn save_state(&self, state: &GateState) -> StorageResult<()> {
        save_json(&self.state_path(), state)
    }

    pub fn load_roles(&self) -> StorageResult<AccessControl> {
        Ok(load_json(&self.roles_path())?.unwrap_or_default())
    }

    pub fn save_roles(&self, roles: &AccessControl) -> StorageResult<()> {
        save_json(&self.roles_path(), roles)
    }

    /// Proxy identity, absent until the first deployment is saved
    pub fn load_proxy(&self) -> StorageResult<Option<ProxySettings>> {
        load_json(&self.proxy_path())
    }

    pub fn save_proxy(&self, settings: &ProxySettings) -> StorageResult<()> {
        save_json(&self.proxy_path(), settings)
    }

    /// Every record accepted so far, in sequence order
    pub fn load_log(&self) -> StorageResult<Vec<LogRecord>> {
        Ok(load_json(&self.log_path())?.unwrap_or_default())
    }

    pub fn save_log(&self, records: &[LogRecord]) -> StorageResult<()> {
        save_json(&self.log_path(), &records)
    }

    fn state_path(&self) -> PathBuf {
        self.base_path.join("state.json")
    }

    fn roles_path(&self) -> PathBuf {
        self.base_path.join("roles.json")
    }

    fn proxy_path(&self) -> PathBuf {
        self.base_path.join("proxy.json")
    }

    fn log_path(&self) -> PathBuf {
        self.base_path.join("events.json")
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let content = serde_json::to_string_pretty(value)?;

    // Write to temp file first, then rename
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
