//! Daemon configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use keygate_core::{Address, Amount};

use crate::error::{DaemonError, Result};

/// A classification to enable on first deployment, with its networks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub purpose: u64,

    pub coin_type: u64,

    /// CAIP-2 style network descriptors, e.g. `eip155:1`
    #[serde(default)]
    pub networks: Vec<String>,
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding gate state and role memberships
    pub state_dir: PathBuf,

    /// Deployer; becomes the protocol administrator
    pub admin: Address,

    /// Upgrade administrator of the proxy, must differ from `admin`
    pub proxy_admin: Address,

    /// Identity the watcher resolves requests as
    pub signer: Address,

    /// Fee set on first deployment
    pub fee: Amount,

    /// Hex seed for the development signer backend
    pub dev_seed: String,

    pub classifications: Vec<ClassificationConfig>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            state_dir: Self::default_state_dir(),
            admin: Address::new([0xa0; 20]),
            proxy_admin: Address::new([0xa1; 20]),
            signer: Address::new([0x5e; 20]),
            fee: 0,
            dev_seed: hex::encode(rand::random::<[u8; 32]>()),
            classifications: vec![ClassificationConfig {
                purpose: keygate_core::ids::PURPOSE_BIP44,
                coin_type: keygate_core::ids::COIN_TYPE_ETH,
                networks: vec![
                    "eip155:1".to_string(),
                    "eip155:5".to_string(),
                    "eip155:80001".to_string(),
                ],
            }],
        }
    }
}

impl DaemonConfig {
    fn default_state_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/var/lib"))
            .join("keygate")
            .join("state")
    }

    /// Default config location, overridable with `KEYGATE_CONFIG`
    pub fn default_path() -> PathBuf {
        std::env::var("KEYGATE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("/etc"))
                    .join("keygate")
                    .join("daemon.json")
            })
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file at `path`, writing a default one first if it is missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save(path)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create directories if they don't exist
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)?;
        Ok(())
    }

    /// Decoded development seed
    pub fn seed_bytes(&self) -> Result<[u8; 32]> {
        let mut seed = [0u8; 32];
        hex::decode_to_slice(self.dev_seed.trim_start_matches("0x"), &mut seed)
            .map_err(|e| DaemonError::Config(format!("dev_seed: {}", e)))?;
        Ok(seed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.admin == self.proxy_admin {
            return Err(DaemonError::Config(
                "admin and proxy_admin must be different identities".to_string(),
            ));
        }
        if self.signer.is_zero() {
            return Err(DaemonError::Config("signer must not be zero".to_string()));
        }
        self.seed_bytes()?;
        Ok(())
    }
}
