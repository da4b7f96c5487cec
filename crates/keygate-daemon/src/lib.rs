//! Keygate Daemon - Off-ledger side of the key and signature protocol
//!
//! This crate provides:
//! - Configuration and deployment bootstrap from persisted state
//! - Signer backends that provision keys and produce signatures
//! - A watcher that serves request records and posts resolutions back

pub mod config;
pub mod deployment;
pub mod error;
pub mod signer;
pub mod watcher;

pub use config::{ClassificationConfig, DaemonConfig};
pub use deployment::{deploy, open_gate, persist};
pub use error::{DaemonError, Result};
pub use signer::{DevSigner, SignerBackend, SigningRequest};
pub use watcher::{SharedGate, WatchAction, Watcher};
