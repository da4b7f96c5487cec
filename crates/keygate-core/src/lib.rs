//! Keygate Core - Shared types, identifier derivation, and log records
//!
//! This crate provides the vocabulary shared by the on-ledger request/resolve
//! state machine and the off-ledger signer network that watches it.

pub mod error;
pub mod events;
pub mod ids;
pub mod payload;
pub mod types;

pub use error::{Error, Result};
pub use events::Event;
pub use ids::{derive_class_id, keccak256, parse_network_descriptor};
pub use payload::{PayloadKind, SignaturePayload};
pub use types::{Address, Amount, Bytes, ChainId, ClassId, MessageHash, PublicKey, Role};
