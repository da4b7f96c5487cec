//! # Keygate Ledger
//!
//! The ledger-resident half of Keygate: a request/resolve state machine that
//! lets callers ask an off-ledger MPC signer network for public keys and
//! signatures, and lets the signer network post the results back.
//!
//! ## Components
//!
//! - [`SupportRegistry`] - supported wallet classifications and networks
//! - [`FeeGate`] - fee enforcement and accumulated balance
//! - [`KeyLedger`] - append-only key sequences per (classification, owner)
//! - [`KeyGate`] - the coordinator exposing the protocol operations
//! - [`Proxy`] - upgrade/delivery front with a separate administrator
//! - [`GateStorage`] - JSON persistence of state, roles, proxy and journal
//!
//! Callers request, watchers observe the [`EventLog`], signers resolve.

pub mod access;
pub mod fees;
pub mod gate;
pub mod keys;
pub mod outbox;
pub mod proxy;
pub mod registry;
pub mod storage;

pub use access::{AccessControl, RoleAdmin, RoleRegistry};
pub use fees::{FeeGate, NativeBalances, ValueTransfer};
pub use gate::{Call, GateState, KeyGate, SignatureResolution};
pub use keys::KeyLedger;
pub use outbox::{EventLog, LogRecord, Outbox};
pub use proxy::{Proxy, ProxySettings};
pub use registry::SupportRegistry;
pub use storage::{GateStorage, StorageError};

pub use keygate_core::{Error, Result};
