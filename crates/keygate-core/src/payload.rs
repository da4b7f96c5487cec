//! Signature request payloads

use serde::{Deserialize, Serialize};

use crate::types::{Bytes, MessageHash};

/// What the signer network is asked to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SignaturePayload {
    /// A precomputed 32-byte digest
    Hash(MessageHash),

    /// Opaque data, hashed by the signer network
    Data(Bytes),

    /// A serialized transaction for the target network
    Transaction {
        data: Bytes,
        /// Whether the signer network should broadcast once signed
        broadcast: bool,
    },
}

/// Interpretation flags carried by request records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayloadKind {
    pub is_hash: bool,
    pub is_data: bool,
    pub is_transaction: bool,
    pub broadcast: bool,
}

impl SignaturePayload {
    pub fn hash(hash: [u8; 32]) -> Self {
        Self::Hash(MessageHash::new(hash))
    }

    pub fn data(data: impl Into<Vec<u8>>) -> Self {
        Self::Data(Bytes::new(data))
    }

    pub fn transaction(data: impl Into<Vec<u8>>, broadcast: bool) -> Self {
        Self::Transaction {
            data: Bytes::new(data),
            broadcast,
        }
    }

    /// Raw payload bytes as logged
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Hash(hash) => Bytes::from(hash.as_bytes().as_slice()),
            Self::Data(data) => data.clone(),
            Self::Transaction { data, .. } => data.clone(),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Hash(_) => PayloadKind {
                is_hash: true,
                ..PayloadKind::default()
            },
            Self::Data(_) => PayloadKind {
                is_data: true,
                ..PayloadKind::default()
            },
            Self::Transaction { broadcast, .. } => PayloadKind {
                is_transaction: true,
                broadcast: *broadcast,
                ..PayloadKind::default()
            },
        }
    }
}
