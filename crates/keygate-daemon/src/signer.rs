//! Signer backends
//!
//! The watcher delegates key provisioning and signing to a [`SignerBackend`].
//! A production backend talks to the MPC signer network; [`DevSigner`] derives
//! plain secp256k1 keys from a local seed for development and tests.

use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use tracing::debug;
use zeroize::Zeroizing;

use keygate_core::{keccak256, Address, Bytes, ChainId, ClassId, PayloadKind, PublicKey};

use crate::error::{DaemonError, Result};

/// A signature request as announced on the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub class_id: ClassId,
    pub owner: Address,
    pub index: u64,
    pub chain_id: ChainId,
    pub payload: Bytes,
    pub kind: PayloadKind,
}

impl SigningRequest {
    /// The 32-byte digest to sign
    ///
    /// Hash payloads are signed as-is; data and transaction payloads are
    /// hashed with Keccak-256 first.
    pub fn digest(&self) -> Result<[u8; 32]> {
        if self.kind.is_hash {
            self.payload.as_slice().try_into().map_err(|_| {
                DaemonError::SigningFailed(format!(
                    "hash payload must be 32 bytes, got {}",
                    self.payload.len()
                ))
            })
        } else {
            Ok(keccak256(self.payload.as_slice()))
        }
    }
}

/// Source of keys and signatures for the watcher
#[async_trait]
pub trait SignerBackend: Send + Sync {
    /// Produce the public key for slot `index` of `(class_id, owner)`
    async fn provision_key(&self, class_id: &ClassId, owner: &Address, index: u64)
        -> Result<PublicKey>;

    /// Sign with the key at the request's slot
    async fn sign(&self, request: &SigningRequest) -> Result<Bytes>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Development backend with one deterministic key per slot
pub struct DevSigner {
    seed: Zeroizing<[u8; 32]>,
}

impl DevSigner {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed: Zeroizing::new(seed),
        }
    }

    fn signing_key(&self, class_id: &ClassId, owner: &Address, index: u64) -> Result<SigningKey> {
        let mut material = Zeroizing::new(Vec::with_capacity(32 + 32 + 20 + 8));
        material.extend_from_slice(&self.seed[..]);
        material.extend_from_slice(class_id.as_bytes());
        material.extend_from_slice(owner.as_bytes());
        material.extend_from_slice(&index.to_be_bytes());

        let secret = Zeroizing::new(keccak256(&material));
        SigningKey::from_bytes((&*secret).into())
            .map_err(|e| DaemonError::SigningFailed(format!("Invalid derived key: {}", e)))
    }
}

#[async_trait]
impl SignerBackend for DevSigner {
    async fn provision_key(
        &self,
        class_id: &ClassId,
        owner: &Address,
        index: u64,
    ) -> Result<PublicKey> {
        let key = self.signing_key(class_id, owner, index)?;
        let point = key.verifying_key().to_encoded_point(true);
        debug!("Provisioned key {} for {}", index, owner.short());
        Ok(PublicKey::new(point.as_bytes()))
    }

    async fn sign(&self, request: &SigningRequest) -> Result<Bytes> {
        let key = self.signing_key(&request.class_id, &request.owner, request.index)?;
        let digest = request.digest()?;

        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| DaemonError::SigningFailed(e.to_string()))?;

        // r || s || v, Ethereum style v
        let mut sig = Vec::with_capacity(65);
        sig.extend_from_slice(&signature.to_bytes());
        sig.push(recovery_id.to_byte() + 27);
        Ok(Bytes::new(sig))
    }

    fn backend_name(&self) -> &'static str {
        "dev"
    }
}
