//! Identifier derivation
//!
//! Wallet classifications are identified by `keccak256(word(purpose) || word(coin_type))`
//! where `word` is the 32-byte big-endian encoding of an unsigned integer.
//! Networks are named by CAIP-2 descriptors (`<namespace>:<reference>`) whose
//! reference is a decimal integer; that integer is the canonical [`ChainId`].

use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};
use crate::types::{ChainId, ClassId};

/// Namespace length bounds from CAIP-2
const NAMESPACE_MIN_LEN: usize = 3;
const NAMESPACE_MAX_LEN: usize = 8;

/// BIP-44 purpose
pub const PURPOSE_BIP44: u64 = 44;

/// SLIP-44 coin types
pub const COIN_TYPE_BTC: u64 = 0;
pub const COIN_TYPE_BTC_TESTNET: u64 = 1;
pub const COIN_TYPE_ETH: u64 = 60;

/// Keccak-256 of arbitrary bytes
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Derive the classification identifier for a (purpose, coin type) pair
pub fn derive_class_id(purpose: u64, coin_type: u64) -> ClassId {
    let mut hasher = Keccak256::new();
    hasher.update(encode_word(purpose));
    hasher.update(encode_word(coin_type));
    ClassId::new(hasher.finalize().into())
}

/// Left-pad to a 32-byte big-endian word
fn encode_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Parse a CAIP-2 network descriptor into its canonical numeric identifier
///
/// Fails closed: anything that is not `<namespace>:<decimal reference>` is rejected.
pub fn parse_network_descriptor(descriptor: &str) -> Result<ChainId> {
    let (namespace, reference) = descriptor
        .split_once(':')
        .ok_or_else(|| malformed(descriptor, "missing ':' separator"))?;

    if namespace.len() < NAMESPACE_MIN_LEN || namespace.len() > NAMESPACE_MAX_LEN {
        return Err(malformed(descriptor, "namespace must be 3 to 8 characters"));
    }
    if !namespace
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(malformed(descriptor, "namespace must match [-a-z0-9]"));
    }

    if reference.is_empty() || !reference.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(descriptor, "reference must be a decimal integer"));
    }

    let id = reference
        .parse::<u64>()
        .map_err(|_| malformed(descriptor, "reference out of range"))?;

    Ok(ChainId::new(id))
}

fn malformed(descriptor: &str, reason: &str) -> Error {
    Error::MalformedDescriptor(format!("{:?}: {}", descriptor, reason))
}
