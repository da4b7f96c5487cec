//! Key ledger
//!
//! Append-only, per (classification, owner) ordered sequence of public keys.
//! A resolution is accepted only for exactly the next unfilled slot, which
//! rejects duplicated, stale and premature resolutions alike.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use keygate_core::{Address, ClassId, Error, PublicKey, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLedger {
    keys: BTreeMap<ClassId, BTreeMap<Address, Vec<PublicKey>>>,
}

impl KeyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys for an owner, in append order
    pub fn wallets(&self, class_id: &ClassId, owner: &Address) -> &[PublicKey] {
        self.keys
            .get(class_id)
            .and_then(|owners| owners.get(owner))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Length of the owner's sequence, i.e. the next index to be filled
    pub fn next_index(&self, class_id: &ClassId, owner: &Address) -> u64 {
        self.wallets(class_id, owner).len() as u64
    }

    pub fn validate_public_key(public_key: &PublicKey) -> Result<()> {
        if public_key.is_empty() {
            return Err(Error::MalformedPublicKey("empty public key".to_string()));
        }
        Ok(())
    }

    /// Fail unless `provided` is exactly the next unfilled index
    pub fn check_next_index(&self, class_id: &ClassId, owner: &Address, provided: u64) -> Result<()> {
        let expected = self.next_index(class_id, owner);
        if provided != expected {
            return Err(Error::IndexMismatch { expected, provided });
        }
        Ok(())
    }

    /// Append a key at `provided_index`; returns the index used
    pub fn append(
        &mut self,
        class_id: ClassId,
        owner: Address,
        public_key: PublicKey,
        provided_index: u64,
    ) -> Result<u64> {
        Self::validate_public_key(&public_key)?;
        self.check_next_index(&class_id, &owner, provided_index)?;

        self.keys
            .entry(class_id)
            .or_default()
            .entry(owner)
            .or_default()
            .push(public_key);

        Ok(provided_index)
    }

    /// Fail with `IndexOutOfBounds` unless `index` addresses a resolved key
    pub fn bounds_check(&self, class_id: &ClassId, owner: &Address, index: u64) -> Result<()> {
        let length = self.next_index(class_id, owner);
        if index >= length {
            return Err(Error::IndexOutOfBounds { index, length });
        }
        Ok(())
    }

    pub fn public_key(&self, class_id: &ClassId, owner: &Address, index: u64) -> Result<&PublicKey> {
        self.bounds_check(class_id, owner, index)?;
        Ok(&self.wallets(class_id, owner)[index as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::derive_class_id;

    fn class() -> ClassId {
        derive_class_id(44, 60)
    }

    fn owner() -> Address {
        Address::new([1u8; 20])
    }

    fn key(byte: u8) -> PublicKey {
        PublicKey::new(vec![0x02, byte, byte])
    }

    #[test]
    fn test_append_in_order() {
        let mut ledger = KeyLedger::new();
        assert_eq!(ledger.next_index(&class(), &owner()), 0);

        for i in 0..5u64 {
            assert_eq!(ledger.append(class(), owner(), key(i as u8), i).unwrap(), i);
        }

        assert_eq!(ledger.next_index(&class(), &owner()), 5);
        let stored: Vec<u8> = ledger
            .wallets(&class(), &owner())
            .iter()
            .map(|k| k.as_bytes()[1])
            .collect();
        assert_eq!(stored, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let mut ledger = KeyLedger::new();
        ledger.append(class(), owner(), key(1), 0).unwrap();

        let err = ledger.append(class(), owner(), key(2), 0).unwrap_err();
        assert_eq!(
            err,
            Error::IndexMismatch {
                expected: 1,
                provided: 0
            }
        );
        assert_eq!(ledger.wallets(&class(), &owner()), &[key(1)]);
    }

    #[test]
    fn test_premature_index_rejected() {
        let mut ledger = KeyLedger::new();
        let err = ledger.append(class(), owner(), key(1), 1).unwrap_err();
        assert!(matches!(err, Error::IndexMismatch { expected: 0, provided: 1 }));
        assert_eq!(ledger.next_index(&class(), &owner()), 0);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut ledger = KeyLedger::new();
        let err = ledger
            .append(class(), owner(), PublicKey::new(Vec::new()), 0)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPublicKey(_)));
        assert_eq!(ledger.next_index(&class(), &owner()), 0);
    }

    #[test]
    fn test_sequences_are_independent() {
        let mut ledger = KeyLedger::new();
        let other_owner = Address::new([2u8; 20]);
        let other_class = derive_class_id(44, 0);

        ledger.append(class(), owner(), key(1), 0).unwrap();
        assert_eq!(ledger.next_index(&class(), &other_owner), 0);
        assert_eq!(ledger.next_index(&other_class, &owner()), 0);

        ledger.append(class(), other_owner, key(2), 0).unwrap();
        ledger.append(other_class, owner(), key(3), 0).unwrap();
        assert_eq!(ledger.next_index(&class(), &owner()), 1);
    }

    #[test]
    fn test_bounds_check() {
        let mut ledger = KeyLedger::new();
        assert_eq!(
            ledger.bounds_check(&class(), &owner(), 0),
            Err(Error::IndexOutOfBounds { index: 0, length: 0 })
        );

        ledger.append(class(), owner(), key(1), 0).unwrap();
        assert!(ledger.bounds_check(&class(), &owner(), 0).is_ok());
        assert!(ledger.bounds_check(&class(), &owner(), 1).is_err());
        assert_eq!(ledger.public_key(&class(), &owner(), 0).unwrap(), &key(1));
    }
}
