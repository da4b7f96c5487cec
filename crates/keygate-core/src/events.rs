//! Observable log records
//!
//! These are the only integration surface towards the off-ledger signer
//! network. Each accepted protocol call appends exactly one record; role
//! grants and revocations are recorded only when membership changes.

use serde::{Deserialize, Serialize};

use crate::payload::PayloadKind;
use crate::types::{Address, Amount, Bytes, ChainId, ClassId, PublicKey, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    /// A caller asked for a new key; `index` is the slot the request is likely to fill
    KeyRequested {
        class_id: ClassId,
        owner: Address,
        index: u64,
    },

    KeyResolved {
        class_id: ClassId,
        index: u64,
        owner: Address,
        public_key: PublicKey,
        resolver: Address,
    },

    SignatureRequested {
        class_id: ClassId,
        owner: Address,
        index: u64,
        chain_id: ChainId,
        payload: Bytes,
        is_hash: bool,
        is_data: bool,
        is_transaction: bool,
        broadcast: bool,
    },

    SignatureResolved {
        class_id: ClassId,
        owner: Address,
        index: u64,
        chain_id: ChainId,
        payload: Bytes,
        signature: Bytes,
        broadcast: bool,
    },

    FeeChanged {
        old_fee: Amount,
        new_fee: Amount,
    },

    ClassificationConfigured {
        purpose: u64,
        coin_type: u64,
        class_id: ClassId,
        supported: bool,
    },

    NetworkConfigured {
        class_id: ClassId,
        chain_id: ChainId,
        descriptor: String,
        supported: bool,
    },

    BalanceWithdrawn {
        to: Address,
        amount: Amount,
    },

    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },

    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },

    /// The proxy now forwards to a new implementation
    Upgraded {
        implementation: String,
    },
}

impl Event {
    pub fn signature_requested(
        class_id: ClassId,
        owner: Address,
        index: u64,
        chain_id: ChainId,
        payload: Bytes,
        kind: PayloadKind,
    ) -> Self {
        Event::SignatureRequested {
            class_id,
            owner,
            index,
            chain_id,
            payload,
            is_hash: kind.is_hash,
            is_data: kind.is_data,
            is_transaction: kind.is_transaction,
            broadcast: kind.broadcast,
        }
    }

    /// Record name as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::KeyRequested { .. } => "KeyRequested",
            Event::KeyResolved { .. } => "KeyResolved",
            Event::SignatureRequested { .. } => "SignatureRequested",
            Event::SignatureResolved { .. } => "SignatureResolved",
            Event::FeeChanged { .. } => "FeeChanged",
            Event::ClassificationConfigured { .. } => "ClassificationConfigured",
            Event::NetworkConfigured { .. } => "NetworkConfigured",
            Event::BalanceWithdrawn { .. } => "BalanceWithdrawn",
            Event::RoleGranted { .. } => "RoleGranted",
            Event::RoleRevoked { .. } => "RoleRevoked",
            Event::Upgraded { .. } => "Upgraded",
        }
    }

    /// Whether the signer network has to act on this record
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Event::KeyRequested { .. } | Event::SignatureRequested { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::SignaturePayload;

    #[test]
    fn test_event_json_is_tagged() {
        let event = Event::KeyRequested {
            class_id: ClassId::new([1u8; 32]),
            owner: Address::new([2u8; 20]),
            index: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "KeyRequested");
        assert_eq!(json["index"], 3);
        assert_eq!(json["owner"], format!("0x{}", "02".repeat(20)));

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_signature_requested_carries_flags() {
        let payload = SignaturePayload::transaction(vec![0xaa], true);
        let event = Event::signature_requested(
            ClassId::new([0u8; 32]),
            Address::new([1u8; 20]),
            0,
            ChainId::GOERLI,
            payload.to_bytes(),
            payload.kind(),
        );
        match event {
            Event::SignatureRequested {
                is_hash,
                is_data,
                is_transaction,
                broadcast,
                ..
            } => {
                assert!(!is_hash && !is_data && is_transaction && broadcast);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(Event::FeeChanged { old_fee: 0, new_fee: 1 }.name() == "FeeChanged");
    }
}
