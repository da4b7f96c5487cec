//! Property-based tests for the keygate-ledger coordinator
//!
//! Random call sequences against a configured gate; the ledger invariants
//! must hold no matter which calls succeed.

use proptest::prelude::*;
use keygate_core::{Address, ChainId, ClassId, Error, PublicKey, Role};
use keygate_ledger::{Call, KeyGate};

const FEE: u128 = 50;

fn admin() -> Address {
    Address::new([0xad; 20])
}

fn signer() -> Address {
    Address::new([0x5e; 20])
}

fn setup() -> (KeyGate, ClassId, ChainId) {
    let mut gate = KeyGate::standalone();
    gate.initialize(admin()).unwrap();
    gate.grant_role(&Call::from(admin()), Role::signer(), signer())
        .unwrap();
    let class_id = gate
        .configure_classification(&Call::from(admin()), 44, 60, true)
        .unwrap();
    let chain_id = gate
        .configure_network(&Call::from(admin()), class_id, "eip155:1", true)
        .unwrap();
    gate.set_fee(&Call::from(admin()), FEE).unwrap();
    (gate, class_id, chain_id)
}

// ============================================
// Arbitrary Implementations
// ============================================

/// Owners drawn from a small pool so sequences collide
fn arb_owner() -> impl Strategy<Value = Address> {
    (1u8..4).prop_map(|b| Address::new([b; 20]))
}

#[derive(Debug, Clone)]
enum Op {
    RequestKey { owner: Address, value: u128 },
    ResolveKey { owner: Address, index: u64, by_signer: bool },
    RequestSignature { owner: Address, index: u64, value: u128 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_owner(), 0u128..2 * FEE).prop_map(|(owner, value)| Op::RequestKey { owner, value }),
        (arb_owner(), 0u64..4, any::<bool>())
            .prop_map(|(owner, index, by_signer)| Op::ResolveKey { owner, index, by_signer }),
        (arb_owner(), 0u64..4, 0u128..2 * FEE)
            .prop_map(|(owner, index, value)| Op::RequestSignature { owner, index, value }),
    ]
}

// ============================================
// Property Tests
// ============================================

proptest! {
    #[test]
    fn accepted_resolutions_fill_consecutive_slots(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (mut gate, class_id, chain_id) = setup();
        let mut resolved: std::collections::HashMap<Address, Vec<PublicKey>> = Default::default();

        for (n, op) in ops.into_iter().enumerate() {
            let keys_before = gate.state().keys.clone();
            let log_len = gate.outbox().len();

            let result = match op {
                Op::RequestKey { owner, value } => {
                    let result = gate
                        .request_public_key(&Call::with_value(owner, value), class_id)
                        .map(|_| ());
                    prop_assert_eq!(&gate.state().keys, &keys_before);
                    if value < FEE {
                        let underpaid = matches!(result, Err(Error::InsufficientFee { .. }));
                        prop_assert!(underpaid);
                    }
                    result
                }
                Op::ResolveKey { owner, index, by_signer } => {
                    let caller = if by_signer { signer() } else { owner };
                    let key = PublicKey::new(vec![0x02, n as u8]);
                    let expected = gate.next_index(&class_id, &owner);
                    let result = gate
                        .resolve_public_key(&Call::from(caller), class_id, owner, index, key.clone())
                        .map(|_| ());

                    if by_signer && index == expected {
                        prop_assert!(result.is_ok());
                        resolved.entry(owner).or_default().push(key);
                    } else {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(&gate.state().keys, &keys_before);
                    }
                    result
                }
                Op::RequestSignature { owner, index, value } => {
                    let length = gate.next_index(&class_id, &owner);
                    let result = gate.request_signature_for_data(
                        &Call::with_value(owner, value),
                        class_id,
                        index,
                        chain_id,
                        vec![n as u8],
                    );
                    prop_assert_eq!(&gate.state().keys, &keys_before);
                    if value >= FEE && index >= length {
                        prop_assert_eq!(
                            result.clone(),
                            Err(Error::IndexOutOfBounds { index, length })
                        );
                    }
                    result
                }
            };

            // Exactly one record per accepted call, none per rejected call
            let expected_len = if result.is_ok() { log_len + 1 } else { log_len };
            prop_assert_eq!(gate.outbox().len(), expected_len);
        }

        for (owner, keys) in &resolved {
            prop_assert_eq!(gate.next_index(&class_id, owner), keys.len() as u64);
            prop_assert_eq!(gate.wallets(&class_id, owner), keys.as_slice());
        }
    }
}
