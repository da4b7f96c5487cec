#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use keygate_core::{Address, PublicKey, Role};
use keygate_ledger::{Call, KeyGate};

#[derive(Debug, Arbitrary)]
enum Op {
    RequestKey { owner: u8, value: u8 },
    ResolveKey { owner: u8, index: u8, key: Vec<u8>, as_signer: bool },
    RequestSignature { owner: u8, index: u8, value: u8, data: Vec<u8> },
    SetFee { fee: u8 },
    ToggleClassification { supported: bool },
}

fn address(b: u8) -> Address {
    Address::new([b; 20])
}

fuzz_target!(|ops: Vec<Op>| {
    let admin = address(0xad);
    let signer = address(0x5e);

    let mut gate = KeyGate::standalone();
    gate.initialize(admin).unwrap();
    gate.grant_role(&Call::from(admin), Role::signer(), signer)
        .unwrap();
    let class_id = gate
        .configure_classification(&Call::from(admin), 44, 60, true)
        .unwrap();
    let chain_id = gate
        .configure_network(&Call::from(admin), class_id, "eip155:1", true)
        .unwrap();

    for op in ops {
        let keys_before = gate.state().keys.clone();
        let log_len = gate.outbox().len();

        let (accepted, may_grow) = match op {
            Op::RequestKey { owner, value } => (
                gate.request_public_key(&Call::with_value(address(owner), value as u128), class_id)
                    .is_ok(),
                false,
            ),
            Op::ResolveKey { owner, index, key, as_signer } => {
                let caller = if as_signer { signer } else { address(owner) };
                (
                    gate.resolve_public_key(
                        &Call::from(caller),
                        class_id,
                        address(owner),
                        index as u64,
                        PublicKey::new(key),
                    )
                    .is_ok(),
                    true,
                )
            }
            Op::RequestSignature { owner, index, value, data } => (
                gate.request_signature_for_data(
                    &Call::with_value(address(owner), value as u128),
                    class_id,
                    index as u64,
                    chain_id,
                    data,
                )
                .is_ok(),
                false,
            ),
            Op::SetFee { fee } => (gate.set_fee(&Call::from(admin), fee as u128).is_ok(), false),
            Op::ToggleClassification { supported } => (
                gate.configure_classification(&Call::from(admin), 44, 60, supported)
                    .is_ok(),
                false,
            ),
        };

        let expected_len = if accepted { log_len + 1 } else { log_len };
        assert_eq!(gate.outbox().len(), expected_len);
        if !(accepted && may_grow) {
            assert_eq!(gate.state().keys, keys_before);
        }
    }
});
