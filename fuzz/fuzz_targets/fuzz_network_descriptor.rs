#![no_main]

use libfuzzer_sys::fuzz_target;
use keygate_core::{parse_network_descriptor, Error};

fuzz_target!(|data: &[u8]| {
    let Ok(descriptor) = std::str::from_utf8(data) else {
        return;
    };

    match parse_network_descriptor(descriptor) {
        Ok(chain_id) => {
            // Accepted descriptors carry their identifier verbatim as the reference
            let (namespace, reference) = descriptor.split_once(':').unwrap();
            assert!((3..=8).contains(&namespace.len()));
            assert_eq!(reference.parse::<u64>().unwrap(), chain_id.as_u64());
        }
        Err(Error::MalformedDescriptor(_)) => {}
        Err(other) => panic!("unexpected error kind: {:?}", other),
    }
});
