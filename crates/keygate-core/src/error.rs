//! Error types for Keygate
//!
//! Every variant is terminal for the call that raised it: the call is
//! rejected as a whole and no state is changed.

use thiserror::Error;

use crate::types::{Address, Amount, ChainId, ClassId, Role};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Role check failed
    #[error("account {account} is missing role {role}")]
    Unauthorized { role: Role, account: Address },

    #[error("wallet classification not supported: {0}")]
    UnsupportedClassification(ClassId),

    #[error("network {chain_id} not supported for wallet classification {class_id}")]
    UnsupportedNetwork { class_id: ClassId, chain_id: ChainId },

    /// Toggle requested to the value already stored
    #[error("{target} is already {}", support_word(.supported))]
    AlreadyInState { target: String, supported: bool },

    #[error("insufficient fee: required {required}, provided {provided}")]
    InsufficientFee { required: Amount, provided: Amount },

    #[error("index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: u64, length: u64 },

    #[error("incorrect public key index: expected {expected}, provided {provided}")]
    IndexMismatch { expected: u64, provided: u64 },

    #[error("incorrect public key: {0}")]
    MalformedPublicKey(String),

    #[error("malformed network descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("invalid owner address")]
    InvalidOwner,

    /// Collecting the attached value would overflow the accumulated balance
    #[error("balance overflow: balance {balance}, attached {attached}")]
    BalanceOverflow { balance: Amount, attached: Amount },

    #[error("value transfer failed: {0}")]
    TransferFailed(String),

    #[error("account {account} can only renounce roles for itself (caller {caller})")]
    CannotRenounceForOthers { account: Address, caller: Address },

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("proxy admin must differ from the deployer")]
    ProxyAdminIsDeployer,

    #[error("caller {0} is not the proxy admin")]
    NotProxyAdmin(Address),

    #[error("proxy admin cannot fall back to the implementation")]
    AdminCannotFallback,

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

fn support_word(supported: &bool) -> &'static str {
    if *supported {
        "supported"
    } else {
        "not supported"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_in_state_message() {
        let err = Error::AlreadyInState {
            target: "wallet classification 0x01".to_string(),
            supported: true,
        };
        assert_eq!(
            err.to_string(),
            "wallet classification 0x01 is already supported"
        );

        let err = Error::AlreadyInState {
            target: "network 5".to_string(),
            supported: false,
        };
        assert_eq!(err.to_string(), "network 5 is already not supported");
    }
}
