//! Request/resolve coordinator
//!
//! Composes the registry, fee gate, key ledger and role registry into the
//! protocol operations. Every operation evaluates all of its guards before
//! touching state, so a rejected call leaves no trace: no mutation and no
//! log record.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use keygate_core::{
    derive_class_id, parse_network_descriptor, Address, Amount, Bytes, ChainId, ClassId, Error,
    Event, PublicKey, Result, Role, SignaturePayload,
};

use crate::access::{AccessControl, RoleAdmin, RoleRegistry};
use crate::fees::{FeeGate, ValueTransfer};
use crate::keys::KeyLedger;
use crate::outbox::{EventLog, Outbox};
use crate::registry::SupportRegistry;

/// Caller identity and attached value of a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub caller: Address,
    pub value: Amount,
}

impl Call {
    pub fn from(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    pub fn with_value(caller: Address, value: Amount) -> Self {
        Self { caller, value }
    }
}

/// Persistent protocol state, owned exclusively by the coordinator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    pub registry: SupportRegistry,
    pub fees: FeeGate,
    pub keys: KeyLedger,
    pub initialized: bool,
}

/// Resolution of a signature request as reported by the signer network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResolution {
    pub class_id: ClassId,
    pub owner: Address,
    pub index: u64,
    pub chain_id: ChainId,
    pub payload: Bytes,
    pub signature: Bytes,
    pub broadcast: bool,
}

/// The request/resolve state machine
pub struct KeyGate<R = AccessControl, O = EventLog> {
    state: GateState,
    roles: R,
    outbox: O,
}

impl KeyGate<AccessControl, EventLog> {
    /// Fresh, uninitialized gate with an empty role store and event log
    pub fn standalone() -> Self {
        Self::new(AccessControl::new(), EventLog::new())
    }
}

impl<R: RoleRegistry, O: Outbox> KeyGate<R, O> {
    pub fn new(roles: R, outbox: O) -> Self {
        Self::from_parts(GateState::default(), roles, outbox)
    }

    /// Restore a gate from persisted state
    pub fn from_parts(state: GateState, roles: R, outbox: O) -> Self {
        Self {
            state,
            roles,
            outbox,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn roles(&self) -> &R {
        &self.roles
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut O {
        &mut self.outbox
    }

    pub fn into_parts(self) -> (GateState, R, O) {
        (self.state, self.roles, self.outbox)
    }

    // ============================================
    // Reads
    // ============================================

    pub fn fee(&self) -> Amount {
        self.state.fees.fee()
    }

    pub fn balance(&self) -> Amount {
        self.state.fees.balance()
    }

    pub fn next_index(&self, class_id: &ClassId, owner: &Address) -> u64 {
        self.state.keys.next_index(class_id, owner)
    }

    pub fn wallets(&self, class_id: &ClassId, owner: &Address) -> &[PublicKey] {
        self.state.keys.wallets(class_id, owner)
    }

    pub fn public_key(&self, class_id: &ClassId, owner: &Address, index: u64) -> Result<&PublicKey> {
        self.state.keys.public_key(class_id, owner, index)
    }

    pub fn is_classification_supported(&self, class_id: &ClassId) -> bool {
        self.state.registry.is_classification_supported(class_id)
    }

    pub fn is_network_supported(&self, class_id: &ClassId, chain_id: &ChainId) -> bool {
        self.state.registry.is_network_supported(class_id, chain_id)
    }

    // ============================================
    // Administration
    // ============================================

    /// Mark a (purpose, coin type) classification as supported or not
    pub fn configure_classification(
        &mut self,
        call: &Call,
        purpose: u64,
        coin_type: u64,
        supported: bool,
    ) -> Result<ClassId> {
        self.roles.check_role(&Role::ADMIN, &call.caller)?;
        let class_id = derive_class_id(purpose, coin_type);
        self.state
            .registry
            .set_classification_support(class_id, supported)?;

        info!(
            "Classification {} ({}/{}) supported={}",
            class_id.short(),
            purpose,
            coin_type,
            supported
        );
        self.outbox.publish(Event::ClassificationConfigured {
            purpose,
            coin_type,
            class_id,
            supported,
        });
        Ok(class_id)
    }

    /// Mark a network, named by its descriptor, as supported for a classification
    pub fn configure_network(
        &mut self,
        call: &Call,
        class_id: ClassId,
        descriptor: &str,
        supported: bool,
    ) -> Result<ChainId> {
        self.roles.check_role(&Role::ADMIN, &call.caller)?;
        let chain_id = parse_network_descriptor(descriptor)?;
        self.state
            .registry
            .set_network_support(class_id, chain_id, supported)?;

        info!(
            "Network {} ({}) for classification {} supported={}",
            chain_id,
            descriptor,
            class_id.short(),
            supported
        );
        self.outbox.publish(Event::NetworkConfigured {
            class_id,
            chain_id,
            descriptor: descriptor.to_string(),
            supported,
        });
        Ok(chain_id)
    }

    /// Replace the fee; returns the previous fee
    pub fn set_fee(&mut self, call: &Call, new_fee: Amount) -> Result<Amount> {
        self.roles.check_role(&Role::ADMIN, &call.caller)?;
        let (old_fee, new_fee) = self.state.fees.set_fee(new_fee);

        info!("Fee changed from {} to {}", old_fee, new_fee);
        self.outbox.publish(Event::FeeChanged { old_fee, new_fee });
        Ok(old_fee)
    }

    /// Transfer the accumulated balance to `to`
    pub fn withdraw_fees(
        &mut self,
        call: &Call,
        to: Address,
        transfer: &mut impl ValueTransfer,
    ) -> Result<Amount> {
        self.roles.check_role(&Role::ADMIN, &call.caller)?;
        let amount = self.state.fees.withdraw(&to, transfer)?;

        info!("Withdrew {} to {}", amount, to);
        self.outbox.publish(Event::BalanceWithdrawn { to, amount });
        Ok(amount)
    }

    // ============================================
    // Key flow
    // ============================================

    /// Ask the signer network for a new key; returns the announced index
    ///
    /// The key ledger is not touched. The announced index is a hint only:
    /// several requests may announce the same slot before it is resolved.
    pub fn request_public_key(&mut self, call: &Call, class_id: ClassId) -> Result<u64> {
        self.state
            .registry
            .require_classification_supported(&class_id)?;
        self.state.fees.require_fee_paid(call.value)?;

        let owner = call.caller;
        let index = self.state.keys.next_index(&class_id, &owner);
        self.state.fees.collect(call.value)?;

        debug!(
            "Key requested for {} in classification {} (slot {})",
            owner,
            class_id.short(),
            index
        );
        self.outbox.publish(Event::KeyRequested {
            class_id,
            owner,
            index,
        });
        Ok(index)
    }

    /// Record a key produced by the signer network at exactly the next slot
    pub fn resolve_public_key(
        &mut self,
        call: &Call,
        class_id: ClassId,
        owner: Address,
        index: u64,
        public_key: PublicKey,
    ) -> Result<u64> {
        self.state
            .registry
            .require_classification_supported(&class_id)?;
        self.roles.check_role(&Role::signer(), &call.caller)?;
        if owner.is_zero() {
            return Err(Error::InvalidOwner);
        }

        let index = self
            .state
            .keys
            .append(class_id, owner, public_key.clone(), index)?;

        info!(
            "Key {} resolved for {} in classification {}",
            index,
            owner,
            class_id.short()
        );
        self.outbox.publish(Event::KeyResolved {
            class_id,
            index,
            owner,
            public_key,
            resolver: call.caller,
        });
        Ok(index)
    }

    // ============================================
    // Signature flow
    // ============================================

    /// Ask the signer network to sign with the caller's key at `index`
    pub fn request_signature(
        &mut self,
        call: &Call,
        class_id: ClassId,
        index: u64,
        chain_id: ChainId,
        payload: SignaturePayload,
    ) -> Result<()> {
        let owner = call.caller;
        self.state
            .registry
            .require_classification_supported(&class_id)?;
        self.state
            .registry
            .require_network_supported(&class_id, &chain_id)?;
        self.state.fees.require_fee_paid(call.value)?;
        self.state.keys.bounds_check(&class_id, &owner, index)?;

        self.state.fees.collect(call.value)?;

        debug!(
            "Signature requested by {} with key {} of classification {} on network {}",
            owner,
            index,
            class_id.short(),
            chain_id
        );
        self.outbox.publish(Event::signature_requested(
            class_id,
            owner,
            index,
            chain_id,
            payload.to_bytes(),
            payload.kind(),
        ));
        Ok(())
    }

    pub fn request_signature_for_hash(
        &mut self,
        call: &Call,
        class_id: ClassId,
        index: u64,
        chain_id: ChainId,
        hash: [u8; 32],
    ) -> Result<()> {
        self.request_signature(call, class_id, index, chain_id, SignaturePayload::hash(hash))
    }

    pub fn request_signature_for_data(
        &mut self,
        call: &Call,
        class_id: ClassId,
        index: u64,
        chain_id: ChainId,
        data: impl Into<Vec<u8>>,
    ) -> Result<()> {
        self.request_signature(call, class_id, index, chain_id, SignaturePayload::data(data))
    }

    pub fn request_signature_for_transaction(
        &mut self,
        call: &Call,
        class_id: ClassId,
        index: u64,
        chain_id: ChainId,
        transaction: impl Into<Vec<u8>>,
        broadcast: bool,
    ) -> Result<()> {
        self.request_signature(
            call,
            class_id,
            index,
            chain_id,
            SignaturePayload::transaction(transaction, broadcast),
        )
    }

    /// Relay a signature produced by the signer network
    ///
    /// The signature is not checked against the stored key.
    pub fn resolve_signature(&mut self, call: &Call, resolution: SignatureResolution) -> Result<()> {
        let SignatureResolution {
            class_id,
            owner,
            index,
            chain_id,
            payload,
            signature,
            broadcast,
        } = resolution;

        self.state
            .registry
            .require_classification_supported(&class_id)?;
        self.state
            .registry
            .require_network_supported(&class_id, &chain_id)?;
        self.roles.check_role(&Role::signer(), &call.caller)?;
        self.state.keys.bounds_check(&class_id, &owner, index)?;

        info!(
            "Signature resolved for {} with key {} of classification {} on network {}",
            owner,
            index,
            class_id.short(),
            chain_id
        );
        self.outbox.publish(Event::SignatureResolved {
            class_id,
            owner,
            index,
            chain_id,
            payload,
            signature,
            broadcast,
        });
        Ok(())
    }
}

impl<R: RoleAdmin, O: Outbox> KeyGate<R, O> {
    /// One-time setup: the deployer becomes the administrator
    pub fn initialize(&mut self, deployer: Address) -> Result<()> {
        if self.state.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.roles.setup_role(Role::ADMIN, deployer);
        self.state.initialized = true;

        info!("Initialized with administrator {}", deployer);
        self.outbox.publish(Event::RoleGranted {
            role: Role::ADMIN,
            account: deployer,
            sender: deployer,
        });
        Ok(())
    }

    pub fn grant_role(&mut self, call: &Call, role: Role, account: Address) -> Result<bool> {
        let changed = self.roles.grant_role(role, account, call.caller)?;
        if changed {
            self.outbox.publish(Event::RoleGranted {
                role,
                account,
                sender: call.caller,
            });
        }
        Ok(changed)
    }

    pub fn revoke_role(&mut self, call: &Call, role: Role, account: Address) -> Result<bool> {
        let changed = self.roles.revoke_role(role, account, call.caller)?;
        if changed {
            self.outbox.publish(Event::RoleRevoked {
                role,
                account,
                sender: call.caller,
            });
        }
        Ok(changed)
    }

    pub fn renounce_role(&mut self, call: &Call, role: Role) -> Result<bool> {
        let changed = self.roles.renounce_role(role, call.caller, call.caller)?;
        if changed {
            self.outbox.publish(Event::RoleRevoked {
                role,
                account: call.caller,
                sender: call.caller,
            });
        }
        Ok(changed)
    }
}
