//! Role registry
//!
//! Guards only ever ask [`RoleRegistry::has_role`]; any store answering that
//! question can back a [`KeyGate`](crate::KeyGate). [`AccessControl`] is the
//! in-memory store used by deployments and tests.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use keygate_core::{Address, Error, Result, Role};

/// Capability check used by every role-gated guard
pub trait RoleRegistry {
    fn has_role(&self, role: &Role, account: &Address) -> bool;

    /// Fail with `Unauthorized` unless `account` holds `role`
    fn check_role(&self, role: &Role, account: &Address) -> Result<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                role: *role,
                account: *account,
            })
        }
    }
}

/// Membership management; each call reports whether membership changed
pub trait RoleAdmin: RoleRegistry {
    fn grant_role(&mut self, role: Role, account: Address, caller: Address) -> Result<bool>;

    fn revoke_role(&mut self, role: Role, account: Address, caller: Address) -> Result<bool>;

    /// Drop one's own membership; `caller` must equal `account`
    fn renounce_role(&mut self, role: Role, account: Address, caller: Address) -> Result<bool>;

    /// Unchecked grant, used once when a deployment is initialized
    fn setup_role(&mut self, role: Role, account: Address) -> bool;
}

/// In-memory role store where the administrative role administers every role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControl {
    members: BTreeMap<Role, BTreeSet<Address>>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant without an authorization check (initialization and test doubles)
    pub fn with_member(mut self, role: Role, account: Address) -> Self {
        self.insert(role, account);
        self
    }

    fn insert(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    fn remove(&mut self, role: &Role, account: &Address) -> bool {
        match self.members.get_mut(role) {
            Some(accounts) => {
                let removed = accounts.remove(account);
                if accounts.is_empty() {
                    self.members.remove(role);
                }
                removed
            }
            None => false,
        }
    }

    /// All accounts holding `role`
    pub fn members(&self, role: &Role) -> Vec<Address> {
        self.members
            .get(role)
            .map(|accounts| accounts.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl RoleRegistry for AccessControl {
    fn has_role(&self, role: &Role, account: &Address) -> bool {
        self.members
            .get(role)
            .is_some_and(|accounts| accounts.contains(account))
    }
}

impl RoleAdmin for AccessControl {
    fn grant_role(&mut self, role: Role, account: Address, caller: Address) -> Result<bool> {
        self.check_role(&Role::ADMIN, &caller)?;
        let changed = self.insert(role, account);
        if changed {
            info!("Granted role {} to {}", role, account);
        }
        Ok(changed)
    }

    fn revoke_role(&mut self, role: Role, account: Address, caller: Address) -> Result<bool> {
        self.check_role(&Role::ADMIN, &caller)?;
        let changed = self.remove(&role, &account);
        if changed {
            info!("Revoked role {} from {}", role, account);
        }
        Ok(changed)
    }

    fn renounce_role(&mut self, role: Role, account: Address, caller: Address) -> Result<bool> {
        if account != caller {
            return Err(Error::CannotRenounceForOthers { account, caller });
        }
        let changed = self.remove(&role, &account);
        if changed {
            info!("{} renounced role {}", account, role);
        }
        Ok(changed)
    }

    fn setup_role(&mut self, role: Role, account: Address) -> bool {
        self.insert(role, account)
    }
}
