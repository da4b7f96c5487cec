//! Upgrade/delivery proxy
//!
//! Fronts a [`KeyGate`] with a fixed administrator who may swap the
//! implementation label but never reach protocol logic. Protocol state stays
//! with the proxy across upgrades.

use serde::{Deserialize, Serialize};
use tracing::info;

use keygate_core::{Address, Error, Event, Result};

use crate::access::{AccessControl, RoleAdmin, RoleRegistry};
use crate::gate::{Call, KeyGate};
use crate::outbox::{EventLog, Outbox};

/// Proxy identity that outlives upgrades and restarts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub admin: Address,
    pub implementation: String,
}

pub struct Proxy<R = AccessControl, O = EventLog> {
    admin: Address,
    implementation: String,
    gate: KeyGate<R, O>,
}

impl<R: RoleRegistry, O: Outbox> Proxy<R, O> {
    /// Put a previously deployed gate back behind its proxy
    pub fn restore(settings: ProxySettings, gate: KeyGate<R, O>) -> Self {
        Self {
            admin: settings.admin,
            implementation: settings.implementation,
            gate,
        }
    }

    pub fn settings(&self) -> ProxySettings {
        ProxySettings {
            admin: self.admin,
            implementation: self.implementation.clone(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// Read-only view of the gate behind the proxy
    pub fn gate(&self) -> &KeyGate<R, O> {
        &self.gate
    }

    /// Log access for subscriptions; protocol calls go through [`Proxy::call`]
    pub fn outbox_mut(&mut self) -> &mut O {
        self.gate.outbox_mut()
    }

    /// Point the proxy at a new implementation
    pub fn upgrade_to(&mut self, caller: Address, implementation: impl Into<String>) -> Result<()> {
        if caller != self.admin {
            return Err(Error::NotProxyAdmin(caller));
        }

        let implementation = implementation.into();
        info!(
            "Upgraded implementation {} -> {}",
            self.implementation, implementation
        );
        self.implementation = implementation.clone();
        self.gate
            .outbox_mut()
            .publish(Event::Upgraded { implementation });
        Ok(())
    }

    /// Forward a call to the protocol
    pub fn call<T>(
        &mut self,
        call: &Call,
        f: impl FnOnce(&mut KeyGate<R, O>, &Call) -> Result<T>,
    ) -> Result<T> {
        if call.caller == self.admin {
            return Err(Error::AdminCannotFallback);
        }
        f(&mut self.gate, call)
    }
}

impl<R: RoleAdmin, O: Outbox> Proxy<R, O> {
    /// Deploy behind a proxy and run the one-time initialization as `deployer`;
    /// the proxy administrator must be a different identity
    pub fn deploy(
        deployer: Address,
        proxy_admin: Address,
        implementation: impl Into<String>,
        mut gate: KeyGate<R, O>,
    ) -> Result<Self> {
        if proxy_admin == deployer {
            return Err(Error::ProxyAdminIsDeployer);
        }
        gate.initialize(deployer)?;

        let implementation = implementation.into();
        info!(
            "Deployed {} behind proxy administered by {}",
            implementation, proxy_admin
        );
        Ok(Self {
            admin: proxy_admin,
            implementation,
            gate,
        })
    }
}
