//! Deployment bootstrap
//!
//! Opens the proxied gate from storage, or deploys and configures a fresh one
//! from the daemon config when no initialized state exists yet.

use tracing::{info, warn};

use keygate_core::Role;
use keygate_ledger::{Call, EventLog, GateStorage, KeyGate, Proxy};

use crate::config::DaemonConfig;
use crate::error::{DaemonError, Result};

/// Implementation label recorded by the proxy
pub const IMPLEMENTATION: &str = concat!("keygate-ledger/", env!("CARGO_PKG_VERSION"));

/// Restore the persisted deployment, deploying a new one on first run
pub fn open_gate(config: &DaemonConfig, storage: &GateStorage) -> Result<Proxy> {
    let state = storage.load_state()?;
    if !state.initialized {
        return deploy(config);
    }

    let settings = storage.load_proxy()?.ok_or_else(|| {
        DaemonError::Config(format!(
            "initialized state in {:?} has no proxy record",
            storage.base_path()
        ))
    })?;
    if settings.admin != config.proxy_admin {
        warn!(
            "Config proxy admin {} differs from deployed proxy admin {}; keeping the deployed one",
            config.proxy_admin, settings.admin
        );
    }

    let roles = storage.load_roles()?;
    let log = EventLog::from_records(storage.load_log()?);
    info!(
        "Restored {} with {} log record(s) from {:?}",
        settings.implementation,
        log.len(),
        storage.base_path()
    );
    Ok(Proxy::restore(settings, KeyGate::from_parts(state, roles, log)))
}

/// Deploy behind the proxy and apply the configured classifications and fee
pub fn deploy(config: &DaemonConfig) -> Result<Proxy> {
    let mut proxy = Proxy::deploy(
        config.admin,
        config.proxy_admin,
        IMPLEMENTATION,
        KeyGate::standalone(),
    )?;
    let admin = Call::from(config.admin);

    proxy.call(&admin, |gate, call| {
        gate.grant_role(call, Role::signer(), config.signer)
    })?;
    proxy.call(&admin, |gate, call| gate.set_fee(call, config.fee))?;

    for classification in &config.classifications {
        let class_id = proxy.call(&admin, |gate, call| {
            gate.configure_classification(
                call,
                classification.purpose,
                classification.coin_type,
                true,
            )
        })?;
        for descriptor in &classification.networks {
            proxy.call(&admin, |gate, call| {
                gate.configure_network(call, class_id, descriptor, true)
            })?;
        }
    }

    info!(
        "Deployed {} with {} classification(s)",
        proxy.implementation(),
        config.classifications.len()
    );
    Ok(proxy)
}

/// Write the deployment back to storage
pub fn persist(proxy: &Proxy, storage: &GateStorage) -> Result<()> {
    let gate = proxy.gate();
    storage.save_proxy(&proxy.settings())?;
    storage.save_roles(gate.roles())?;
    storage.save_log(gate.outbox().records())?;
    // State last: an initialized state is what marks the deployment as saved
    storage.save_state(gate.state())?;
    Ok(())
}
