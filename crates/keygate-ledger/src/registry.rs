//! Support registry
//!
//! Tracks which wallet classifications are supported and, per classification,
//! which networks. Flags are toggles: setting a flag to its current value is
//! rejected with `AlreadyInState`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use keygate_core::{ChainId, ClassId, Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRegistry {
    /// Classifications currently marked supported
    classifications: BTreeSet<ClassId>,

    /// Networks currently marked supported, per classification
    networks: BTreeMap<ClassId, BTreeSet<ChainId>>,
}

impl SupportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_classification_supported(&self, class_id: &ClassId) -> bool {
        self.classifications.contains(class_id)
    }

    pub fn is_network_supported(&self, class_id: &ClassId, chain_id: &ChainId) -> bool {
        self.networks
            .get(class_id)
            .is_some_and(|chains| chains.contains(chain_id))
    }

    /// Fail with `AlreadyInState` if the flag already has the desired value
    pub fn check_classification_toggle(&self, class_id: &ClassId, supported: bool) -> Result<()> {
        if self.is_classification_supported(class_id) == supported {
            return Err(Error::AlreadyInState {
                target: format!("wallet classification {}", class_id),
                supported,
            });
        }
        Ok(())
    }

    /// Fail with `AlreadyInState` if the flag already has the desired value
    pub fn check_network_toggle(
        &self,
        class_id: &ClassId,
        chain_id: &ChainId,
        supported: bool,
    ) -> Result<()> {
        if self.is_network_supported(class_id, chain_id) == supported {
            return Err(Error::AlreadyInState {
                target: format!("network {} for wallet classification {}", chain_id, class_id),
                supported,
            });
        }
        Ok(())
    }

    /// Flip the classification flag to `supported`
    pub fn set_classification_support(&mut self, class_id: ClassId, supported: bool) -> Result<()> {
        self.check_classification_toggle(&class_id, supported)?;
        if supported {
            self.classifications.insert(class_id);
        } else {
            self.classifications.remove(&class_id);
        }
        Ok(())
    }

    /// Flip the network flag for a classification to `supported`
    ///
    /// The classification itself does not have to be supported.
    pub fn set_network_support(
        &mut self,
        class_id: ClassId,
        chain_id: ChainId,
        supported: bool,
    ) -> Result<()> {
        self.check_network_toggle(&class_id, &chain_id, supported)?;
        if supported {
            self.networks.entry(class_id).or_default().insert(chain_id);
        } else if let Some(chains) = self.networks.get_mut(&class_id) {
            chains.remove(&chain_id);
            if chains.is_empty() {
                self.networks.remove(&class_id);
            }
        }
        Ok(())
    }

    pub fn require_classification_supported(&self, class_id: &ClassId) -> Result<()> {
        if !self.is_classification_supported(class_id) {
            return Err(Error::UnsupportedClassification(*class_id));
        }
        Ok(())
    }

    pub fn require_network_supported(&self, class_id: &ClassId, chain_id: &ChainId) -> Result<()> {
        if !self.is_network_supported(class_id, chain_id) {
            return Err(Error::UnsupportedNetwork {
                class_id: *class_id,
                chain_id: *chain_id,
            });
        }
        Ok(())
    }

    /// Networks supported for a classification
    pub fn networks(&self, class_id: &ClassId) -> Vec<ChainId> {
        self.networks
            .get(class_id)
            .map(|chains| chains.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::derive_class_id;

    fn evm() -> ClassId {
        derive_class_id(44, 60)
    }

    #[test]
    fn test_toggle_classification() {
        let mut registry = SupportRegistry::new();
        assert!(!registry.is_classification_supported(&evm()));

        registry.set_classification_support(evm(), true).unwrap();
        assert!(registry.is_classification_supported(&evm()));
        assert!(registry.require_classification_supported(&evm()).is_ok());

        registry.set_classification_support(evm(), false).unwrap();
        assert!(!registry.is_classification_supported(&evm()));
    }

    #[test]
    fn test_classification_same_state_rejected() {
        let mut registry = SupportRegistry::new();
        registry.set_classification_support(evm(), true).unwrap();

        let err = registry.set_classification_support(evm(), true).unwrap_err();
        assert!(matches!(err, Error::AlreadyInState { supported: true, .. }));
        assert!(registry.is_classification_supported(&evm()));

        // Removing support for something never supported
        let btc = derive_class_id(44, 0);
        let err = registry.set_classification_support(btc, false).unwrap_err();
        assert!(matches!(err, Error::AlreadyInState { supported: false, .. }));
        assert!(!registry.is_classification_supported(&btc));
    }

    #[test]
    fn test_network_scoped_per_classification() {
        let mut registry = SupportRegistry::new();
        registry
            .set_network_support(evm(), ChainId::GOERLI, true)
            .unwrap();

        assert!(registry.is_network_supported(&evm(), &ChainId::GOERLI));
        assert!(!registry.is_network_supported(&evm(), &ChainId::ETHEREUM));
        assert!(!registry.is_network_supported(&derive_class_id(44, 0), &ChainId::GOERLI));
        assert_eq!(registry.networks(&evm()), vec![ChainId::GOERLI]);
    }

    #[test]
    fn test_network_allowed_before_classification() {
        let mut registry = SupportRegistry::new();
        registry
            .set_network_support(evm(), ChainId::ETHEREUM, true)
            .unwrap();

        assert!(registry.is_network_supported(&evm(), &ChainId::ETHEREUM));
        assert_eq!(
            registry.require_classification_supported(&evm()),
            Err(Error::UnsupportedClassification(evm()))
        );
    }

    #[test]
    fn test_network_same_state_rejected() {
        let mut registry = SupportRegistry::new();
        let err = registry
            .set_network_support(evm(), ChainId::GOERLI, false)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyInState { .. }));

        registry
            .set_network_support(evm(), ChainId::GOERLI, true)
            .unwrap();
        assert!(registry
            .set_network_support(evm(), ChainId::GOERLI, true)
            .is_err());

        registry
            .set_network_support(evm(), ChainId::GOERLI, false)
            .unwrap();
        assert_eq!(
            registry.require_network_supported(&evm(), &ChainId::GOERLI),
            Err(Error::UnsupportedNetwork {
                class_id: evm(),
                chain_id: ChainId::GOERLI
            })
        );
    }
}
