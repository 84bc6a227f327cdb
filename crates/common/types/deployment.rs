use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use crate::networks::Network;

/// Destination chain of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub chain_id: u64,
    pub name: String,
    pub production: bool,
}

impl DeploymentTarget {
    pub fn new(chain_id: u64, name: impl Into<String>, production: bool) -> Self {
        Self {
            chain_id,
            name: name.into(),
            production,
        }
    }

    /// Target for a preset network. Dev presets have no fixed chain id, so
    /// the caller supplies the one reported by the node.
    pub fn from_network(network: Network, reported_chain_id: u64) -> Self {
        Self::new(
            network.chain_id().unwrap_or(reported_chain_id),
            network.name(),
            network.is_production(),
        )
    }
}

/// Holders of the bridge's emergency powers.
///
/// `operator` may suspend, reopen and cancel transfers; `upgrade_operator`
/// may change parameters and upgrade contracts. `None` means not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmergencyAuthority {
    pub operator: Option<Address>,
    pub upgrade_operator: Option<Address>,
}

/// Emergency authority after preflight: both addresses are always set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAuthority {
    pub operator: Address,
    pub upgrade_operator: Address,
}

impl EmergencyAuthority {
    pub fn new(operator: Option<Address>, upgrade_operator: Option<Address>) -> Self {
        // A zero address is as good as unset.
        let non_zero = |address: Option<Address>| address.filter(|a| !a.is_zero());
        Self {
            operator: non_zero(operator),
            upgrade_operator: non_zero(upgrade_operator),
        }
    }

    pub fn or_default_to(&self, fallback: Address) -> ResolvedAuthority {
        ResolvedAuthority {
            operator: self.operator.unwrap_or(fallback),
            upgrade_operator: self.upgrade_operator.unwrap_or(fallback),
        }
    }
}
