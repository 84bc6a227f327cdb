use bridge_common::{
    Address,
    genesis::ConsensusGenesis,
    types::{DeploymentTarget, EmergencyAuthority, ResolvedAuthority},
    utils::to_checksum_address,
};
use bridge_rpc::ChainClient;
use tracing::{info, warn};

use super::errors::DeployerError;

/// Code shorter than this is not a contract worth trusting with emergency
/// powers (an EOA has none at all).
pub const MIN_CONTRACT_CODE_LEN: usize = 4;

/// Read-only checks run before anything is sent to the chain.
pub struct PreflightValidator<'a> {
    chain: &'a dyn ChainClient,
}

impl<'a> PreflightValidator<'a> {
    pub fn new(chain: &'a dyn ChainClient) -> Self {
        Self { chain }
    }

    pub async fn validate(
        &self,
        target: &DeploymentTarget,
        authority: &EmergencyAuthority,
        genesis: &ConsensusGenesis,
    ) -> Result<ResolvedAuthority, DeployerError> {
        let reported_chain_id = self.chain.chain_id().await?;
        if reported_chain_id != target.chain_id {
            return Err(DeployerError::Configuration(format!(
                "RPC endpoint reports chain id {reported_chain_id}, network {} expects {}",
                target.name, target.chain_id
            )));
        }

        let state_bytes = genesis.state_bytes()?;

        let operator = self.chain.sender();
        let balance = self.chain.get_balance(operator).await?;
        info!(
            network = %target.name,
            chain_id = target.chain_id,
            production = target.production,
            operator = %to_checksum_address(&operator),
            %balance,
            consensus_state_len = state_bytes.len(),
            "Preflight"
        );
        if balance.is_zero() {
            warn!(operator = %to_checksum_address(&operator), "Operator account has no balance");
        }

        let resolved = if target.production {
            let (Some(operator), Some(upgrade_operator)) =
                (authority.operator, authority.upgrade_operator)
            else {
                return Err(DeployerError::Configuration(format!(
                    "emergency operator and emergency upgrade operator must both be set on {}",
                    target.name
                )));
            };
            self.require_contract("emergency operator", operator).await?;
            self.require_contract("emergency upgrade operator", upgrade_operator)
                .await?;
            ResolvedAuthority {
                operator,
                upgrade_operator,
            }
        } else {
            authority.or_default_to(operator)
        };

        info!(
            emergency_operator = %to_checksum_address(&resolved.operator),
            emergency_upgrade_operator = %to_checksum_address(&resolved.upgrade_operator),
            "Emergency authority resolved"
        );
        Ok(resolved)
    }

    async fn require_contract(&self, role: &str, address: Address) -> Result<(), DeployerError> {
        let code = self.chain.get_code(address).await?;
        if code.len() < MIN_CONTRACT_CODE_LEN {
            return Err(DeployerError::SafetyViolation(format!(
                "{role} {} has no contract code; production requires a multisig or timelock",
                to_checksum_address(&address)
            )));
        }
        Ok(())
    }
}
