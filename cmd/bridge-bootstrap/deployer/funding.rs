use bridge_common::{Address, U256, utils::to_checksum_address};
use bridge_rpc::{ChainClient, EthClientError, TransactionRequest};
use serde::Serialize;
use tracing::{info, warn};

pub const FUNDING_CONFIRMATIONS: u64 = 3;

/// Native-currency transfers made once the bridge is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingPlan {
    /// Seed for the TokenHub proxy, which custodies bridged funds.
    pub token_hub: U256,
    pub relayers: Vec<Address>,
    pub relayer_amount: U256,
}

impl FundingPlan {
    fn transfers(&self, token_hub: Address) -> Vec<(&'static str, Address, U256)> {
        let mut transfers = Vec::with_capacity(self.relayers.len() + 1);
        if !self.token_hub.is_zero() {
            transfers.push(("TokenHub", token_hub, self.token_hub));
        }
        if !self.relayer_amount.is_zero() {
            transfers.extend(
                self.relayers
                    .iter()
                    .map(|relayer| ("relayer", *relayer, self.relayer_amount)),
            );
        }
        transfers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingTransfer {
    pub recipient: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingFailure {
    pub recipient: Address,
    pub amount: U256,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FundingReport {
    pub transfers: Vec<FundingTransfer>,
    pub failures: Vec<FundingFailure>,
}

/// Runs after activation. A failed transfer is reported, never raised: the
/// bridge is already live and funding can be redone by hand.
pub struct PostDeployFunding<'a> {
    chain: &'a dyn ChainClient,
    confirmations: u64,
}

impl<'a> PostDeployFunding<'a> {
    pub fn new(chain: &'a dyn ChainClient) -> Self {
        Self {
            chain,
            confirmations: FUNDING_CONFIRMATIONS,
        }
    }

    pub async fn fund(&self, token_hub: Address, plan: &FundingPlan) -> FundingReport {
        let mut report = FundingReport::default();

        for (label, recipient, amount) in plan.transfers(token_hub) {
            match self.transfer(recipient, amount).await {
                Ok(()) => {
                    info!(
                        recipient = %to_checksum_address(&recipient),
                        %amount,
                        label,
                        "Funded"
                    );
                    report.transfers.push(FundingTransfer { recipient, amount });
                }
                Err(err) => {
                    warn!(
                        recipient = %to_checksum_address(&recipient),
                        %amount,
                        label,
                        %err,
                        "Funding transfer failed"
                    );
                    report.failures.push(FundingFailure {
                        recipient,
                        amount,
                        reason: err.to_string(),
                    });
                }
            }
        }

        match self.chain.get_balance(token_hub).await {
            Ok(balance) => info!(%balance, "TokenHub balance"),
            Err(err) => warn!(%err, "Failed to read TokenHub balance"),
        }

        report
    }

    async fn transfer(&self, recipient: Address, amount: U256) -> Result<(), EthClientError> {
        let pending = self
            .chain
            .send_transaction(TransactionRequest::transfer(recipient, amount))
            .await?;
        self.chain
            .await_confirmation(&pending, self.confirmations)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use bridge_common::utils::units_to_wei;
    use bridge_rpc::test_utils::MockChain;

    use super::*;

    const OPERATOR: Address = Address::repeat_byte(0x0a);
    const TOKEN_HUB: Address = Address::repeat_byte(0x70);

    #[tokio::test]
    async fn seeds_token_hub_and_relayers() {
        let chain = MockChain::new(31337, OPERATOR);
        chain.set_balance(OPERATOR, units_to_wei(1_000));
        let relayers = vec![Address::repeat_byte(0x71), Address::repeat_byte(0x72)];
        let plan = FundingPlan {
            token_hub: units_to_wei(1),
            relayers: relayers.clone(),
            relayer_amount: units_to_wei(100),
        };

        let report = PostDeployFunding::new(&chain).fund(TOKEN_HUB, &plan).await;

        assert!(report.failures.is_empty());
        assert_eq!(
            chain.value_transfers(),
            vec![
                (TOKEN_HUB, units_to_wei(1)),
                (relayers[0], units_to_wei(100)),
                (relayers[1], units_to_wei(100)),
            ]
        );
        assert_eq!(chain.balance_of(TOKEN_HUB), units_to_wei(1));
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let chain = MockChain::new(31337, OPERATOR);
        chain.fail_next_sends([EthClientError::Rpc {
            code: -32000,
            message: "insufficient funds for transfer".to_owned(),
        }]);
        let plan = FundingPlan {
            token_hub: units_to_wei(1),
            relayers: vec![Address::repeat_byte(0x71)],
            relayer_amount: units_to_wei(100),
        };

        let report = PostDeployFunding::new(&chain).fund(TOKEN_HUB, &plan).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].recipient, TOKEN_HUB);
        assert_eq!(report.transfers.len(), 1);
    }

    #[tokio::test]
    async fn zero_amounts_are_skipped() {
        let chain = MockChain::new(31337, OPERATOR);
        let plan = FundingPlan {
            token_hub: U256::zero(),
            relayers: vec![Address::repeat_byte(0x71)],
            relayer_amount: U256::zero(),
        };

        let report = PostDeployFunding::new(&chain).fund(TOKEN_HUB, &plan).await;

        assert_eq!(report, FundingReport::default());
        assert!(chain.sent_transactions().is_empty());
    }
}
