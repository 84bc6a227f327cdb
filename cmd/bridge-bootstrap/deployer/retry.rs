use std::time::Duration;

use bridge_common::{Address, H256, calldata::Value};
use bridge_rpc::{ChainClient, EthClientError, TransactionRequest};
use bridge_sdk::ArtifactRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::errors::DeployerError;

/// Blocks on top of (and including) a deployment's block before its
/// address is used.
pub const DEPLOY_CONFIRMATIONS: u64 = 3;
pub const MAX_DEPLOY_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Fatal,
}

impl ErrorKind {
    fn retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Default classifier: only dropped connections and other transport
/// failures are worth another attempt.
pub fn classify_error(error: &DeployerError) -> ErrorKind {
    match error {
        DeployerError::TransientNetwork { .. } => ErrorKind::Transient,
        DeployerError::Chain(err) if err.is_transient() => ErrorKind::Transient,
        _ => ErrorKind::Fatal,
    }
}

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub classifier: fn(&DeployerError) -> ErrorKind,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_DEPLOY_ATTEMPTS,
            delay: RETRY_DELAY,
            classifier: classify_error,
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails with a non-transient error
    /// or the attempt budget is spent. Returns the value and the number of
    /// attempts used.
    pub async fn run<T, O, Fut>(
        &self,
        clock: &dyn Clock,
        contract: &str,
        mut operation: O,
    ) -> Result<(T, u32), DeployerError>
    where
        O: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, DeployerError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match operation(attempts).await {
                Ok(value) => return Ok((value, attempts)),
                Err(error) => {
                    if !(self.classifier)(&error).retryable() {
                        return Err(error);
                    }
                    if attempts >= max_attempts {
                        return Err(DeployerError::DeploymentExhausted {
                            contract: contract.to_owned(),
                            attempts,
                            last_error: error.to_string(),
                        });
                    }
                    warn!(
                        contract,
                        attempt = attempts,
                        max_attempts,
                        %error,
                        "Transient failure, retrying"
                    );
                    clock.sleep(self.delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedContract {
    pub identifier: String,
    pub address: Address,
    pub tx_hash: H256,
    pub block_number: u64,
    pub confirmations: u64,
    pub attempts: u32,
}

/// Deploys one contract at a time, retrying transport failures.
pub struct RetryingDeployer<'a> {
    chain: &'a dyn ChainClient,
    artifacts: &'a dyn ArtifactRegistry,
    clock: &'a dyn Clock,
    policy: RetryPolicy,
    confirmations: u64,
}

impl<'a> RetryingDeployer<'a> {
    pub fn new(
        chain: &'a dyn ChainClient,
        artifacts: &'a dyn ArtifactRegistry,
        clock: &'a dyn Clock,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            chain,
            artifacts,
            clock,
            policy,
            confirmations: DEPLOY_CONFIRMATIONS,
        }
    }

    pub async fn deploy(
        &self,
        identifier: &str,
        constructor_args: &[Value],
    ) -> Result<DeployedContract, DeployerError> {
        let factory = self.artifacts.factory(identifier)?;
        let init_code = factory.deploy_data(constructor_args);

        let ((receipt_address, tx_hash, block_number, confirmations), attempts) = self
            .policy
            .run(self.clock, identifier, |attempt| {
                let init_code = init_code.clone();
                async move {
                    debug!(identifier, attempt, "Submitting deployment");
                    let pending = self
                        .chain
                        .send_transaction(TransactionRequest::deploy(init_code))
                        .await
                        .map_err(|err| chain_error(identifier, err))?;
                    let receipt = self
                        .chain
                        .await_confirmation(&pending, self.confirmations)
                        .await
                        .map_err(|err| chain_error(identifier, err))?;
                    let address =
                        receipt
                            .contract_address
                            .ok_or_else(|| DeployerError::Contract {
                                contract: identifier.to_owned(),
                                reason: format!(
                                    "receipt of {:#x} has no contract address",
                                    receipt.tx_hash
                                ),
                                source: None,
                            })?;
                    Ok::<_, DeployerError>((
                        address,
                        receipt.tx_hash,
                        receipt.block_number,
                        receipt.confirmations,
                    ))
                }
            })
            .await?;

        info!(
            identifier,
            address = %format!("{receipt_address:#x}"),
            tx_hash = %format!("{tx_hash:#x}"),
            attempts,
            "Contract deployed"
        );

        Ok(DeployedContract {
            identifier: identifier.to_owned(),
            address: receipt_address,
            tx_hash,
            block_number,
            confirmations,
            attempts,
        })
    }
}

/// Sorts a chain failure while deploying or calling `contract` into the
/// error taxonomy. Anything not worth retrying is charged to the contract.
pub fn chain_error(contract: &str, error: EthClientError) -> DeployerError {
    if error.is_transient() {
        return DeployerError::TransientNetwork {
            contract: contract.to_owned(),
            source: error,
        };
    }
    let reason = match &error {
        EthClientError::TransactionReverted(tx_hash) => format!("transaction {tx_hash:#x} reverted"),
        other => other.to_string(),
    };
    DeployerError::Contract {
        contract: contract.to_owned(),
        reason,
        source: Some(error),
    }
}
