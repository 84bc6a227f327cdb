//! Chain-facing seam used by the bootstrap.
//!
//! [`ChainClient`] is everything the deployer needs from a node: read-only
//! queries, signed transaction submission and confirmation waits. The
//! production implementation is [`crate::EthClient`]; tests substitute an
//! in-memory chain (see `test_utils`).

use bridge_common::{Address, H256, U256, types::TxKind};
use bytes::Bytes;

use crate::clients::EthClientError;

/// A transaction to be signed and sent by the client's own signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn deploy(init_code: Bytes) -> Self {
        Self {
            to: TxKind::Create,
            value: U256::zero(),
            data: init_code,
        }
    }

    pub fn call(to: Address, data: Bytes) -> Self {
        Self {
            to: TxKind::Call(to),
            value: U256::zero(),
            data,
        }
    }

    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: TxKind::Call(to),
            value,
            data: Bytes::new(),
        }
    }
}

/// Handle to a submitted, not yet confirmed, transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: H256,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub block_number: u64,
    pub contract_address: Option<Address>,
    pub status: bool,
    /// Blocks on top of (and including) the receipt's block when it was observed.
    pub confirmations: u64,
}

#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the account that signs every transaction sent through
    /// this client.
    fn sender(&self) -> Address;

    async fn chain_id(&self) -> Result<u64, EthClientError>;

    async fn block_number(&self) -> Result<u64, EthClientError>;

    async fn get_code(&self, address: Address) -> Result<Bytes, EthClientError>;

    async fn get_balance(&self, address: Address) -> Result<U256, EthClientError>;

    /// Read-only `eth_call` against the latest block.
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, EthClientError>;

    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<PendingTransaction, EthClientError>;

    /// Blocks until `tx` is included and `depth` blocks deep, counting its own
    /// block. A reverted transaction fails with
    /// [`EthClientError::TransactionReverted`].
    async fn await_confirmation(
        &self,
        tx: &PendingTransaction,
        depth: u64,
    ) -> Result<TxReceipt, EthClientError>;
}
