pub mod chain;
pub mod clients;
pub mod signer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use chain::{ChainClient, PendingTransaction, TransactionRequest, TxReceipt};
pub use clients::{EthClient, EthClientConfig, EthClientError};
pub use signer::LocalSigner;
