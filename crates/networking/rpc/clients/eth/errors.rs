use std::error::Error as StdError;

use bridge_common::{H256, calldata::CalldataEncodeError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum EthClientError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Failed to parse RPC response: {0}")]
    ParseResponse(String),
    #[error("Invalid RPC request: {0}")]
    Request(String),
    #[error("Transaction {0:#x} reverted")]
    TransactionReverted(H256),
    #[error("Receipt for transaction {tx_hash:#x} not found after {polls} polls")]
    ReceiptNotFound { tx_hash: H256, polls: u64 },
    #[error("Failed to encode calldata: {0}")]
    CalldataEncodeError(#[from] CalldataEncodeError),
}

impl EthClientError {
    /// Transport-level failures (dropped sockets, resets, timeouts, gateway
    /// errors) that say nothing about the transaction itself.
    pub fn is_transient(&self) -> bool {
        match self {
            EthClientError::Connection(_) | EthClientError::Timeout(_) => true,
            EthClientError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

fn io_error_is_transient(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind;

    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionRefused
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::TimedOut
            | ErrorKind::UnexpectedEof
            | ErrorKind::Interrupted
    )
}

fn has_transient_io_source(error: &(dyn StdError + 'static)) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io_error) = err.downcast_ref::<std::io::Error>() {
            if io_error_is_transient(io_error.kind()) {
                return true;
            }
        }
        source = err.source();
    }
    false
}

impl From<reqwest::Error> for EthClientError {
    fn from(error: reqwest::Error) -> Self {
        let message = error.to_string();
        if error.is_timeout() {
            return EthClientError::Timeout(message);
        }
        if let Some(status) = error.status() {
            return EthClientError::Http {
                status: status.as_u16(),
                message,
            };
        }
        if error.is_connect() || error.is_request() || has_transient_io_source(&error) {
            return EthClientError::Connection(message);
        }
        if error.is_decode() {
            return EthClientError::ParseResponse(message);
        }
        // Builder, redirect and body errors fail the same way on every attempt.
        EthClientError::Request(message)
    }
}
