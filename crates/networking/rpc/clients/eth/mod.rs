use std::time::Duration;

use bridge_common::{
    Address, H256, U64, U256,
    types::{LegacyTransaction, TxKind},
};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::{
    chain::{ChainClient, PendingTransaction, TransactionRequest, TxReceipt},
    signer::LocalSigner,
};

pub mod errors;

use errors::EthClientError;

#[derive(Debug, Clone)]
pub struct EthClientConfig {
    /// Fixed gas price in wei. When unset, `eth_gasPrice` plus
    /// `gas_price_extra_percent` is used.
    pub gas_price: Option<u64>,
    pub gas_price_extra_percent: u64,
    /// Headroom added on top of `eth_estimateGas`.
    pub gas_limit_extra_percent: u64,
    pub confirmation_poll_interval: Duration,
    pub max_confirmation_polls: u64,
}

impl Default for EthClientConfig {
    fn default() -> Self {
        Self {
            gas_price: None,
            gas_price_extra_percent: 20,
            gas_limit_extra_percent: 20,
            confirmation_poll_interval: Duration::from_secs(1),
            max_confirmation_polls: 600,
        }
    }
}

/// JSON-RPC client that signs transactions locally.
#[derive(Debug, Clone)]
pub struct EthClient {
    client: Client,
    url: Url,
    signer: LocalSigner,
    config: EthClientConfig,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    data: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: H256,
    block_number: Option<U64>,
    contract_address: Option<Address>,
    status: Option<U64>,
}

fn with_extra(value: U256, extra_percent: u64) -> U256 {
    value.saturating_mul(U256::from(100 + extra_percent)) / U256::from(100)
}

fn u256_to_u64(value: U256, what: &str) -> Result<u64, EthClientError> {
    if value > U256::from(u64::MAX) {
        return Err(EthClientError::ParseResponse(format!(
            "{what} does not fit in u64: {value}"
        )));
    }
    Ok(value.as_u64())
}

impl EthClient {
    pub fn new(url: Url, signer: LocalSigner, config: EthClientConfig) -> Self {
        Self {
            client: Client::new(),
            url,
            signer,
            config,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, EthClientError> {
        trace!(method, "Sending RPC request");
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<RpcResponse>()
            .await?;

        if let Some(error) = response.error {
            let message = match error.data {
                Some(data) => format!("{} (data: {data})", error.message),
                None => error.message,
            };
            return Err(EthClientError::Rpc {
                code: error.code,
                message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, EthClientError> {
        let result = self.send_request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|err| EthClientError::ParseResponse(format!("{method}: {err}")))
    }

    pub async fn get_nonce(&self, address: Address) -> Result<u64, EthClientError> {
        let nonce: U256 = self
            .request(
                "eth_getTransactionCount",
                json!([format!("{address:#x}"), "pending"]),
            )
            .await?;
        u256_to_u64(nonce, "nonce")
    }

    pub async fn get_gas_price(&self) -> Result<U256, EthClientError> {
        if let Some(gas_price) = self.config.gas_price {
            return Ok(U256::from(gas_price));
        }
        let gas_price: U256 = self.request("eth_gasPrice", json!([])).await?;
        Ok(with_extra(gas_price, self.config.gas_price_extra_percent))
    }

    pub async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, EthClientError> {
        let mut tx = json!({
            "from": format!("{:#x}", self.signer.address()),
            "value": format!("{:#x}", request.value),
            "data": format!("0x{}", hex::encode(&request.data)),
        });
        if let TxKind::Call(to) = request.to {
            tx["to"] = json!(format!("{to:#x}"));
        }
        let gas: U256 = self.request("eth_estimateGas", json!([tx])).await?;
        u256_to_u64(
            with_extra(gas, self.config.gas_limit_extra_percent),
            "gas estimate",
        )
    }

    async fn get_receipt(&self, tx_hash: H256) -> Result<Option<RpcReceipt>, EthClientError> {
        self.request("eth_getTransactionReceipt", json!([format!("{tx_hash:#x}")]))
            .await
    }
}

#[async_trait::async_trait]
impl ChainClient for EthClient {
    fn sender(&self) -> Address {
        self.signer.address()
    }

    async fn chain_id(&self) -> Result<u64, EthClientError> {
        let chain_id: U256 = self.request("eth_chainId", json!([])).await?;
        u256_to_u64(chain_id, "chain id")
    }

    async fn block_number(&self) -> Result<u64, EthClientError> {
        let block_number: U256 = self.request("eth_blockNumber", json!([])).await?;
        u256_to_u64(block_number, "block number")
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, EthClientError> {
        let code: String = self
            .request("eth_getCode", json!([format!("{address:#x}"), "latest"]))
            .await?;
        bridge_common::utils::parse_hex(&code)
            .map_err(|err| EthClientError::ParseResponse(format!("eth_getCode: {err}")))
    }

    async fn get_balance(&self, address: Address) -> Result<U256, EthClientError> {
        self.request("eth_getBalance", json!([format!("{address:#x}"), "latest"]))
            .await
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, EthClientError> {
        let tx = json!({
            "to": format!("{to:#x}"),
            "data": format!("0x{}", hex::encode(&calldata)),
        });
        let result: String = self.request("eth_call", json!([tx, "latest"])).await?;
        bridge_common::utils::parse_hex(&result)
            .map_err(|err| EthClientError::ParseResponse(format!("eth_call: {err}")))
    }

    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<PendingTransaction, EthClientError> {
        let chain_id = self.chain_id().await?;
        let nonce = self.get_nonce(self.signer.address()).await?;
        let gas_price = self.get_gas_price().await?;
        let gas = self.estimate_gas(&request).await?;

        let mut tx = LegacyTransaction {
            nonce,
            gas_price,
            gas,
            to: request.to,
            value: request.value,
            data: request.data,
            ..Default::default()
        };
        self.signer.sign(&mut tx, chain_id);

        let raw = format!("0x{}", hex::encode(tx.encode_signed()));
        let hash: H256 = self
            .request("eth_sendRawTransaction", json!([raw]))
            .await?;
        debug!(tx_hash = %format!("{hash:#x}"), nonce, gas, "Transaction sent");

        Ok(PendingTransaction { hash, nonce })
    }

    async fn await_confirmation(
        &self,
        tx: &PendingTransaction,
        depth: u64,
    ) -> Result<TxReceipt, EthClientError> {
        let depth = depth.max(1);
        let mut polls = 0;

        loop {
            if polls >= self.config.max_confirmation_polls {
                return Err(EthClientError::ReceiptNotFound {
                    tx_hash: tx.hash,
                    polls,
                });
            }
            polls += 1;

            let receipt = match self.get_receipt(tx.hash).await? {
                Some(receipt) => receipt,
                None => {
                    tokio::time::sleep(self.config.confirmation_poll_interval).await;
                    continue;
                }
            };
            // Pending-block receipts carry no block number yet.
            let Some(block_number) = receipt.block_number.map(|n| n.as_u64()) else {
                tokio::time::sleep(self.config.confirmation_poll_interval).await;
                continue;
            };
            if receipt.status.is_some_and(|status| status.is_zero()) {
                return Err(EthClientError::TransactionReverted(receipt.transaction_hash));
            }

            let head = self.block_number().await?;
            let confirmations = head.saturating_sub(block_number) + 1;
            if confirmations >= depth {
                return Ok(TxReceipt {
                    tx_hash: receipt.transaction_hash,
                    block_number,
                    contract_address: receipt.contract_address,
                    status: true,
                    confirmations,
                });
            }

            trace!(
                tx_hash = %format!("{:#x}", tx.hash),
                confirmations,
                depth,
                "Waiting for confirmations"
            );
            tokio::time::sleep(self.config.confirmation_poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn gas_headroom_is_applied() {
        assert_eq!(with_extra(U256::from(100_000), 20), U256::from(120_000));
        assert_eq!(with_extra(U256::from(7), 0), U256::from(7));
    }

    #[test]
    fn receipt_deserializes_from_node_json() {
        let raw = json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "status": "0x1",
            "gasUsed": "0x5208"
        });
        let receipt: RpcReceipt = serde_json::from_value(raw).unwrap();
        assert_eq!(receipt.block_number.unwrap().as_u64(), 16);
        assert!(receipt.contract_address.is_some());
        assert!(!receipt.status.unwrap().is_zero());
    }
}
