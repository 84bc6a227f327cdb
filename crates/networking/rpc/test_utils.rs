//! Test utilities for the bridge-rpc crate.
//!
//! [`MockChain`] is an in-memory [`ChainClient`]: every accepted transaction
//! is mined immediately into its own block, and `await_confirmation` advances
//! the head one block per poll until the requested depth is reached. Failures
//! can be queued for both submission and confirmation so retry paths can be
//! exercised without a node.

#![allow(clippy::unwrap_used)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
};

use bridge_common::{Address, H256, U256, rlp::Encoder, types::TxKind, utils::keccak};
use bytes::Bytes;

use crate::{
    chain::{ChainClient, PendingTransaction, TransactionRequest, TxReceipt},
    clients::EthClientError,
};

/// A transaction the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: H256,
    pub nonce: u64,
    pub request: TransactionRequest,
    pub block_number: u64,
    pub contract_address: Option<Address>,
}

#[derive(Default)]
struct MockState {
    head: u64,
    nonce: u64,
    code: HashMap<Address, Bytes>,
    balances: HashMap<Address, U256>,
    call_results: HashMap<(Address, Bytes), Bytes>,
    reverting: HashSet<Address>,
    sent: Vec<SentTransaction>,
    send_attempts: usize,
    send_failures: VecDeque<EthClientError>,
    confirmation_failures: VecDeque<EthClientError>,
    confirmation_polls: u64,
    code_queries: Vec<Address>,
}

pub struct MockChain {
    sender: Address,
    chain_id: u64,
    state: Mutex<MockState>,
}

/// Address a `CREATE` from `sender` at `nonce` lands on.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    let encoded = Encoder::new().encode_field(&sender).encode_field(&nonce).finish();
    Address::from_slice(&keccak(encoded).as_bytes()[12..])
}

impl MockChain {
    pub fn new(chain_id: u64, sender: Address) -> Self {
        Self {
            sender,
            chain_id,
            state: Mutex::new(MockState {
                head: 1,
                ..Default::default()
            }),
        }
    }

    pub fn set_code(&self, address: Address, code: Bytes) {
        self.state.lock().unwrap().code.insert(address, code);
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.lock().unwrap().balances.insert(address, balance);
    }

    /// Fixes the return data of an `eth_call` with exactly this calldata.
    pub fn set_call_result(&self, to: Address, calldata: Bytes, result: Bytes) {
        self.state
            .lock()
            .unwrap()
            .call_results
            .insert((to, calldata), result);
    }

    /// Transactions sent to `address` are mined with a failed status.
    pub fn revert_calls_to(&self, address: Address) {
        self.state.lock().unwrap().reverting.insert(address);
    }

    /// The next `send_transaction` calls fail with these errors, in order.
    pub fn fail_next_sends(&self, errors: impl IntoIterator<Item = EthClientError>) {
        self.state.lock().unwrap().send_failures.extend(errors);
    }

    /// The next `await_confirmation` calls fail with these errors, in order.
    pub fn fail_next_confirmations(&self, errors: impl IntoIterator<Item = EthClientError>) {
        self.state
            .lock()
            .unwrap()
            .confirmation_failures
            .extend(errors);
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn deployments(&self) -> Vec<SentTransaction> {
        self.sent_transactions()
            .into_iter()
            .filter(|tx| tx.request.to == TxKind::Create)
            .collect()
    }

    /// Plain value transfers (no calldata), as `(recipient, value)`.
    pub fn value_transfers(&self) -> Vec<(Address, U256)> {
        self.sent_transactions()
            .into_iter()
            .filter_map(|tx| match tx.request.to {
                TxKind::Call(to) if tx.request.data.is_empty() && !tx.request.value.is_zero() => {
                    Some((to, tx.request.value))
                }
                _ => None,
            })
            .collect()
    }

    /// Contract calls (non-empty calldata) sent as transactions.
    pub fn contract_calls(&self) -> Vec<(Address, Bytes)> {
        self.sent_transactions()
            .into_iter()
            .filter_map(|tx| match tx.request.to {
                TxKind::Call(to) if !tx.request.data.is_empty() => Some((to, tx.request.data)),
                _ => None,
            })
            .collect()
    }

    /// Every `send_transaction` call, including the ones that failed.
    pub fn send_attempts(&self) -> usize {
        self.state.lock().unwrap().send_attempts
    }

    pub fn confirmation_polls(&self) -> u64 {
        self.state.lock().unwrap().confirmation_polls
    }

    pub fn code_queries(&self) -> Vec<Address> {
        self.state.lock().unwrap().code_queries.clone()
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    pub fn head(&self) -> u64 {
        self.state.lock().unwrap().head
    }

    /// Deterministic address returned for view calls nobody configured.
    fn view_address(to: Address, calldata: &[u8]) -> Address {
        let mut preimage = to.as_bytes().to_vec();
        preimage.extend_from_slice(calldata);
        Address::from_slice(&keccak(&preimage).as_bytes()[12..])
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn chain_id(&self) -> Result<u64, EthClientError> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> Result<u64, EthClientError> {
        Ok(self.head())
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, EthClientError> {
        let mut state = self.state.lock().unwrap();
        state.code_queries.push(address);
        Ok(state.code.get(&address).cloned().unwrap_or_default())
    }

    async fn get_balance(&self, address: Address) -> Result<U256, EthClientError> {
        Ok(self.balance_of(address))
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, EthClientError> {
        let state = self.state.lock().unwrap();
        if let Some(result) = state.call_results.get(&(to, calldata.clone())) {
            return Ok(result.clone());
        }
        if !state.code.contains_key(&to) {
            return Err(EthClientError::Rpc {
                code: 3,
                message: "execution reverted".to_owned(),
            });
        }
        let mut word = vec![0u8; 12];
        word.extend_from_slice(Self::view_address(to, &calldata).as_bytes());
        Ok(Bytes::from(word))
    }

    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<PendingTransaction, EthClientError> {
        let mut state = self.state.lock().unwrap();
        state.send_attempts += 1;
        if let Some(error) = state.send_failures.pop_front() {
            return Err(error);
        }

        let nonce = state.nonce;
        state.nonce += 1;
        state.head += 1;
        let block_number = state.head;

        let mut preimage = self.sender.as_bytes().to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let hash = keccak(&preimage);

        let contract_address = match request.to {
            TxKind::Create => {
                let address = create_address(self.sender, nonce);
                state.code.insert(address, request.data.clone());
                Some(address)
            }
            TxKind::Call(to) => {
                if !request.value.is_zero() {
                    let sender_balance = state.balances.entry(self.sender).or_default();
                    *sender_balance = sender_balance.saturating_sub(request.value);
                    let balance = state.balances.entry(to).or_default();
                    *balance = balance.saturating_add(request.value);
                }
                None
            }
        };

        state.sent.push(SentTransaction {
            hash,
            nonce,
            request,
            block_number,
            contract_address,
        });

        Ok(PendingTransaction { hash, nonce })
    }

    async fn await_confirmation(
        &self,
        tx: &PendingTransaction,
        depth: u64,
    ) -> Result<TxReceipt, EthClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.confirmation_failures.pop_front() {
            return Err(error);
        }

        let Some(sent) = state.sent.iter().find(|sent| sent.hash == tx.hash).cloned() else {
            return Err(EthClientError::ReceiptNotFound {
                tx_hash: tx.hash,
                polls: 1,
            });
        };

        if let TxKind::Call(to) = sent.request.to {
            if state.reverting.contains(&to) {
                state.confirmation_polls += 1;
                return Err(EthClientError::TransactionReverted(tx.hash));
            }
        }

        let depth = depth.max(1);
        loop {
            state.confirmation_polls += 1;
            let confirmations = state.head.saturating_sub(sent.block_number) + 1;
            if confirmations >= depth {
                return Ok(TxReceipt {
                    tx_hash: sent.hash,
                    block_number: sent.block_number,
                    contract_address: sent.contract_address,
                    status: true,
                    confirmations,
                });
            }
            state.head += 1;
        }
    }
}
