use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use secp256k1::{Message, SECP256K1, SecretKey};

use crate::{
    rlp::{Encoder, RLPEncode},
    utils::keccak,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

impl RLPEncode for TxKind {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            TxKind::Call(address) => address.encode(buf),
            // Contract creations carry an empty `to`.
            TxKind::Create => buf.push(0x80),
        }
    }
}

/// Pre-EIP-2718 transaction, replay protected with EIP-155.
///
/// Legacy transactions are accepted by every network the bridge targets,
/// including those without EIP-1559 fee markets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

impl LegacyTransaction {
    /// Hash signed over by EIP-155: `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn signing_hash(&self, chain_id: u64) -> H256 {
        let payload = Encoder::new()
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&chain_id)
            .encode_field(&0u64)
            .encode_field(&0u64)
            .finish();
        keccak(payload)
    }

    pub fn sign(&mut self, secret_key: &SecretKey, chain_id: u64) {
        let hash = self.signing_hash(chain_id);
        let message = Message::from_digest(hash.to_fixed_bytes());
        let (recovery_id, signature) = SECP256K1
            .sign_ecdsa_recoverable(&message, secret_key)
            .serialize_compact();

        let recovery = i32::from(recovery_id) as u64;
        self.v = U256::from(recovery + chain_id.saturating_mul(2) + 35);
        self.r = U256::from_big_endian(&signature[..32]);
        self.s = U256::from_big_endian(&signature[32..]);
    }

    pub fn encode_signed(&self) -> Vec<u8> {
        Encoder::new()
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.v)
            .encode_field(&self.r)
            .encode_field(&self.s)
            .finish()
    }

    pub fn hash(&self) -> H256 {
        keccak(self.encode_signed())
    }
}
