use std::fmt;

use bridge_common::{
    Address,
    types::LegacyTransaction,
    utils::{get_address_from_secret_key, to_checksum_address},
};
use secp256k1::SecretKey;

/// Signs with a private key held in memory.
#[derive(Clone)]
pub struct LocalSigner {
    private_key: SecretKey,
    address: Address,
}

impl LocalSigner {
    pub fn new(private_key: SecretKey) -> Self {
        let address = get_address_from_secret_key(&private_key);
        Self {
            private_key,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn checksum_address(&self) -> String {
        to_checksum_address(&self.address)
    }

    pub fn sign(&self, tx: &mut LegacyTransaction, chain_id: u64) {
        tx.sign(&self.private_key, chain_id);
    }
}

// Never print the key.
impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.checksum_address())
            .finish_non_exhaustive()
    }
}
