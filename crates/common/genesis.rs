use std::path::Path;

use bytes::Bytes;
use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use crate::utils::parse_hex;

pub const MECHAIN_BSC_GENESIS_CONTENTS: &str =
    include_str!("../../fixtures/genesis/mechain-bsc.json");
pub const MECHAIN_POLYGON_GENESIS_CONTENTS: &str =
    include_str!("../../fixtures/genesis/mechain-polygon.json");
pub const MECHAIN_ARBITRUM_GENESIS_CONTENTS: &str =
    include_str!("../../fixtures/genesis/mechain-arbitrum.json");

#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("Failed to read genesis file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse genesis: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("consensusStateBytes is not valid hex: {0}")]
    InvalidStateBytes(#[from] hex::FromHexError),
    #[error("consensusStateBytes is empty")]
    EmptyStateBytes,
}

/// Initial consensus state handed to the light client on activation.
///
/// `consensus_state_bytes` is the pre-encoded blob passed through to the
/// chain as is. The remaining fields mirror it for humans reading the
/// manifest and are never checked against the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusGenesis {
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub height: u64,
    pub next_validator_set_hash: String,
    pub validators: Vec<ValidatorDescriptor>,
    pub consensus_state_bytes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorDescriptor {
    pub pub_key: String,
    pub voting_power: u64,
    pub relayer_address: Address,
    pub relayer_bls_key: String,
}

impl ConsensusGenesis {
    pub fn from_file(path: &Path) -> Result<Self, GenesisError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GenesisError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, GenesisError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Decoded consensus state. Fails only if the blob is not hex or empty.
    pub fn state_bytes(&self) -> Result<Bytes, GenesisError> {
        let bytes = parse_hex(&self.consensus_state_bytes)?;
        if bytes.is_empty() {
            return Err(GenesisError::EmptyStateBytes);
        }
        Ok(bytes)
    }

    pub fn relayer_addresses(&self) -> Vec<Address> {
        self.validators
            .iter()
            .map(|validator| validator.relayer_address)
            .collect()
    }
}
