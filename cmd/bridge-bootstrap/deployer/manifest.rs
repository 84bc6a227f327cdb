//! Deployment manifest: every address a run produced, keyed by role name,
//! plus what is needed to reproduce the run.

use std::{fmt, fs, path::PathBuf};

use bridge_common::{Address, genesis::ConsensusGenesis, utils::to_checksum_address};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to (de)serialize manifest: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Address serialized in its EIP-55 checksummed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChecksumAddress(pub Address);

impl fmt::Debug for ChecksumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_checksum_address(&self.0))
    }
}

impl From<Address> for ChecksumAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl Serialize for ChecksumAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_checksum_address(&self.0))
    }
}

impl<'de> Deserialize<'de> for ChecksumAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = bridge_common::utils::parse_hex(&raw).map_err(serde::de::Error::custom)?;
        if bytes.len() != Address::len_bytes() {
            return Err(serde::de::Error::custom(format!(
                "expected a 20-byte address, got {} bytes",
                bytes.len()
            )));
        }
        Ok(Self(Address::from_slice(&bytes)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    #[serde(rename = "DeployCommitId")]
    pub deploy_commit_id: String,
    #[serde(rename = "BlockNumber")]
    pub block_number: u64,
    #[serde(rename = "EmergencyOperator")]
    pub emergency_operator: ChecksumAddress,
    #[serde(rename = "EmergencyUpgradeOperator")]
    pub emergency_upgrade_operator: ChecksumAddress,
    #[serde(rename = "Deployer")]
    pub deployer: ChecksumAddress,
    /// Proxies, additional hubs and tokens by role name.
    #[serde(flatten)]
    pub contracts: IndexMap<String, ChecksumAddress>,
    #[serde(rename = "initConsensusState")]
    pub init_consensus_state: ConsensusGenesis,
    #[serde(rename = "gnfdChainId")]
    pub remote_chain_id: u64,
    #[serde(rename = "enableCrossChainTransfer")]
    pub cross_chain_transfer_enabled: bool,
}

impl DeploymentManifest {
    pub fn contract(&self, role: &str) -> Option<Address> {
        self.contracts.get(role).map(|address| address.0)
    }
}

/// Writes manifests as `<dir>/<chainId>-deployment.json`.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    dir: PathBuf,
}

impl ManifestWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, chain_id: u64) -> PathBuf {
        self.dir.join(format!("{chain_id}-deployment.json"))
    }

    /// Replaces any manifest previously written for `chain_id`.
    pub fn write(
        &self,
        chain_id: u64,
        manifest: &DeploymentManifest,
    ) -> Result<PathBuf, ManifestError> {
        fs::create_dir_all(&self.dir).map_err(|source| ManifestError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(chain_id);
        if path.exists() {
            debug!(path = %path.display(), "Overwriting previous deployment manifest");
        }

        let mut contents = serde_json::to_string_pretty(manifest)?;
        contents.push('\n');
        fs::write(&path, contents).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), chain_id, "Deployment manifest written");
        Ok(path)
    }

    pub fn read(&self, chain_id: u64) -> Result<DeploymentManifest, ManifestError> {
        let path = self.path_for(chain_id);
        let contents = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use bridge_common::networks::Network;

    use super::*;

    fn manifest(block_number: u64) -> DeploymentManifest {
        DeploymentManifest {
            deploy_commit_id: "3f1c2a9".to_owned(),
            block_number,
            emergency_operator: Address::repeat_byte(0x01).into(),
            emergency_upgrade_operator: Address::repeat_byte(0x02).into(),
            deployer: Address::repeat_byte(0x03).into(),
            contracts: IndexMap::from([
                ("ProxyAdmin".to_owned(), Address::repeat_byte(0x10).into()),
                ("GovHub".to_owned(), Address::repeat_byte(0x11).into()),
                ("GreenfieldExecutor".to_owned(), Address::repeat_byte(0x12).into()),
            ]),
            init_consensus_state: ConsensusGenesis::from_json(Network::Local.genesis_contents())
                .unwrap(),
            remote_chain_id: 5151,
            cross_chain_transfer_enabled: true,
        }
    }

    #[test]
    fn keys_keep_their_order() {
        let json = serde_json::to_string_pretty(&manifest(42)).unwrap();
        let positions: Vec<usize> = [
            "\"DeployCommitId\"",
            "\"BlockNumber\"",
            "\"EmergencyOperator\"",
            "\"EmergencyUpgradeOperator\"",
            "\"Deployer\"",
            "\"ProxyAdmin\"",
            "\"GovHub\"",
            "\"GreenfieldExecutor\"",
            "\"initConsensusState\"",
            "\"gnfdChainId\"",
            "\"enableCrossChainTransfer\"",
        ]
        .iter()
        .map(|key| json.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(json.contains(&format!(
            "\"GovHub\": \"{}\"",
            to_checksum_address(&Address::repeat_byte(0x11))
        )));
    }

    #[test]
    fn write_creates_directory_and_replaces_previous_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(dir.path().join("deployment"));

        let path = writer.write(97, &manifest(10)).unwrap();
        assert_eq!(path, dir.path().join("deployment").join("97-deployment.json"));

        writer.write(97, &manifest(20)).unwrap();
        let read = writer.read(97).unwrap();
        assert_eq!(read, manifest(20));
        assert_eq!(read.contract("GovHub"), Some(Address::repeat_byte(0x11)));
    }

    #[test]
    fn reading_a_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(dir.path());
        assert!(matches!(writer.read(1), Err(ManifestError::Io { .. })));
    }
}
