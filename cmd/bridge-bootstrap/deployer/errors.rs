use bridge_common::{
    calldata::{CalldataDecodeError, CalldataEncodeError},
    genesis::GenesisError,
};
use bridge_rpc::EthClientError;
use bridge_sdk::{ArtifactError, ConfigRegistrationError};

use super::{manifest::ManifestError, topology::PlanError};

#[derive(Debug, thiserror::Error)]
pub enum DeployerError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Safety violation: {0}")]
    SafetyViolation(String),
    #[error("Transient network failure while deploying {contract}: {source}")]
    TransientNetwork {
        contract: String,
        source: EthClientError,
    },
    #[error("Deployment of {contract} failed after {attempts} attempts: {last_error}")]
    DeploymentExhausted {
        contract: String,
        attempts: u32,
        last_error: String,
    },
    #[error("Contract {contract} failed: {reason}")]
    Contract {
        contract: String,
        reason: String,
        source: Option<EthClientError>,
    },
    #[error("Invalid deployment plan: {0}")]
    Plan(#[from] PlanError),
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("Failed to register config constants: {0}")]
    ConfigRegistration(#[from] ConfigRegistrationError),
    #[error("Failed to write manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Deployer EthClient error: {0}")]
    Chain(#[from] EthClientError),
    #[error("Invalid consensus genesis: {0}")]
    Genesis(#[from] GenesisError),
    #[error("Failed to encode calldata: {0}")]
    Calldata(#[from] CalldataEncodeError),
    #[error("Failed to decode return data: {0}")]
    Decode(#[from] CalldataDecodeError),
}
