use bridge_rpc::{ChainClient, EthClient, LocalSigner};
use bridge_sdk::{HardhatArtifacts, SolidityConfigRegistrar};
use tracing::info;

use crate::utils::get_git_commit_hash;

pub mod coordinator;
pub mod errors;
pub mod funding;
pub mod manifest;
pub mod options;
pub mod preflight;
pub mod retry;
pub mod topology;

pub use coordinator::{
    BootstrapConfig, BootstrapCoordinator, BootstrapOutcome, BootstrapState, FundingOutcome,
};
pub use errors::DeployerError;
pub use manifest::{DeploymentManifest, ManifestWriter};
pub use options::DeployerOptions;
pub use retry::{Clock, RetryPolicy, TokioClock};

/// Bootstraps the bridge on the network selected by `opts`, against a live
/// node.
pub async fn deploy_bridge(opts: DeployerOptions) -> Result<BootstrapOutcome, DeployerError> {
    info!(network = %opts.network, "Starting bridge bootstrap");

    let signer = LocalSigner::new(opts.deployer_key()?);
    let operator = signer.checksum_address();
    let rpc_url = opts.rpc_url()?;
    let eth_client = EthClient::new(rpc_url, signer, opts.eth_client_config());

    let reported_chain_id = eth_client.chain_id().await?;
    info!(
        rpc_url = %eth_client.url(),
        chain_id = reported_chain_id,
        %operator,
        explorer_api_key = opts.explorer_api_key.is_some(),
        "Connected"
    );

    let commit_id = get_git_commit_hash(&opts.contracts_dir);
    let config = opts.bootstrap_config(reported_chain_id, commit_id)?;
    let artifacts = HardhatArtifacts::new(
        opts.contracts_dir.clone(),
        opts.artifacts_dir(),
        opts.skip_compile,
    );
    info!(artifacts_dir = %artifacts.artifacts_dir().display(), "Using contract artifacts");
    let registrar = SolidityConfigRegistrar::new(opts.config_contract());

    let mut coordinator = BootstrapCoordinator::new(
        &eth_client,
        &artifacts,
        &registrar,
        &TokioClock,
        ManifestWriter::new(opts.deployment_dir.clone()),
    );
    coordinator.run(&config).await
}
