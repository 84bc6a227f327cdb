//! The bootstrap state machine.
//!
//! One run goes preflight, umbrella deployer and proxy resolution, config
//! registration, implementations and tokens, activation, manifest and then
//! (outside production) funding. Any error moves the run to
//! [`BootstrapState::Failed`]; there is no resume, a rerun starts over.

use std::{fmt, path::PathBuf};

use bridge_common::{
    Address,
    calldata::{Value, compute_function_selector, decode_address, encode_calldata},
    genesis::ConsensusGenesis,
    types::{DeploymentTarget, EmergencyAuthority, ResolvedAuthority},
    utils::to_checksum_address,
};
use bridge_rpc::{ChainClient, TransactionRequest, TxReceipt};
use bridge_sdk::{ArtifactRegistry, ConfigRegistrar};
use bytes::Bytes;
use indexmap::IndexMap;
use tracing::{error, info};

use super::{
    errors::DeployerError,
    funding::{FundingPlan, FundingReport, PostDeployFunding},
    manifest::{DeploymentManifest, ManifestWriter},
    preflight::PreflightValidator,
    retry::{Clock, DeployedContract, RetryPolicy, RetryingDeployer, chain_error},
    topology::{
        ACTIVATION_SIGNATURE, BridgeConfig, DeploymentPlan, EMERGENCY_OPERATOR_CONSTANT,
        EMERGENCY_UPGRADE_OPERATOR_CONSTANT, ProxyRole, ResolvedAddresses, UMBRELLA_DEPLOYER, plan,
    },
};

/// Blocks the activation transaction must be buried under.
pub const ACTIVATION_CONFIRMATIONS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    NotStarted,
    PreflightPassed,
    ProxiesDeployed,
    ConfigRegistered,
    ImplementationsDeployed,
    Activated,
    ManifestWritten,
    Failed(String),
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapState::NotStarted => f.write_str("NotStarted"),
            BootstrapState::PreflightPassed => f.write_str("PreflightPassed"),
            BootstrapState::ProxiesDeployed => f.write_str("ProxiesDeployed"),
            BootstrapState::ConfigRegistered => f.write_str("ConfigRegistered"),
            BootstrapState::ImplementationsDeployed => f.write_str("ImplementationsDeployed"),
            BootstrapState::Activated => f.write_str("Activated"),
            BootstrapState::ManifestWritten => f.write_str("ManifestWritten"),
            BootstrapState::Failed(_) => f.write_str("Failed"),
        }
    }
}

/// Everything a single run needs, resolved once from the command line.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub target: DeploymentTarget,
    pub authority: EmergencyAuthority,
    pub genesis: ConsensusGenesis,
    pub bridge: BridgeConfig,
    pub funding: FundingPlan,
    pub commit_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingOutcome {
    /// Production target: nothing was sent.
    Skipped,
    Completed(FundingReport),
}

#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub manifest_path: PathBuf,
    pub manifest: DeploymentManifest,
    /// Umbrella deployer first, then every implementation and token in
    /// deployment order.
    pub deployed: Vec<DeployedContract>,
    pub activation: TxReceipt,
    pub funding: FundingOutcome,
}

pub struct BootstrapCoordinator<'a> {
    chain: &'a dyn ChainClient,
    artifacts: &'a dyn ArtifactRegistry,
    registrar: &'a dyn ConfigRegistrar,
    clock: &'a dyn Clock,
    manifest_writer: ManifestWriter,
    retry_policy: RetryPolicy,
    state: BootstrapState,
    transitions: Vec<BootstrapState>,
}

impl<'a> BootstrapCoordinator<'a> {
    pub fn new(
        chain: &'a dyn ChainClient,
        artifacts: &'a dyn ArtifactRegistry,
        registrar: &'a dyn ConfigRegistrar,
        clock: &'a dyn Clock,
        manifest_writer: ManifestWriter,
    ) -> Self {
        Self {
            chain,
            artifacts,
            registrar,
            clock,
            manifest_writer,
            retry_policy: RetryPolicy::default(),
            state: BootstrapState::NotStarted,
            transitions: Vec::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// States entered so far, in order.
    pub fn transitions(&self) -> &[BootstrapState] {
        &self.transitions
    }

    pub async fn run(&mut self, config: &BootstrapConfig) -> Result<BootstrapOutcome, DeployerError> {
        match self.execute(config).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(state = %self.state, %err, "Bootstrap failed");
                self.transition(BootstrapState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: BootstrapState) {
        info!(from = %self.state, to = %next, "Bootstrap state transition");
        self.state = next.clone();
        self.transitions.push(next);
    }

    async fn execute(&mut self, config: &BootstrapConfig) -> Result<BootstrapOutcome, DeployerError> {
        let plan = plan(&config.bridge);
        plan.validate()?;

        let authority = PreflightValidator::new(self.chain)
            .validate(&config.target, &config.authority, &config.genesis)
            .await?;
        let state_bytes = config.genesis.state_bytes()?;
        self.transition(BootstrapState::PreflightPassed);

        let deployer = RetryingDeployer::new(
            self.chain,
            self.artifacts,
            self.clock,
            self.retry_policy,
        );
        let mut resolved = ResolvedAddresses::default();

        self.artifacts.compile()?;
        let umbrella_args = plan.resolve_args(&plan.umbrella, &resolved)?;
        let umbrella = deployer
            .deploy(&plan.umbrella.identifier, &umbrella_args)
            .await?;
        self.resolve_proxies(&plan, umbrella.address, &mut resolved)
            .await?;
        self.transition(BootstrapState::ProxiesDeployed);

        let mut constants = plan.config_constants(&resolved)?;
        constants.insert(EMERGENCY_OPERATOR_CONSTANT.to_owned(), authority.operator);
        constants.insert(
            EMERGENCY_UPGRADE_OPERATOR_CONSTANT.to_owned(),
            authority.upgrade_operator,
        );
        self.registrar.register(&constants)?;
        // Implementations embed the constants, so they must be rebuilt.
        self.artifacts.compile()?;
        self.transition(BootstrapState::ConfigRegistered);

        for (role, spec) in &plan.logic {
            let args = plan.resolve_args(spec, &resolved)?;
            let deployed = deployer.deploy(&spec.identifier, &args).await?;
            resolved.logic.insert(*role, deployed);
        }
        self.transition(BootstrapState::ImplementationsDeployed);

        let activation = self
            .activate(&plan, umbrella.address, &resolved, state_bytes)
            .await?;
        self.transition(BootstrapState::Activated);

        let block_number = self.chain.block_number().await?;
        let manifest = build_manifest(
            config,
            &plan,
            &authority,
            umbrella.address,
            &resolved,
            block_number,
        );
        let manifest_path = self
            .manifest_writer
            .write(config.target.chain_id, &manifest)?;
        self.transition(BootstrapState::ManifestWritten);

        let funding = if config.target.production {
            info!(network = %config.target.name, "Production network, skipping funding");
            FundingOutcome::Skipped
        } else {
            let token_hub = resolved.proxy(ProxyRole::TokenHub)?;
            FundingOutcome::Completed(
                PostDeployFunding::new(self.chain)
                    .fund(token_hub, &config.funding)
                    .await,
            )
        };

        let mut deployed = Vec::with_capacity(resolved.logic.len() + 1);
        deployed.push(umbrella);
        deployed.extend(resolved.logic.into_values());

        Ok(BootstrapOutcome {
            manifest_path,
            manifest,
            deployed,
            activation,
            funding,
        })
    }

    /// Reads every proxy address from the umbrella deployer's getters.
    async fn resolve_proxies(
        &self,
        plan: &DeploymentPlan,
        umbrella: Address,
        resolved: &mut ResolvedAddresses,
    ) -> Result<(), DeployerError> {
        for role in &plan.proxies {
            let getter = role.getter(&plan.executor_contract);
            let selector = compute_function_selector(&getter)?;
            let output = self
                .chain
                .call(umbrella, Bytes::copy_from_slice(&selector))
                .await
                .map_err(|err| chain_error(UMBRELLA_DEPLOYER, err))?;
            let address = decode_address(&output)?;
            if address.is_zero() {
                return Err(DeployerError::Contract {
                    contract: UMBRELLA_DEPLOYER.to_owned(),
                    reason: format!("{getter} returned the zero address"),
                    source: None,
                });
            }
            info!(
                role = %role.name(&plan.executor_contract),
                address = %to_checksum_address(&address),
                "Proxy resolved"
            );
            resolved.proxies.insert(*role, address);
        }
        Ok(())
    }

    /// Hands every implementation and token to the umbrella deployer in a
    /// single transaction. Not retried: a second attempt could double-activate.
    async fn activate(
        &self,
        plan: &DeploymentPlan,
        umbrella: Address,
        resolved: &ResolvedAddresses,
        state_bytes: Bytes,
    ) -> Result<TxReceipt, DeployerError> {
        let addresses = plan.activation_addresses(resolved)?;
        let calldata = encode_calldata(
            ACTIVATION_SIGNATURE,
            &[
                Value::Array(addresses.into_iter().map(Value::Address).collect()),
                Value::Bytes(state_bytes),
            ],
        )?;

        let pending = self
            .chain
            .send_transaction(TransactionRequest::call(umbrella, calldata.into()))
            .await
            .map_err(|err| chain_error(UMBRELLA_DEPLOYER, err))?;
        let receipt = self
            .chain
            .await_confirmation(&pending, ACTIVATION_CONFIRMATIONS)
            .await
            .map_err(|err| chain_error(UMBRELLA_DEPLOYER, err))?;

        info!(
            tx_hash = %format!("{:#x}", receipt.tx_hash),
            block_number = receipt.block_number,
            "Bridge activated"
        );
        Ok(receipt)
    }
}

fn build_manifest(
    config: &BootstrapConfig,
    plan: &DeploymentPlan,
    authority: &ResolvedAuthority,
    umbrella: Address,
    resolved: &ResolvedAddresses,
    block_number: u64,
) -> DeploymentManifest {
    let mut contracts = IndexMap::new();
    for (role, address) in &resolved.proxies {
        contracts.insert(role.name(&plan.executor_contract), (*address).into());
    }
    for (role, deployed) in &resolved.logic {
        if let Some(key) = role.manifest_key() {
            contracts.insert(key.to_owned(), deployed.address.into());
        }
    }

    DeploymentManifest {
        deploy_commit_id: config.commit_id.clone(),
        block_number,
        emergency_operator: authority.operator.into(),
        emergency_upgrade_operator: authority.upgrade_operator.into(),
        deployer: umbrella.into(),
        contracts,
        init_consensus_state: config.genesis.clone(),
        remote_chain_id: config.bridge.remote_chain_id,
        cross_chain_transfer_enabled: config.bridge.cross_chain_transfer_enabled,
    }
}
