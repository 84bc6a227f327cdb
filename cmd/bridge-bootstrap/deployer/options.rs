use std::{path::PathBuf, time::Duration};

use bridge_common::{
    Address,
    genesis::ConsensusGenesis,
    networks::Network,
    types::{DeploymentTarget, EmergencyAuthority},
    utils::{
        derive_key_from_mnemonic, get_address_from_secret_key, parse_hex, parse_private_key,
        units_to_wei,
    },
};
use bridge_rpc::EthClientConfig;
use clap::{ArgAction, Parser};
use secp256k1::SecretKey;
use url::Url;

use super::{
    coordinator::BootstrapConfig, errors::DeployerError, funding::FundingPlan,
    topology::BridgeConfig,
};

/// First account of the standard development mnemonic. Only accepted on
/// `local` and `test`.
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn parse_address(s: &str) -> eyre::Result<Address> {
    let bytes = parse_hex(s)?;
    if bytes.len() != Address::len_bytes() {
        eyre::bail!("expected a 20-byte address, got {} bytes", bytes.len());
    }
    Ok(Address::from_slice(&bytes))
}

#[derive(Parser, Debug, Clone)]
pub struct DeployerOptions {
    #[arg(
        long,
        default_value = "local",
        value_name = "NETWORK",
        value_parser = clap::value_parser!(Network),
        env = "BRIDGE_NETWORK",
        help_heading = "Network options",
        help = "Network preset: local, test, bsc-testnet, bsc, polygon, linea, scroll, mantle, arbitrum, optimism, goerli, opbnb or opbnb-testnet."
    )]
    pub network: Network,
    #[arg(
        long,
        value_name = "RPC_URL",
        env = "BRIDGE_RPC_URL",
        help_heading = "Network options",
        help = "Overrides the preset RPC endpoint."
    )]
    pub rpc_url: Option<Url>,
    #[arg(
        long,
        value_name = "WEI",
        env = "BRIDGE_GAS_PRICE",
        help_heading = "Network options",
        help = "Fixed gas price in wei. Defaults to the preset's, or the node's suggestion."
    )]
    pub gas_price: Option<u64>,
    #[arg(
        long = "confirmation-poll-interval-ms",
        default_value = "1000",
        value_name = "MILLISECONDS",
        env = "BRIDGE_CONFIRMATION_POLL_INTERVAL_MS",
        help_heading = "Network options"
    )]
    pub confirmation_poll_interval_ms: u64,
    #[arg(
        long,
        value_name = "PRIVATE_KEY",
        value_parser = parse_private_key,
        env = "DEPLOYER_PRIVATE_KEY",
        help_heading = "Deployer options",
        help = "Private key of the funded account that deploys and activates the bridge. Required outside local and test."
    )]
    pub private_key: Option<SecretKey>,
    #[arg(
        long = "mnemonic",
        value_name = "PHRASE",
        value_parser = derive_key_from_mnemonic,
        env = "DEPLOYER_MNEMONIC",
        hide_env_values = true,
        conflicts_with = "private_key",
        help_heading = "Deployer options",
        help = "BIP-39 mnemonic of the deployer; its first account (m/44'/60'/0'/0/0) signs. Alternative to --private-key."
    )]
    pub mnemonic_key: Option<SecretKey>,
    #[arg(
        long,
        value_name = "PRIVATE_KEY",
        value_parser = parse_private_key,
        env = "RELAYER_PRIVATE_KEY",
        help_heading = "Deployer options",
        help = "Relayer key; its address is added to the relayer funding targets."
    )]
    pub relayer_private_key: Option<SecretKey>,
    #[arg(
        long,
        value_name = "ADDRESS",
        value_parser = parse_address,
        env = "BRIDGE_EMERGENCY_OPERATOR",
        help_heading = "Deployer options",
        help = "May suspend, reopen and cancel transfers. Must be a contract on production networks."
    )]
    pub emergency_operator: Option<Address>,
    #[arg(
        long,
        value_name = "ADDRESS",
        value_parser = parse_address,
        env = "BRIDGE_EMERGENCY_UPGRADE_OPERATOR",
        help_heading = "Deployer options",
        help = "May update parameters and upgrade contracts. Must be a contract on production networks."
    )]
    pub emergency_upgrade_operator: Option<Address>,
    #[arg(
        long,
        value_name = "STRING",
        env = "EXPLORER_API_KEY",
        help_heading = "Deployer options",
        help = "Block explorer API key for source verification, which is run separately."
    )]
    pub explorer_api_key: Option<String>,
    #[arg(
        long,
        value_name = "PATH",
        env = "BRIDGE_GENESIS",
        help_heading = "Bridge options",
        help = "Consensus genesis JSON. Defaults to the network's compiled-in fixture."
    )]
    pub genesis: Option<PathBuf>,
    #[arg(
        long,
        default_value = "5151",
        value_name = "UINT64",
        env = "BRIDGE_REMOTE_CHAIN_ID",
        help_heading = "Bridge options"
    )]
    pub remote_chain_id: u64,
    #[arg(
        long,
        default_value = "true",
        value_name = "BOOLEAN",
        action = ArgAction::Set,
        env = "BRIDGE_CROSS_CHAIN_TRANSFER",
        help_heading = "Bridge options"
    )]
    pub cross_chain_transfer: bool,
    #[arg(
        long,
        value_name = "CONTRACT",
        env = "BRIDGE_EXECUTOR_CONTRACT",
        help_heading = "Bridge options",
        help = "Executor contract name. Defaults to the network's (GreenfieldExecutor or MechainExecutor)."
    )]
    pub executor_contract: Option<String>,
    #[arg(
        long,
        default_value = ".",
        value_name = "PATH",
        env = "BRIDGE_CONTRACTS_DIR",
        help_heading = "Contracts options",
        help = "Hardhat project root."
    )]
    pub contracts_dir: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        env = "BRIDGE_ARTIFACTS_DIR",
        help_heading = "Contracts options",
        help = "Hardhat artifacts directory. Defaults to <contracts-dir>/artifacts."
    )]
    pub artifacts_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        env = "BRIDGE_CONFIG_CONTRACT",
        help_heading = "Contracts options",
        help = "Solidity source declaring the address constants. Defaults to <contracts-dir>/contracts/Config.sol."
    )]
    pub config_contract: Option<PathBuf>,
    #[arg(
        long,
        default_value = "false",
        env = "BRIDGE_SKIP_COMPILE",
        help_heading = "Contracts options",
        help = "Use the existing artifacts instead of running `npx hardhat compile`."
    )]
    pub skip_compile: bool,
    #[arg(
        long,
        default_value = "deployment",
        value_name = "PATH",
        env = "BRIDGE_DEPLOYMENT_DIR",
        help_heading = "Output options"
    )]
    pub deployment_dir: PathBuf,
    #[arg(
        long,
        default_value = "1",
        value_name = "UNITS",
        env = "BRIDGE_FUND_TOKEN_HUB",
        help_heading = "Funding options",
        help = "Native units sent to the TokenHub proxy after activation. Never sent on production networks."
    )]
    pub fund_token_hub: u64,
    #[arg(
        long,
        default_value = "false",
        env = "BRIDGE_FUND_RELAYERS",
        help_heading = "Funding options",
        help = "Also fund every relayer listed in the consensus genesis."
    )]
    pub fund_relayers: bool,
    #[arg(
        long,
        default_value = "100",
        value_name = "UNITS",
        env = "BRIDGE_RELAYER_FUNDING",
        help_heading = "Funding options"
    )]
    pub relayer_funding: u64,
}

impl DeployerOptions {
    pub fn deployer_key(&self) -> Result<SecretKey, DeployerError> {
        match self.private_key.or(self.mnemonic_key) {
            Some(key) => Ok(key),
            None if self.network.allows_dev_key() => parse_private_key(DEV_PRIVATE_KEY)
                .map_err(|err| DeployerError::Configuration(err.to_string())),
            None => Err(DeployerError::Configuration(format!(
                "--private-key (DEPLOYER_PRIVATE_KEY) or --mnemonic (DEPLOYER_MNEMONIC) is required on {}",
                self.network
            ))),
        }
    }

    pub fn rpc_url(&self) -> Result<Url, DeployerError> {
        match &self.rpc_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.network.default_rpc_url())
                .map_err(|err| DeployerError::Configuration(err.to_string())),
        }
    }

    pub fn eth_client_config(&self) -> EthClientConfig {
        EthClientConfig {
            gas_price: self.gas_price.or(self.network.gas_price()),
            confirmation_poll_interval: Duration::from_millis(self.confirmation_poll_interval_ms),
            ..Default::default()
        }
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.artifacts_dir
            .clone()
            .unwrap_or_else(|| self.contracts_dir.join("artifacts"))
    }

    pub fn config_contract(&self) -> PathBuf {
        self.config_contract
            .clone()
            .unwrap_or_else(|| self.contracts_dir.join("contracts").join("Config.sol"))
    }

    pub fn load_genesis(&self) -> Result<ConsensusGenesis, DeployerError> {
        let genesis = match &self.genesis {
            Some(path) => ConsensusGenesis::from_file(path)?,
            None => ConsensusGenesis::from_json(self.network.genesis_contents())?,
        };
        Ok(genesis)
    }

    /// Builds the per-run configuration. Dev presets take their chain id
    /// from the node; fixed presets are checked against it in preflight.
    pub fn bootstrap_config(
        &self,
        reported_chain_id: u64,
        commit_id: String,
    ) -> Result<BootstrapConfig, DeployerError> {
        let genesis = self.load_genesis()?;

        let mut relayers = Vec::new();
        if self.fund_relayers {
            relayers.extend(genesis.relayer_addresses());
            if let Some(key) = &self.relayer_private_key {
                let relayer = get_address_from_secret_key(key);
                if !relayers.contains(&relayer) {
                    relayers.push(relayer);
                }
            }
        }

        Ok(BootstrapConfig {
            target: DeploymentTarget::from_network(self.network, reported_chain_id),
            authority: EmergencyAuthority::new(
                self.emergency_operator,
                self.emergency_upgrade_operator,
            ),
            bridge: BridgeConfig {
                remote_chain_id: self.remote_chain_id,
                cross_chain_transfer_enabled: self.cross_chain_transfer,
                executor_contract: self
                    .executor_contract
                    .clone()
                    .unwrap_or_else(|| self.network.executor_contract().to_owned()),
            },
            funding: FundingPlan {
                token_hub: units_to_wei(self.fund_token_hub),
                relayers,
                relayer_amount: units_to_wei(self.relayer_funding),
            },
            genesis,
            commit_id,
        })
    }
}
