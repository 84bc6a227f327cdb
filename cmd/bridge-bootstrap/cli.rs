use std::{fmt::Display, path::PathBuf, str::FromStr};

use bridge_common::{networks::Network, utils::to_checksum_address};
use clap::{Parser as ClapParser, Subcommand as ClapSubcommand};
use tracing::{Level, info, warn};

use crate::{
    deployer::{DeployerOptions, FundingOutcome, ManifestWriter, deploy_bridge},
    initializers::init_tracing,
};

#[allow(clippy::upper_case_acronyms)]
#[derive(ClapParser)]
#[command(
    name = "bridge-bootstrap",
    version,
    about = "Deploys, wires and activates the cross-chain bridge contracts"
)]
pub struct CLI {
    #[command(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(ClapParser, Debug, Clone)]
pub struct Options {
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        env = "BRIDGE_LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error",
        help_heading = "Log options",
        global = true
    )]
    pub log_level: Level,
    #[arg(
        long = "log.color",
        default_value_t = LogColor::Auto,
        help = "Output logs with ANSI color codes.",
        long_help = "Possible values: auto, always, never",
        help_heading = "Log options",
        env = "BRIDGE_LOG_COLOR",
        global = true
    )]
    pub log_color: LogColor,
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    #[command(about = "Deploy and activate every bridge contract on a network.")]
    Deploy {
        #[command(flatten)]
        options: DeployerOptions,
    },
    #[command(about = "List the supported network presets.")]
    Networks,
    #[command(about = "Print the manifest written by a previous deployment.")]
    Manifest {
        #[arg(long, value_name = "UINT64", help = "Chain id the manifest was written for.")]
        chain_id: u64,
        #[arg(
            long,
            default_value = "deployment",
            value_name = "PATH",
            env = "BRIDGE_DEPLOYMENT_DIR"
        )]
        deployment_dir: PathBuf,
    },
}

impl Subcommand {
    pub async fn run(self, opts: &Options) -> eyre::Result<()> {
        init_tracing(opts)?;

        match self {
            Subcommand::Deploy { options } => {
                let outcome = deploy_bridge(options).await?;
                info!(
                    manifest = %outcome.manifest_path.display(),
                    contracts = outcome.deployed.len(),
                    block_number = outcome.manifest.block_number,
                    "Bridge bootstrap complete"
                );
                if let FundingOutcome::Completed(report) = &outcome.funding {
                    for failure in &report.failures {
                        warn!(
                            recipient = %to_checksum_address(&failure.recipient),
                            reason = %failure.reason,
                            "Funding still pending, send it manually"
                        );
                    }
                }
            }
            Subcommand::Networks => {
                for network in Network::ALL {
                    let chain_id = network
                        .chain_id()
                        .map_or_else(|| "node".to_owned(), |id| id.to_string());
                    println!(
                        "{:<14} chain_id={:<8} production={:<5} executor={}",
                        network.name(),
                        chain_id,
                        network.is_production(),
                        network.executor_contract()
                    );
                }
            }
            Subcommand::Manifest {
                chain_id,
                deployment_dir,
            } => {
                let manifest = ManifestWriter::new(deployment_dir).read(chain_id)?;
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum LogColor {
    #[default]
    Auto,
    Always,
    Never,
}

impl Display for LogColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogColor::Auto => write!(f, "auto"),
            LogColor::Always => write!(f, "always"),
            LogColor::Never => write!(f, "never"),
        }
    }
}

impl FromStr for LogColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(LogColor::Auto),
            "always" => Ok(LogColor::Always),
            "never" => Ok(LogColor::Never),
            _ => Err(format!(
                "Invalid log color '{s}'. Expected: auto, always, or never"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn log_options_are_accepted_after_the_subcommand() {
        let cli = CLI::try_parse_from([
            "bridge-bootstrap",
            "deploy",
            "--network",
            "bsc-testnet",
            "--log.level",
            "debug",
            "--log.color",
            "never",
        ])
        .unwrap();

        assert_eq!(cli.opts.log_level, Level::DEBUG);
        assert_eq!(cli.opts.log_color, LogColor::Never);
        let Subcommand::Deploy { options } = cli.command else {
            panic!("expected the deploy subcommand");
        };
        assert_eq!(options.network, Network::BscTestnet);
    }

    #[test]
    fn unknown_network_is_rejected() {
        assert!(CLI::try_parse_from(["bridge-bootstrap", "deploy", "--network", "moon"]).is_err());
    }

    #[test]
    fn log_color_parses_case_insensitively() {
        assert_eq!("ALWAYS".parse::<LogColor>(), Ok(LogColor::Always));
        assert!("sometimes".parse::<LogColor>().is_err());
    }
}
