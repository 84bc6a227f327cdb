use std::{fmt, str::FromStr};

use crate::genesis::{
    MECHAIN_ARBITRUM_GENESIS_CONTENTS, MECHAIN_BSC_GENESIS_CONTENTS,
    MECHAIN_POLYGON_GENESIS_CONTENTS,
};

pub const GREENFIELD_EXECUTOR: &str = "GreenfieldExecutor";
pub const MECHAIN_EXECUTOR: &str = "MechainExecutor";

/// Networks the bridge can be bootstrapped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Local,
    Test,
    BscTestnet,
    Bsc,
    Polygon,
    Linea,
    Scroll,
    Mantle,
    Arbitrum,
    Optimism,
    Goerli,
    OpBnb,
    OpBnbTestnet,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown network `{0}`")]
pub struct UnknownNetwork(pub String);

impl Network {
    pub const ALL: [Network; 13] = [
        Network::Local,
        Network::Test,
        Network::BscTestnet,
        Network::Bsc,
        Network::Polygon,
        Network::Linea,
        Network::Scroll,
        Network::Mantle,
        Network::Arbitrum,
        Network::Optimism,
        Network::Goerli,
        Network::OpBnb,
        Network::OpBnbTestnet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Local => "local",
            Network::Test => "test",
            Network::BscTestnet => "bsc-testnet",
            Network::Bsc => "bsc",
            Network::Polygon => "polygon",
            Network::Linea => "linea",
            Network::Scroll => "scroll",
            Network::Mantle => "mantle",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Goerli => "goerli",
            Network::OpBnb => "opbnb",
            Network::OpBnbTestnet => "opbnb-testnet",
        }
    }

    /// Expected chain id. Development networks accept whatever the node reports.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Network::Local | Network::Test => None,
            Network::BscTestnet => Some(97),
            Network::Bsc => Some(56),
            Network::Polygon => Some(137),
            Network::Linea => Some(59144),
            Network::Scroll => Some(534352),
            Network::Mantle => Some(5000),
            Network::Arbitrum => Some(42161),
            Network::Optimism => Some(10),
            Network::Goerli => Some(5),
            Network::OpBnb => Some(204),
            Network::OpBnbTestnet => Some(5611),
        }
    }

    /// Production networks get the strict emergency-authority checks and
    /// never receive automatic post-activation funding.
    pub fn is_production(&self) -> bool {
        matches!(
            self,
            Network::Bsc
                | Network::Polygon
                | Network::Linea
                | Network::Scroll
                | Network::Mantle
                | Network::Arbitrum
                | Network::Optimism
                | Network::OpBnb
        )
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Local | Network::Test => "http://127.0.0.1:8545",
            Network::BscTestnet => "https://bsc-testnet-rpc.publicnode.com/",
            Network::Bsc => "https://bsc-dataseed1.binance.org",
            Network::Polygon => "https://polygon-bor-rpc.publicnode.com",
            Network::Linea => "https://linea.blockpi.network/v1/rpc/public",
            Network::Scroll => "https://scroll.drpc.org",
            Network::Mantle => "https://rpc.ankr.com/mantle",
            Network::Arbitrum => "https://api.stateless.solutions/arbitrum-one/v1/demo",
            Network::Optimism => "https://optimism.llamarpc.com",
            Network::Goerli => "https://rpc.ankr.com/eth_goerli",
            Network::OpBnb => "https://opbnb-mainnet-rpc.bnbchain.org",
            Network::OpBnbTestnet => "https://opbnb-testnet-rpc.bnbchain.org",
        }
    }

    /// Fixed gas price in wei, when the network needs one.
    pub fn gas_price(&self) -> Option<u64> {
        match self {
            Network::Local | Network::BscTestnet => Some(10_000_000_000),
            Network::Bsc => Some(3_100_000_000),
            Network::OpBnb | Network::OpBnbTestnet => Some(100_000_000),
            _ => None,
        }
    }

    /// Dev networks may fall back to the well-known development key.
    pub fn allows_dev_key(&self) -> bool {
        matches!(self, Network::Local | Network::Test)
    }

    pub fn executor_contract(&self) -> &'static str {
        match self {
            Network::Polygon | Network::Arbitrum => MECHAIN_EXECUTOR,
            _ => GREENFIELD_EXECUTOR,
        }
    }

    pub fn genesis_contents(&self) -> &'static str {
        match self {
            Network::Polygon => MECHAIN_POLYGON_GENESIS_CONTENTS,
            Network::Arbitrum => MECHAIN_ARBITRUM_GENESIS_CONTENTS,
            _ => MECHAIN_BSC_GENESIS_CONTENTS,
        }
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|network| network.name() == s)
            .ok_or_else(|| UnknownNetwork(s.to_owned()))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
