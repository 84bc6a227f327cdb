pub mod eth;

pub use eth::{EthClient, EthClientConfig, errors::EthClientError};
