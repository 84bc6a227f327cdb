pub use ethereum_types::*;

pub mod calldata;
pub mod genesis;
pub mod networks;
pub mod rlp;
pub mod types;
pub mod utils;
