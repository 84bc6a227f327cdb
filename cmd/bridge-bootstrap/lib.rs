pub mod cli;
pub mod deployer;
pub mod initializers;
pub mod utils;
