mod deployment;
mod transaction;

pub use deployment::*;
pub use transaction::*;
