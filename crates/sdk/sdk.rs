pub mod artifacts;
pub mod config;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use artifacts::{ArtifactError, ArtifactRegistry, ContractFactory, HardhatArtifacts};
pub use config::{ConfigRegistrar, ConfigRegistrationError, SolidityConfigRegistrar};
