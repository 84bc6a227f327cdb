//! Registration of proxy and authority addresses into the shared `Config`
//! contract.
//!
//! Implementations read these addresses as compile-time constants, so
//! registering means rewriting the `address public constant NAME = ...;`
//! declarations in `Config.sol` before the implementations are compiled and
//! deployed.

use std::{fs, path::PathBuf};

use bridge_common::{Address, utils::to_checksum_address};
use indexmap::IndexMap;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigRegistrationError {
    #[error("Failed to access config source {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Constant {name} is not declared in {path}")]
    MissingConstant { name: String, path: PathBuf },
}

pub trait ConfigRegistrar: Send + Sync {
    /// Makes `constants` (constant name to address) visible to every
    /// contract compiled afterwards.
    fn register(
        &self,
        constants: &IndexMap<String, Address>,
    ) -> Result<(), ConfigRegistrationError>;
}

#[derive(Debug, Clone)]
pub struct SolidityConfigRegistrar {
    config_path: PathBuf,
}

impl SolidityConfigRegistrar {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }
}

/// Rewrites the right-hand side of each `address public constant NAME = ...;`
/// line whose name is in `constants`. Indentation and unrelated lines are
/// kept as they are.
pub fn rewrite_constants(
    source: &str,
    constants: &IndexMap<String, Address>,
) -> Result<String, String> {
    let mut seen = vec![false; constants.len()];
    let mut out = String::with_capacity(source.len());

    for line in source.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        let trimmed = content.trim_start();
        let indent = &content[..content.len() - trimmed.len()];

        let declared = trimmed
            .strip_prefix("address public constant ")
            .and_then(|rest| rest.split_once('='))
            .map(|(name, _)| name.trim());

        match declared.and_then(|name| constants.get_full(name)) {
            Some((index, name, address)) => {
                seen[index] = true;
                out.push_str(&format!(
                    "{indent}address public constant {name} = {};{newline}",
                    to_checksum_address(address)
                ));
            }
            None => out.push_str(line),
        }
    }

    if let Some(index) = seen.iter().position(|seen| !seen) {
        let missing = constants
            .get_index(index)
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        return Err(missing);
    }
    Ok(out)
}

impl ConfigRegistrar for SolidityConfigRegistrar {
    fn register(
        &self,
        constants: &IndexMap<String, Address>,
    ) -> Result<(), ConfigRegistrationError> {
        let io_error = |source| ConfigRegistrationError::Io {
            path: self.config_path.clone(),
            source,
        };
        let source = fs::read_to_string(&self.config_path).map_err(io_error)?;
        let rewritten = rewrite_constants(&source, constants).map_err(|name| {
            ConfigRegistrationError::MissingConstant {
                name,
                path: self.config_path.clone(),
            }
        })?;

        if rewritten == source {
            debug!(path = %self.config_path.display(), "Config constants already up to date");
            return Ok(());
        }
        fs::write(&self.config_path, rewritten).map_err(io_error)?;
        info!(
            path = %self.config_path.display(),
            constants = constants.len(),
            "Config constants registered"
        );
        Ok(())
    }
}
