//! Contract artifacts produced by a Hardhat project.
//!
//! The bootstrap only needs "compile, then get a factory by name": the
//! [`ArtifactRegistry`] trait is that seam, and [`HardhatArtifacts`] reads
//! `artifacts/contracts/**/<Name>.sol/<Name>.json` after running
//! `npx hardhat compile`.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use bridge_common::calldata::{Value, encode_tuple};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to run `{command}`: {source}")]
    CompilerUnavailable {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    CompilationFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("No artifact for contract {0}")]
    NotFound(String),
    #[error("Artifact for {0} has no creation bytecode (abstract contract or interface?)")]
    NotDeployable(String),
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed artifact {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Creation bytecode for one contract, ready to be combined with
/// constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFactory {
    pub identifier: String,
    pub bytecode: Bytes,
}

impl ContractFactory {
    pub fn new(identifier: impl Into<String>, bytecode: Bytes) -> Self {
        Self {
            identifier: identifier.into(),
            bytecode,
        }
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    pub fn deploy_data(&self, constructor_args: &[Value]) -> Bytes {
        let mut init_code = self.bytecode.to_vec();
        init_code.extend_from_slice(&encode_tuple(constructor_args));
        init_code.into()
    }
}

pub trait ArtifactRegistry: Send + Sync {
    fn compile(&self) -> Result<(), ArtifactError>;

    fn factory(&self, identifier: &str) -> Result<ContractFactory, ArtifactError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    bytecode: String,
}

#[derive(Debug, Clone)]
pub struct HardhatArtifacts {
    project_root: PathBuf,
    artifacts_dir: PathBuf,
    skip_compile: bool,
}

impl HardhatArtifacts {
    pub fn new(project_root: PathBuf, artifacts_dir: PathBuf, skip_compile: bool) -> Self {
        Self {
            project_root,
            artifacts_dir,
            skip_compile,
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    fn find_artifact(&self, identifier: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{identifier}.json");
        let root = self.artifacts_dir.join("contracts");
        let mut pending = vec![root];

        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(ArtifactError::Io { path: dir, source }),
            };
            for entry in entries {
                let path = entry
                    .map_err(|source| ArtifactError::Io {
                        path: dir.clone(),
                        source,
                    })?
                    .path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.file_name().is_some_and(|name| name == file_name.as_str()) {
                    return Ok(path);
                }
            }
        }

        Err(ArtifactError::NotFound(identifier.to_owned()))
    }
}

impl ArtifactRegistry for HardhatArtifacts {
    fn compile(&self) -> Result<(), ArtifactError> {
        let command = "npx hardhat compile".to_owned();
        if self.skip_compile {
            debug!("Skipping contract compilation");
            return Ok(());
        }

        info!(project = %self.project_root.display(), "Compiling contracts");
        let output = Command::new("npx")
            .args(["hardhat", "compile"])
            .current_dir(&self.project_root)
            .output()
            .map_err(|source| ArtifactError::CompilerUnavailable {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ArtifactError::CompilationFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }

    fn factory(&self, identifier: &str) -> Result<ContractFactory, ArtifactError> {
        let path = self.find_artifact(identifier)?;
        let raw = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        let artifact: HardhatArtifact =
            serde_json::from_str(&raw).map_err(|err| ArtifactError::Malformed {
                path: path.clone(),
                reason: err.to_string(),
            })?;

        if artifact.contract_name != identifier {
            return Err(ArtifactError::Malformed {
                path,
                reason: format!("contractName is {}", artifact.contract_name),
            });
        }

        let bytecode = bridge_common::utils::parse_hex(&artifact.bytecode).map_err(|err| {
            ArtifactError::Malformed {
                path: path.clone(),
                reason: err.to_string(),
            }
        })?;
        if bytecode.is_empty() {
            return Err(ArtifactError::NotDeployable(identifier.to_owned()));
        }

        debug!(identifier, path = %path.display(), size = bytecode.len(), "Loaded artifact");
        Ok(ContractFactory::new(identifier, bytecode))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use bridge_common::U256;

    fn write_artifact(root: &Path, source: &str, name: &str, bytecode: &str) {
        let dir = root.join("contracts").join(source);
        fs::create_dir_all(&dir).unwrap();
        let artifact = serde_json::json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": format!("contracts/{source}"),
            "abi": [],
            "bytecode": bytecode,
            "deployedBytecode": "0x",
        });
        fs::write(dir.join(format!("{name}.json")), artifact.to_string()).unwrap();
        fs::write(dir.join(format!("{name}.dbg.json")), "{}").unwrap();
    }

    #[test]
    fn finds_artifacts_in_nested_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "tokens/ERC721NonTransferable.sol", "ERC721NonTransferable", "0x6080");
        write_artifact(dir.path(), "GovHub.sol", "GovHub", "0x60806040");

        let registry = HardhatArtifacts::new(dir.path().to_path_buf(), dir.path().to_path_buf(), true);

        let factory = registry.factory("ERC721NonTransferable").unwrap();
        assert_eq!(factory.bytecode.as_ref(), &[0x60, 0x80]);
        assert_eq!(registry.factory("GovHub").unwrap().bytecode.len(), 4);
    }

    #[test]
    fn missing_and_abstract_contracts_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "interfaces/IHub.sol", "IHub", "0x");
        let registry = HardhatArtifacts::new(dir.path().to_path_buf(), dir.path().to_path_buf(), true);

        assert!(matches!(
            registry.factory("IHub"),
            Err(ArtifactError::NotDeployable(name)) if name == "IHub"
        ));
        assert!(matches!(
            registry.factory("Nope"),
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[test]
    fn skip_compile_does_not_spawn_the_compiler() {
        let registry = HardhatArtifacts::new(
            PathBuf::from("/nonexistent"),
            PathBuf::from("/nonexistent/artifacts"),
            true,
        );
        assert!(registry.compile().is_ok());
    }

    #[test]
    fn deploy_data_appends_constructor_arguments() {
        let factory = ContractFactory::new("Deployer", Bytes::from_static(&[0x60, 0x80]));
        let data = factory.deploy_data(&[Value::Uint(U256::from(5151)), Value::Bool(true)]);
        assert_eq!(data.len(), 2 + 64);
        assert_eq!(&data[..2], &[0x60, 0x80]);
        assert_eq!(data[2 + 63], 1);
    }
}
