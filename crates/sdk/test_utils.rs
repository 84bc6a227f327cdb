//! In-memory artifact registry and config registrar for tests.

#![allow(clippy::unwrap_used)]

use std::{collections::HashSet, sync::Mutex};

use bridge_common::Address;
use bytes::Bytes;
use indexmap::IndexMap;

use crate::{
    artifacts::{ArtifactError, ArtifactRegistry, ContractFactory},
    config::{ConfigRegistrar, ConfigRegistrationError},
};

/// Serves a factory for any identifier; its bytecode is the identifier's
/// UTF-8 bytes, which keeps deployments distinguishable on a mock chain.
#[derive(Default)]
pub struct MockArtifacts {
    missing: HashSet<String>,
    compilations: Mutex<usize>,
    requests: Mutex<Vec<String>>,
}

impl MockArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// `factory(identifier)` fails with [`ArtifactError::NotFound`].
    pub fn without(mut self, identifier: &str) -> Self {
        self.missing.insert(identifier.to_owned());
        self
    }

    pub fn compilations(&self) -> usize {
        *self.compilations.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl ArtifactRegistry for MockArtifacts {
    fn compile(&self) -> Result<(), ArtifactError> {
        *self.compilations.lock().unwrap() += 1;
        Ok(())
    }

    fn factory(&self, identifier: &str) -> Result<ContractFactory, ArtifactError> {
        self.requests.lock().unwrap().push(identifier.to_owned());
        if self.missing.contains(identifier) {
            return Err(ArtifactError::NotFound(identifier.to_owned()));
        }
        Ok(ContractFactory::new(
            identifier,
            Bytes::copy_from_slice(identifier.as_bytes()),
        ))
    }
}

/// Keeps every registration instead of touching any source file.
#[derive(Default)]
pub struct RecordingRegistrar {
    registrations: Mutex<Vec<IndexMap<String, Address>>>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> Vec<IndexMap<String, Address>> {
        self.registrations.lock().unwrap().clone()
    }
}

impl ConfigRegistrar for RecordingRegistrar {
    fn register(
        &self,
        constants: &IndexMap<String, Address>,
    ) -> Result<(), ConfigRegistrationError> {
        self.registrations.lock().unwrap().push(constants.clone());
        Ok(())
    }
}
