//! Merges the capability sets of several suites into one lookup table
//!
//! Built once at startup and shared read-only (`Arc<SuiteRegistry>`). Two suites
//! exposing the same identifier in the same facet is a configuration error.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use jwa_core::config::SuiteConfig;
use jwa_core::{JwaError, JwaResult};
use tracing::debug;

use crate::aes_suite::AesCryptoSuite;
use crate::suite::{
    CryptoSuite, Encrypter, EncrypterMap, KeyConstructor, KeyConstructorMap, Signer, SignerMap,
    SymmetricEncrypter, SymmetricEncrypterMap,
};

#[derive(Default)]
pub struct SuiteRegistry {
    encrypters: EncrypterMap,
    signers: SignerMap,
    key_constructors: KeyConstructorMap,
    symmetric_encrypters: SymmetricEncrypterMap,
}

impl SuiteRegistry {
    pub fn builder() -> SuiteRegistryBuilder {
        SuiteRegistryBuilder::default()
    }

    /// Registry holding the AES suite, restricted by `config.enabled_algorithms`.
    pub fn from_config(config: &SuiteConfig) -> JwaResult<Self> {
        Self::builder()
            .suite(AesCryptoSuite::new())
            .enabled(config.enabled_algorithms.iter().cloned())
            .build()
    }

    pub fn symmetric(&self, alg: &str) -> JwaResult<Arc<dyn SymmetricEncrypter>> {
        self.symmetric_encrypters
            .get(alg)
            .cloned()
            .ok_or_else(|| JwaError::UnsupportedAlgorithm(alg.to_string()))
    }

    pub fn encrypter(&self, alg: &str) -> JwaResult<Arc<dyn Encrypter>> {
        self.encrypters
            .get(alg)
            .cloned()
            .ok_or_else(|| JwaError::UnsupportedAlgorithm(alg.to_string()))
    }

    pub fn signer(&self, alg: &str) -> JwaResult<Arc<dyn Signer>> {
        self.signers
            .get(alg)
            .cloned()
            .ok_or_else(|| JwaError::UnsupportedAlgorithm(alg.to_string()))
    }

    pub fn key_constructor(&self, key_type: &str) -> JwaResult<KeyConstructor> {
        self.key_constructors
            .get(key_type)
            .cloned()
            .ok_or_else(|| JwaError::UnsupportedAlgorithm(key_type.to_string()))
    }

    pub fn symmetric_algorithms(&self) -> Vec<&str> {
        self.symmetric_encrypters.keys().map(String::as_str).collect()
    }

    pub fn encrypter_algorithms(&self) -> Vec<&str> {
        self.encrypters.keys().map(String::as_str).collect()
    }

    pub fn signer_algorithms(&self) -> Vec<&str> {
        self.signers.keys().map(String::as_str).collect()
    }

    pub fn key_types(&self) -> Vec<&str> {
        self.key_constructors.keys().map(String::as_str).collect()
    }
}

impl CryptoSuite for SuiteRegistry {
    fn name(&self) -> &str {
        "registry"
    }

    fn encrypters(&self) -> EncrypterMap {
        self.encrypters.clone()
    }

    fn signers(&self) -> SignerMap {
        self.signers.clone()
    }

    fn key_constructors(&self) -> KeyConstructorMap {
        self.key_constructors.clone()
    }

    fn symmetric_encrypters(&self) -> SymmetricEncrypterMap {
        self.symmetric_encrypters.clone()
    }
}

#[derive(Default)]
pub struct SuiteRegistryBuilder {
    suites: Vec<Box<dyn CryptoSuite>>,
    enabled: Option<BTreeSet<String>>,
}

impl SuiteRegistryBuilder {
    pub fn suite(mut self, suite: impl CryptoSuite + 'static) -> Self {
        self.suites.push(Box::new(suite));
        self
    }

    /// Restrict the symmetric facet to these identifiers. An empty list keeps everything.
    pub fn enabled<I, S>(mut self, algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = algorithms.into_iter().map(Into::into).collect();
        self.enabled = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn build(self) -> JwaResult<SuiteRegistry> {
        let mut registry = SuiteRegistry::default();
        for suite in &self.suites {
            merge(&mut registry.encrypters, suite.encrypters())?;
            merge(&mut registry.signers, suite.signers())?;
            merge(&mut registry.key_constructors, suite.key_constructors())?;
            merge(&mut registry.symmetric_encrypters, suite.symmetric_encrypters())?;
            debug!(suite = suite.name(), "suite registered");
        }

        if let Some(enabled) = &self.enabled {
            if let Some(missing) = enabled
                .iter()
                .find(|alg| !registry.symmetric_encrypters.contains_key(alg.as_str()))
            {
                return Err(JwaError::Config(format!(
                    "enabled algorithm {missing} is not provided by any suite"
                )));
            }
            registry
                .symmetric_encrypters
                .retain(|alg, _| enabled.contains(alg));
        }

        debug!(
            symmetric = registry.symmetric_encrypters.len(),
            encrypters = registry.encrypters.len(),
            signers = registry.signers.len(),
            key_constructors = registry.key_constructors.len(),
            "suite registry built"
        );
        Ok(registry)
    }
}

fn merge<V>(into: &mut BTreeMap<String, V>, from: BTreeMap<String, V>) -> JwaResult<()> {
    for (alg, value) in from {
        match into.entry(alg) {
            Entry::Occupied(e) => return Err(JwaError::DuplicateAlgorithm(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(value);
            }
        }
    }
    Ok(())
}
