//! Capability sets a crypto suite may expose
//!
//! A suite offers any subset of four facets, each a map from algorithm
//! identifier to an implementation:
//!
//! ```text
//! encrypters            asymmetric encrypt/decrypt   (e.g. RSA-OAEP)
//! signers               sign/verify                  (e.g. RS256)
//! key_constructors      JWK -> public key             (e.g. RsaVerificationKey2018)
//! symmetric_encrypters  AEAD encrypt/decrypt          (e.g. A256GCM)
//! ```
//!
//! Every facet defaults to empty, so a suite implements only what it provides.

use std::collections::BTreeMap;
use std::sync::Arc;

use jwa_core::{EncodedAead, JwaResult, Jwk};

use crate::keys::SymmetricKey;

/// Output of a symmetric encryption. The key is generated per call and handed back.
#[derive(Debug)]
pub struct AeadResult {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub key: SymmetricKey,
    pub tag: Vec<u8>,
}

impl AeadResult {
    pub fn encode(&self, alg: &str) -> EncodedAead {
        EncodedAead::encode(alg, &self.ciphertext, &self.iv, self.key.as_bytes(), &self.tag)
    }
}

/// Authenticated symmetric encryption under a fresh key.
pub trait SymmetricEncrypter: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> JwaResult<AeadResult>;

    fn decrypt(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        iv: &[u8],
        key: &[u8],
        tag: &[u8],
    ) -> JwaResult<Vec<u8>>;
}

/// Asymmetric encryption with JWK-formatted keys.
pub trait Encrypter: Send + Sync {
    fn encrypt(&self, data: &[u8], public_key: &Jwk) -> JwaResult<Vec<u8>>;

    fn decrypt(&self, data: &[u8], private_key: &Jwk) -> JwaResult<Vec<u8>>;
}

/// Signing with JWK-formatted keys. `sign` yields a compact serialization.
pub trait Signer: Send + Sync {
    fn sign(&self, content: &str, private_key: &Jwk) -> JwaResult<String>;

    fn verify(&self, signed_content: &str, signature: &str, public_key: &Jwk) -> JwaResult<bool>;
}

/// Builds a public key JWK from a verification-key description.
pub type KeyConstructor = Arc<dyn Fn(&Jwk) -> JwaResult<Jwk> + Send + Sync>;

pub type EncrypterMap = BTreeMap<String, Arc<dyn Encrypter>>;
pub type SignerMap = BTreeMap<String, Arc<dyn Signer>>;
pub type KeyConstructorMap = BTreeMap<String, KeyConstructor>;
pub type SymmetricEncrypterMap = BTreeMap<String, Arc<dyn SymmetricEncrypter>>;

/// A pluggable set of algorithms.
pub trait CryptoSuite: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn encrypters(&self) -> EncrypterMap {
        BTreeMap::new()
    }

    fn signers(&self) -> SignerMap {
        BTreeMap::new()
    }

    fn key_constructors(&self) -> KeyConstructorMap {
        BTreeMap::new()
    }

    fn symmetric_encrypters(&self) -> SymmetricEncrypterMap {
        BTreeMap::new()
    }
}
