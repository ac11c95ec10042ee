//! The AES suite: symmetric AEAD only

use std::sync::Arc;

use tracing::debug;

use crate::algorithm::SymmetricAlgorithm;
use crate::cbc_hmac::AesCbcHmacSha2;
use crate::gcm::AesGcm;
use crate::random::{os_random, SecureRandom};
use crate::suite::{CryptoSuite, SymmetricEncrypter, SymmetricEncrypterMap};
use crate::tag::HmacHash;

/// Provides A128CBC-HS256, A192CBC-HS384, A256CBC-HS512, A128GCM, A192GCM and A256GCM.
///
/// Asymmetric encryption, signing and key construction are left empty.
pub struct AesCryptoSuite {
    rng: Arc<dyn SecureRandom>,
}

impl AesCryptoSuite {
    pub fn new() -> Self {
        Self::with_random(os_random())
    }

    /// Use a specific random source for every key and IV the suite generates.
    pub fn with_random(rng: Arc<dyn SecureRandom>) -> Self {
        Self { rng }
    }

    /// Build the encrypter for one algorithm.
    pub fn encrypter(&self, alg: SymmetricAlgorithm) -> Arc<dyn SymmetricEncrypter> {
        use SymmetricAlgorithm::*;

        let rng = self.rng.clone();
        match alg {
            A128CbcHs256 => Arc::new(AesCbcHmacSha2::with_hash(alg, HmacHash::Sha256, rng)),
            A192CbcHs384 => Arc::new(AesCbcHmacSha2::with_hash(alg, HmacHash::Sha384, rng)),
            A256CbcHs512 => Arc::new(AesCbcHmacSha2::with_hash(alg, HmacHash::Sha512, rng)),
            A128Gcm | A192Gcm | A256Gcm => Arc::new(AesGcm::with_random(alg, rng)),
        }
    }
}

impl Default for AesCryptoSuite {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoSuite for AesCryptoSuite {
    fn name(&self) -> &str {
        "aes"
    }

    fn symmetric_encrypters(&self) -> SymmetricEncrypterMap {
        let map: SymmetricEncrypterMap = SymmetricAlgorithm::ALL
            .into_iter()
            .map(|alg| (alg.as_str().to_string(), self.encrypter(alg)))
            .collect();
        debug!(suite = self.name(), count = map.len(), "symmetric encrypters built");
        map
    }
}
