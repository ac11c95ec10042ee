//! jwa-crypto: symmetric AEAD algorithms for JOSE, behind a pluggable suite registry
//!
//! ```text
//! caller ── "A256GCM" ──▶ SuiteRegistry ──▶ Arc<dyn SymmetricEncrypter>
//!                            │
//!                            └─ AesCryptoSuite
//!                                 ├── AesCbcHmacSha2  A128CBC-HS256 / A192CBC-HS384 / A256CBC-HS512
//!                                 │     AES-CBC + PKCS#7, then truncated HMAC-SHA2 tag
//!                                 └── AesGcm          A128GCM / A192GCM / A256GCM
//! ```
//!
//! Keys and IVs are generated per encryption call from a [`SecureRandom`]
//! (the OS CSPRNG unless a suite is built with another source). Engines hold no
//! mutable state and can be shared across threads.

pub mod aes_suite;
pub mod algorithm;
pub mod cbc_hmac;
pub mod gcm;
pub mod keys;
pub mod random;
pub mod registry;
pub mod suite;
pub mod tag;

pub use aes_suite::AesCryptoSuite;
pub use algorithm::SymmetricAlgorithm;
pub use cbc_hmac::AesCbcHmacSha2;
pub use gcm::AesGcm;
pub use keys::SymmetricKey;
pub use random::{OsRandom, SecureRandom};
pub use registry::{SuiteRegistry, SuiteRegistryBuilder};
pub use suite::{AeadResult, CryptoSuite, Encrypter, KeyConstructor, Signer, SymmetricEncrypter};

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// CBC initialization vector size (128-bit)
pub const CBC_IV_BITS: usize = 128;

/// GCM initialization vector size (96-bit)
pub const GCM_IV_BITS: usize = 96;

/// Size of a GCM authentication tag in bytes
pub const GCM_TAG_SIZE: usize = 16;
