//! JOSE identifiers for the symmetric AEAD variants

use std::fmt;
use std::str::FromStr;

use jwa_core::JwaError;
use serde::{Deserialize, Serialize};

use crate::{CBC_IV_BITS, GCM_IV_BITS, GCM_TAG_SIZE};

/// One symmetric AEAD variant, named the way JWA names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SymmetricAlgorithm {
    A128CbcHs256,
    A192CbcHs384,
    A256CbcHs512,
    A128Gcm,
    A192Gcm,
    A256Gcm,
}

impl SymmetricAlgorithm {
    pub const ALL: [SymmetricAlgorithm; 6] = [
        Self::A128CbcHs256,
        Self::A192CbcHs384,
        Self::A256CbcHs512,
        Self::A128Gcm,
        Self::A192Gcm,
        Self::A256Gcm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    /// AES key size in bits.
    pub fn key_bits(&self) -> usize {
        match self {
            Self::A128CbcHs256 | Self::A128Gcm => 128,
            Self::A192CbcHs384 | Self::A192Gcm => 192,
            Self::A256CbcHs512 | Self::A256Gcm => 256,
        }
    }

    /// HMAC-SHA2 output size in bits, `None` for GCM.
    pub fn hash_bits(&self) -> Option<usize> {
        match self {
            Self::A128CbcHs256 => Some(256),
            Self::A192CbcHs384 => Some(384),
            Self::A256CbcHs512 => Some(512),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.hash_bits().is_some()
    }

    /// Length of the key handed back by `encrypt`. Composite keys are MAC key || encryption key.
    pub fn key_len(&self) -> usize {
        let enc = self.key_bits() / 8;
        if self.is_composite() {
            enc * 2
        } else {
            enc
        }
    }

    pub fn iv_bits(&self) -> usize {
        if self.is_composite() {
            CBC_IV_BITS
        } else {
            GCM_IV_BITS
        }
    }

    pub fn tag_len(&self) -> usize {
        if self.is_composite() {
            self.key_bits().div_ceil(8)
        } else {
            GCM_TAG_SIZE
        }
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymmetricAlgorithm {
    type Err = JwaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| JwaError::UnsupportedAlgorithm(s.to_string()))
    }
}

impl TryFrom<String> for SymmetricAlgorithm {
    type Error = JwaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SymmetricAlgorithm> for String {
    fn from(alg: SymmetricAlgorithm) -> Self {
        alg.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_identifier() {
        for alg in SymmetricAlgorithm::ALL {
            assert_eq!(alg.as_str().parse::<SymmetricAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn test_parse_unknown_identifier() {
        let err = "A512GCM".parse::<SymmetricAlgorithm>().unwrap_err();
        assert!(matches!(err, JwaError::UnsupportedAlgorithm(ref s) if s == "A512GCM"));
        // identifiers are case-sensitive
        assert!("a128gcm".parse::<SymmetricAlgorithm>().is_err());
    }

    #[test]
    fn test_composite_sizes() {
        let expect = [
            (SymmetricAlgorithm::A128CbcHs256, 32, 16),
            (SymmetricAlgorithm::A192CbcHs384, 48, 24),
            (SymmetricAlgorithm::A256CbcHs512, 64, 32),
        ];
        for (alg, key_len, tag_len) in expect {
            assert_eq!(alg.key_len(), key_len, "{alg}");
            assert_eq!(alg.tag_len(), tag_len, "{alg}");
            assert_eq!(alg.iv_bits(), 128, "{alg}");
        }
    }

    #[test]
    fn test_gcm_sizes() {
        assert_eq!(SymmetricAlgorithm::A128Gcm.key_len(), 16);
        assert_eq!(SymmetricAlgorithm::A192Gcm.key_len(), 24);
        assert_eq!(SymmetricAlgorithm::A256Gcm.key_len(), 32);
        assert_eq!(SymmetricAlgorithm::A256Gcm.iv_bits(), 96);
        assert_eq!(SymmetricAlgorithm::A256Gcm.tag_len(), 16);
    }

    #[test]
    fn test_serde_as_jose_string() {
        let json = serde_json::to_string(&SymmetricAlgorithm::A192CbcHs384).unwrap();
        assert_eq!(json, "\"A192CBC-HS384\"");

        let parsed: SymmetricAlgorithm = serde_json::from_str("\"A128GCM\"").unwrap();
        assert_eq!(parsed, SymmetricAlgorithm::A128Gcm);
        assert!(serde_json::from_str::<SymmetricAlgorithm>("\"RSA-OAEP\"").is_err());
    }
}
