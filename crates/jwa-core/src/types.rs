use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{JwaError, JwaResult};

/// A JSON Web Key as handed to asymmetric encrypters, signers and key constructors.
pub type Jwk = serde_json::Value;

/// JSON form of an AEAD result: every byte field is unpadded base64url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAead {
    pub alg: String,
    pub ciphertext: String,
    pub iv: String,
    pub key: String,
    pub tag: String,
}

/// Raw bytes recovered from an [`EncodedAead`].
#[derive(Debug)]
pub struct DecodedAead {
    pub alg: String,
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub key: Zeroizing<Vec<u8>>,
    pub tag: Vec<u8>,
}

impl EncodedAead {
    pub fn encode(alg: &str, ciphertext: &[u8], iv: &[u8], key: &[u8], tag: &[u8]) -> Self {
        Self {
            alg: alg.to_string(),
            ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
            iv: URL_SAFE_NO_PAD.encode(iv),
            key: URL_SAFE_NO_PAD.encode(key),
            tag: URL_SAFE_NO_PAD.encode(tag),
        }
    }

    pub fn decode(&self) -> JwaResult<DecodedAead> {
        Ok(DecodedAead {
            alg: self.alg.clone(),
            ciphertext: decode_field("ciphertext", &self.ciphertext)?,
            iv: decode_field("iv", &self.iv)?,
            key: Zeroizing::new(decode_field("key", &self.key)?),
            tag: decode_field("tag", &self.tag)?,
        })
    }
}

fn decode_field(name: &str, value: &str) -> JwaResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| JwaError::Encoding(format!("{name}: {e}")))
}
