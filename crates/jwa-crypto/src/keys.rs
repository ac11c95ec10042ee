//! Symmetric key material and composite key splitting

use jwa_core::{JwaError, JwaResult};
use zeroize::Zeroize;

/// Raw symmetric key bytes. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MAC key || encryption key, the combined form returned by the composite engine.
    pub fn concat(mac_key: &SymmetricKey, enc_key: &SymmetricKey) -> Self {
        let mut bytes = Vec::with_capacity(mac_key.len() + enc_key.len());
        bytes.extend_from_slice(mac_key.as_bytes());
        bytes.extend_from_slice(enc_key.as_bytes());
        Self { bytes }
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Split a composite key into (MAC key, encryption key).
///
/// The split happens at `enc_key_bits / 8`, and the key must be exactly twice that long.
pub fn split_composite_key(key: &[u8], enc_key_bits: usize) -> JwaResult<(&[u8], &[u8])> {
    let half = enc_key_bits / 8;
    if key.len() != half * 2 {
        return Err(JwaError::InvalidKeyMaterial {
            expected: half * 2,
            actual: key.len(),
        });
    }
    Ok(key.split_at(half))
}

/// Reject a single (non-composite) key of the wrong length.
pub fn check_key_len(key: &[u8], key_bits: usize) -> JwaResult<()> {
    let expected = key_bits / 8;
    if key.len() != expected {
        return Err(JwaError::InvalidKeyMaterial {
            expected,
            actual: key.len(),
        });
    }
    Ok(())
}
