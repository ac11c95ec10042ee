//! Secure random material for keys and initialization vectors

use std::sync::Arc;

use jwa_core::{JwaError, JwaResult};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::keys::SymmetricKey;

/// Source of cryptographically secure bytes.
///
/// Engines hold one behind an `Arc` and call it concurrently, so implementations
/// must be thread-safe on their own.
pub trait SecureRandom: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> JwaResult<()>;
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> JwaResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| JwaError::Random(e.to_string()))
    }
}

/// The process-wide default source.
pub fn os_random() -> Arc<dyn SecureRandom> {
    Arc::new(OsRandom)
}

/// Number of bytes needed to hold `bits` bits.
pub fn byte_len(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Generate a fresh symmetric key of `bits` bits.
pub fn generate_key(rng: &dyn SecureRandom, bits: usize) -> JwaResult<SymmetricKey> {
    let mut bytes = vec![0u8; byte_len(bits)];
    rng.fill(&mut bytes)?;
    Ok(SymmetricKey::from_bytes(bytes))
}

/// Generate a fresh initialization vector of `bits` bits.
///
/// Kept apart from [`generate_key`] so keys and IVs can be pinned independently in tests.
pub fn generate_iv(rng: &dyn SecureRandom, bits: usize) -> JwaResult<Vec<u8>> {
    let mut iv = vec![0u8; byte_len(bits)];
    rng.fill(&mut iv)?;
    Ok(iv)
}

/// Replays a fixed byte stream, for pinning keys and IVs in tests.
#[cfg(test)]
pub(crate) struct ReplayRandom {
    stream: std::sync::Mutex<std::collections::VecDeque<u8>>,
}

#[cfg(test)]
impl ReplayRandom {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            stream: std::sync::Mutex::new(bytes.iter().copied().collect()),
        }
    }
}

#[cfg(test)]
impl SecureRandom for ReplayRandom {
    fn fill(&self, dest: &mut [u8]) -> JwaResult<()> {
        let mut stream = self
            .stream
            .lock()
            .map_err(|_| JwaError::Random("replay stream poisoned".into()))?;
        if stream.len() < dest.len() {
            return Err(JwaError::Random("replay stream exhausted".into()));
        }
        for byte in dest.iter_mut() {
            *byte = stream.pop_front().unwrap_or_default();
        }
        Ok(())
    }
}
