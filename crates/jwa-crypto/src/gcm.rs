//! AES-GCM (A128GCM, A192GCM, A256GCM)
//!
//! 96-bit random IV per call, 128-bit tag returned detached from the ciphertext.
//! The mode itself authenticates AAD and ciphertext; a failed check never
//! releases plaintext.

use std::sync::Arc;

use aes::Aes192;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{AeadInPlace, KeyInit, Nonce, Tag};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm as GcmMode};
use jwa_core::{JwaError, JwaResult};
use tracing::debug;
use zeroize::Zeroize;

use crate::algorithm::SymmetricAlgorithm;
use crate::keys::check_key_len;
use crate::random::{byte_len, generate_iv, generate_key, SecureRandom};
use crate::suite::{AeadResult, SymmetricEncrypter};
use crate::{GCM_IV_BITS, GCM_TAG_SIZE};

type Aes192Gcm = GcmMode<Aes192, U12>;

/// One AES-GCM variant.
pub struct AesGcm {
    algorithm: SymmetricAlgorithm,
    key_bits: usize,
    rng: Arc<dyn SecureRandom>,
}

impl AesGcm {
    pub fn new(algorithm: SymmetricAlgorithm, rng: Arc<dyn SecureRandom>) -> JwaResult<Self> {
        if algorithm.is_composite() {
            return Err(JwaError::UnsupportedAlgorithm(format!("{algorithm} is not GCM")));
        }
        Ok(Self::with_random(algorithm, rng))
    }

    /// Caller guarantees `algorithm` is a GCM variant.
    pub(crate) fn with_random(algorithm: SymmetricAlgorithm, rng: Arc<dyn SecureRandom>) -> Self {
        Self {
            algorithm,
            key_bits: algorithm.key_bits(),
            rng,
        }
    }
}

impl SymmetricEncrypter for AesGcm {
    fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> JwaResult<AeadResult> {
        let key = generate_key(self.rng.as_ref(), self.key_bits)?;
        let iv = generate_iv(self.rng.as_ref(), GCM_IV_BITS)?;

        let (ciphertext, tag) = match self.key_bits {
            128 => gcm_seal::<Aes128Gcm>(key.as_bytes(), &iv, plaintext, aad)?,
            192 => gcm_seal::<Aes192Gcm>(key.as_bytes(), &iv, plaintext, aad)?,
            256 => gcm_seal::<Aes256Gcm>(key.as_bytes(), &iv, plaintext, aad)?,
            other => return Err(JwaError::UnsupportedAlgorithm(format!("AES-{other}-GCM"))),
        };

        Ok(AeadResult {
            ciphertext,
            iv,
            key,
            tag,
        })
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        iv: &[u8],
        key: &[u8],
        tag: &[u8],
    ) -> JwaResult<Vec<u8>> {
        check_key_len(key, self.key_bits)?;
        if iv.len() != byte_len(GCM_IV_BITS) {
            return Err(JwaError::MalformedCiphertext(format!(
                "IV must be {} bytes, got {}",
                byte_len(GCM_IV_BITS),
                iv.len()
            )));
        }
        if tag.len() != GCM_TAG_SIZE {
            debug!(alg = %self.algorithm, len = tag.len(), "tag has wrong length");
            return Err(JwaError::AuthenticationFailure);
        }

        let result = match self.key_bits {
            128 => gcm_open::<Aes128Gcm>(key, iv, ciphertext, aad, tag),
            192 => gcm_open::<Aes192Gcm>(key, iv, ciphertext, aad, tag),
            256 => gcm_open::<Aes256Gcm>(key, iv, ciphertext, aad, tag),
            other => return Err(JwaError::UnsupportedAlgorithm(format!("AES-{other}-GCM"))),
        };
        if matches!(result, Err(JwaError::AuthenticationFailure)) {
            debug!(alg = %self.algorithm, "tag verification failed");
        }
        result
    }
}

/// Caller guarantees `iv` is 12 bytes.
fn gcm_seal<C>(key: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8]) -> JwaResult<(Vec<u8>, Vec<u8>)>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|_| JwaError::InvalidKeyMaterial {
        expected: C::key_size(),
        actual: key.len(),
    })?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<C>::from_slice(iv), aad, &mut buffer)
        .map_err(|e| JwaError::Other(anyhow::anyhow!("AES-GCM encryption failed: {e}")))?;
    Ok((buffer, tag.to_vec()))
}

/// Caller guarantees `iv` is 12 bytes and `tag` is 16 bytes.
fn gcm_open<C>(key: &[u8], iv: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8]) -> JwaResult<Vec<u8>>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|_| JwaError::InvalidKeyMaterial {
        expected: C::key_size(),
        actual: key.len(),
    })?;
    let mut buffer = ciphertext.to_vec();
    if cipher
        .decrypt_in_place_detached(
            Nonce::<C>::from_slice(iv),
            aad,
            &mut buffer,
            Tag::<C>::from_slice(tag),
        )
        .is_err()
    {
        buffer.zeroize();
        return Err(JwaError::AuthenticationFailure);
    }
    Ok(buffer)
}
