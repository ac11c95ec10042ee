//! HMAC-SHA2 authentication tags for the AES-CBC-HMAC-SHA2 composite construction
//!
//! Tag input (RFC 7518 §5.2.2.1):
//! ```text
//! MAC input = AAD || IV || ciphertext || AL
//! AL        = bit length of AAD as a 64-bit big-endian integer
//! tag       = first ceil(key_bits / 8) bytes of HMAC-SHA2(mac_key, MAC input)
//! ```

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use jwa_core::{JwaError, JwaResult};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::random::byte_len;

/// The SHA-2 member keyed into HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacHash {
    Sha256,
    Sha384,
    Sha512,
}

impl HmacHash {
    pub fn from_bits(bits: usize) -> JwaResult<Self> {
        match bits {
            256 => Ok(Self::Sha256),
            384 => Ok(Self::Sha384),
            512 => Ok(Self::Sha512),
            other => Err(JwaError::UnsupportedAlgorithm(format!("HMAC-SHA{other}"))),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// 8-byte AL block: the AAD length in bits, high 32 bits first.
pub fn aad_length_block(aad_len: usize) -> [u8; 8] {
    let bits = (aad_len as u64).wrapping_mul(8);
    let high = (bits >> 32) as u32;
    let low = (bits & 0xFFFF_FFFF) as u32;

    let mut al = [0u8; 8];
    al[..4].copy_from_slice(&high.to_be_bytes());
    al[4..].copy_from_slice(&low.to_be_bytes());
    al
}

/// Full (untruncated) HMAC over the concatenation of `parts`.
pub fn hmac_sha2(hash: HmacHash, key: &[u8], parts: &[&[u8]]) -> JwaResult<Vec<u8>> {
    match hash {
        HmacHash::Sha256 => mac_parts::<Hmac<Sha256>>(key, parts),
        HmacHash::Sha384 => mac_parts::<Hmac<Sha384>>(key, parts),
        HmacHash::Sha512 => mac_parts::<Hmac<Sha512>>(key, parts),
    }
}

fn mac_parts<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> JwaResult<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|e| JwaError::Other(anyhow::anyhow!("HMAC key rejected: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Compute the truncated composite tag over AAD, IV and ciphertext.
pub fn compute_tag(
    hash: HmacHash,
    key_bits: usize,
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> JwaResult<Vec<u8>> {
    let al = aad_length_block(aad.len());
    let mut tag = hmac_sha2(hash, mac_key, &[aad, iv, ciphertext, &al])?;
    tag.truncate(byte_len(key_bits));
    Ok(tag)
}

/// Constant-time, length-checked comparison of a computed tag against a supplied one.
pub fn verify_tag(expected: &[u8], supplied: &[u8]) -> JwaResult<()> {
    // ct_eq on slices yields false for unequal lengths without inspecting contents
    if bool::from(expected.ct_eq(supplied)) {
        Ok(())
    } else {
        Err(JwaError::AuthenticationFailure)
    }
}
