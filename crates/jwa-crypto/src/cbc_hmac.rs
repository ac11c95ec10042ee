//! AES-CBC-HMAC-SHA2 composite AEAD (A128CBC-HS256, A192CBC-HS384, A256CBC-HS512)
//!
//! Encrypt-then-MAC, RFC 7518 §5.2:
//! ```text
//! key        = MAC_KEY || ENC_KEY          (each key_bits / 8 bytes)
//! ciphertext = AES-CBC(ENC_KEY, IV, PKCS#7(plaintext))   IV = 128 bits
//! tag        = truncate(HMAC-SHA2(MAC_KEY, AAD || IV || ciphertext || AL), key_bits / 8)
//! ```
//!
//! Decryption verifies the tag in constant time before any block is deciphered,
//! so padding errors are never observable without a valid tag.

use std::sync::Arc;

use aes::cipher::{
    block_padding::Pkcs7, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit,
};
use aes::{Aes128, Aes192, Aes256};
use jwa_core::{JwaError, JwaResult};
use tracing::debug;
use zeroize::Zeroizing;

use crate::algorithm::SymmetricAlgorithm;
use crate::keys::{split_composite_key, SymmetricKey};
use crate::random::{byte_len, generate_iv, generate_key, SecureRandom};
use crate::suite::{AeadResult, SymmetricEncrypter};
use crate::tag::{compute_tag, verify_tag, HmacHash};
use crate::{AES_BLOCK_SIZE, CBC_IV_BITS};

/// One AES-CBC-HMAC-SHA2 variant.
pub struct AesCbcHmacSha2 {
    algorithm: SymmetricAlgorithm,
    key_bits: usize,
    hash: HmacHash,
    rng: Arc<dyn SecureRandom>,
}

impl AesCbcHmacSha2 {
    pub fn new(algorithm: SymmetricAlgorithm, rng: Arc<dyn SecureRandom>) -> JwaResult<Self> {
        let hash_bits = algorithm
            .hash_bits()
            .ok_or_else(|| JwaError::UnsupportedAlgorithm(format!("{algorithm} is not CBC-HMAC")))?;
        Ok(Self::with_hash(algorithm, HmacHash::from_bits(hash_bits)?, rng))
    }

    pub(crate) fn with_hash(
        algorithm: SymmetricAlgorithm,
        hash: HmacHash,
        rng: Arc<dyn SecureRandom>,
    ) -> Self {
        Self {
            algorithm,
            key_bits: algorithm.key_bits(),
            hash,
            rng,
        }
    }

    fn cbc_encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> JwaResult<Vec<u8>> {
        match self.key_bits {
            128 => cbc_encrypt::<Aes128>(key, iv, plaintext),
            192 => cbc_encrypt::<Aes192>(key, iv, plaintext),
            256 => cbc_encrypt::<Aes256>(key, iv, plaintext),
            other => Err(JwaError::UnsupportedAlgorithm(format!("AES-{other}-CBC"))),
        }
    }

    fn cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> JwaResult<Vec<u8>> {
        if iv.len() != byte_len(CBC_IV_BITS) {
            return Err(JwaError::MalformedCiphertext(format!(
                "IV must be {} bytes, got {}",
                byte_len(CBC_IV_BITS),
                iv.len()
            )));
        }
        if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
            return Err(JwaError::MalformedCiphertext(format!(
                "ciphertext length {} is not a positive multiple of {AES_BLOCK_SIZE}",
                ciphertext.len()
            )));
        }
        match self.key_bits {
            128 => cbc_decrypt::<Aes128>(key, iv, ciphertext),
            192 => cbc_decrypt::<Aes192>(key, iv, ciphertext),
            256 => cbc_decrypt::<Aes256>(key, iv, ciphertext),
            other => Err(JwaError::UnsupportedAlgorithm(format!("AES-{other}-CBC"))),
        }
    }
}

impl SymmetricEncrypter for AesCbcHmacSha2 {
    fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> JwaResult<AeadResult> {
        let mac_key = generate_key(self.rng.as_ref(), self.key_bits)?;
        let enc_key = generate_key(self.rng.as_ref(), self.key_bits)?;
        let iv = generate_iv(self.rng.as_ref(), CBC_IV_BITS)?;

        let ciphertext = self.cbc_encrypt(enc_key.as_bytes(), &iv, plaintext)?;
        let tag = compute_tag(
            self.hash,
            self.key_bits,
            mac_key.as_bytes(),
            aad,
            &iv,
            &ciphertext,
        )?;

        Ok(AeadResult {
            ciphertext,
            iv,
            key: SymmetricKey::concat(&mac_key, &enc_key),
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
        let (mac_key, enc_key) = split_composite_key(key, self.key_bits)?;

        // Any failure while computing the expected tag counts as an authentication failure.
        let expected = compute_tag(self.hash, self.key_bits, mac_key, aad, iv, ciphertext)
            .map_err(|_| JwaError::AuthenticationFailure)?;
        if let Err(e) = verify_tag(&expected, tag) {
            debug!(alg = %self.algorithm, "tag verification failed");
            return Err(e);
        }

        self.cbc_decrypt(enc_key, iv, ciphertext)
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> JwaResult<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(|_| {
        JwaError::InvalidKeyMaterial {
            expected: C::key_size(),
            actual: key.len(),
        }
    })?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> JwaResult<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(|_| {
        JwaError::InvalidKeyMaterial {
            expected: C::key_size(),
            actual: key.len(),
        }
    })?;
    // Deciphered blocks are wiped even when unpadding fails.
    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    let plaintext = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|_| JwaError::MalformedCiphertext("invalid PKCS#7 padding".into()))?;
    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{OsRandom, ReplayRandom};
    use proptest::prelude::*;

    const COMPOSITE: [SymmetricAlgorithm; 3] = [
        SymmetricAlgorithm::A128CbcHs256,
        SymmetricAlgorithm::A192CbcHs384,
        SymmetricAlgorithm::A256CbcHs512,
    ];

    // RFC 7518 Appendix B shared inputs
    const P: &[u8] = b"A cipher system must not be required to be secret, and it must be able to fall into the hands of the enemy without inconvenience";
    const A: &[u8] = b"The second principle of Auguste Kerckhoffs";
    const IV: &str = "1af38c2dc2b96ffdd86694092341bc04";

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn engine(alg: SymmetricAlgorithm) -> AesCbcHmacSha2 {
        AesCbcHmacSha2::new(alg, Arc::new(OsRandom)).unwrap()
    }

    /// (algorithm, E, T) from RFC 7518 B.1, B.2, B.3. K is 00 01 02 .. of the combined length.
    fn rfc7518_vectors() -> Vec<(SymmetricAlgorithm, Vec<u8>, Vec<u8>)> {
        vec![
            (
                SymmetricAlgorithm::A128CbcHs256,
                hex("c80edfa32ddf39d5ef00c0b468834279a2e46a1b8049f792f76bfe54b903a9c9a94ac9b47ad2655c5f10f9aef71427e2fc6f9b3f399a221489f16362c703233609d45ac69864e3321cf82935ac4096c86e133314c54019e8ca7980dfa4b9cf1b384c486f3a54c51078158ee5d79de59fbd34d848b3d69550a67646344427ade54b8851ffb598f7f80074b9473c82e2db"),
                hex("652c3fa36b0a7c5b3219fab3a30bc1c4"),
            ),
            (
                SymmetricAlgorithm::A192CbcHs384,
                hex("ea65da6b59e61edb419be62d19712ae5d303eeb50052d0dfd6697f77224c8edb000d279bdc14c1072654bd30944230c657bed4ca0c9f4a8466f22b226d1746214bf8cfc2400add9f5126e479663fc90b3bed787a2f0ffcbf3904be2a641d5c2105bfe591bae23b1d7449e532eef60a9ac8bb6c6b01d35d49787bcd57ef484927f280adc91ac0c4e79c7b11efc60054e3"),
                hex("8490ac0e58949bfe51875d733f93ac2075168039ccc733d7"),
            ),
            (
                SymmetricAlgorithm::A256CbcHs512,
                hex("4affaaadb78c31c5da4b1b590d10ffbd3dd8d5d302423526912da037ecbcc7bd822c301dd67c373bccb584ad3e9279c2e6d12a1374b77f077553df829410446b36ebd97066296ae6427ea75c2e0846a11a09ccf5370dc80bfecbad28c73f09b3a3b75e662a2594410ae496b2e2e6609e31e6e02cc837f053d21f37ff4f51950bbe2638d09dd7a4930930806d0703b1f6"),
                hex("4dd3b4c088a7f45c216839645b2012bf2e6269a8c56a816dbc1b267761955bc5"),
            ),
        ]
    }

    fn rfc_key(alg: SymmetricAlgorithm) -> Vec<u8> {
        (0..alg.key_len()).map(|i| i as u8).collect()
    }

    #[test]
    fn test_rfc7518_encrypt_vectors() {
        for (alg, e, t) in rfc7518_vectors() {
            let mut stream = rfc_key(alg);
            stream.extend_from_slice(&hex(IV));
            let engine = AesCbcHmacSha2::new(alg, Arc::new(ReplayRandom::new(&stream))).unwrap();

            let out = engine.encrypt(P, A).unwrap();
            assert_eq!(out.ciphertext, e, "{alg} ciphertext");
            assert_eq!(out.tag, t, "{alg} tag");
            assert_eq!(out.iv, hex(IV));
            assert_eq!(out.key.as_bytes(), rfc_key(alg).as_slice());
        }
    }

    #[test]
    fn test_rfc7518_decrypt_vectors() {
        for (alg, e, t) in rfc7518_vectors() {
            let plaintext = engine(alg)
                .decrypt(&e, A, &hex(IV), &rfc_key(alg), &t)
                .unwrap();
            assert_eq!(plaintext, P, "{alg}");
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        for alg in COMPOSITE {
            let e = engine(alg);
            let out = e.encrypt(b"hello, composite world!", b"header").unwrap();
            let pt = e
                .decrypt(&out.ciphertext, b"header", &out.iv, out.key.as_bytes(), &out.tag)
                .unwrap();
            assert_eq!(pt, b"hello, composite world!");
        }
    }

    #[test]
    fn test_output_sizes() {
        for alg in COMPOSITE {
            let out = engine(alg).encrypt(&[0u8; 20], b"").unwrap();
            assert_eq!(out.iv.len(), 16, "{alg}");
            assert_eq!(out.key.len(), alg.key_len(), "{alg}");
            assert_eq!(out.tag.len(), alg.key_bits() / 8, "{alg}");
            // 20 bytes pads to two blocks
            assert_eq!(out.ciphertext.len(), 32, "{alg}");
        }
    }

    #[test]
    fn test_empty_plaintext_is_one_padding_block() {
        let e = engine(SymmetricAlgorithm::A128CbcHs256);
        let out = e.encrypt(b"", b"").unwrap();
        assert_eq!(out.ciphertext.len(), 16);
        let pt = e
            .decrypt(&out.ciphertext, b"", &out.iv, out.key.as_bytes(), &out.tag)
            .unwrap();
        assert!(pt.is_empty());
    }

    #[test]
    fn test_fresh_key_and_iv_per_call() {
        let e = engine(SymmetricAlgorithm::A256CbcHs512);
        let a = e.encrypt(b"same", b"").unwrap();
        let b = e.encrypt(b"same", b"").unwrap();
        assert_ne!(a.key.as_bytes(), b.key.as_bytes());
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_a256_scenario_59_bytes_and_corrupt_first_byte() {
        let plaintext = b"The quick brown fox jumps over the lazy dog, twice as fast.";
        assert_eq!(plaintext.len(), 59);

        let e = engine(SymmetricAlgorithm::A256CbcHs512);
        let mut out = e.encrypt(plaintext, b"").unwrap();
        let pt = e
            .decrypt(&out.ciphertext, b"", &out.iv, out.key.as_bytes(), &out.tag)
            .unwrap();
        assert_eq!(pt, plaintext);

        out.ciphertext[0] ^= 0x01;
        let err = e
            .decrypt(&out.ciphertext, b"", &out.iv, out.key.as_bytes(), &out.tag)
            .unwrap_err();
        assert!(matches!(err, JwaError::AuthenticationFailure));
    }

    #[test]
    fn test_key_length_off_by_one() {
        for alg in COMPOSITE {
            let e = engine(alg);
            let out = e.encrypt(b"payload", b"aad").unwrap();

            let mut long = out.key.as_bytes().to_vec();
            long.push(0);
            let short = &out.key.as_bytes()[..out.key.len() - 1];

            for key in [long.as_slice(), short] {
                let err = e
                    .decrypt(&out.ciphertext, b"aad", &out.iv, key, &out.tag)
                    .unwrap_err();
                assert!(
                    matches!(err, JwaError::InvalidKeyMaterial { .. }),
                    "{alg}: {err:?}"
                );
            }
        }
    }

    #[test]
    fn test_swapped_key_halves_fail_auth() {
        let e = engine(SymmetricAlgorithm::A192CbcHs384);
        let out = e.encrypt(b"payload", b"").unwrap();
        let (mac, enc) = out.key.as_bytes().split_at(24);
        let swapped = [enc, mac].concat();
        let err = e
            .decrypt(&out.ciphertext, b"", &out.iv, &swapped, &out.tag)
            .unwrap_err();
        assert!(matches!(err, JwaError::AuthenticationFailure));
    }

    #[test]
    fn test_truncated_tag_fails_auth() {
        let e = engine(SymmetricAlgorithm::A128CbcHs256);
        let out = e.encrypt(b"payload", b"").unwrap();
        let err = e
            .decrypt(&out.ciphertext, b"", &out.iv, out.key.as_bytes(), &out.tag[..15])
            .unwrap_err();
        assert!(matches!(err, JwaError::AuthenticationFailure));
    }

    #[test]
    fn test_misaligned_ciphertext_with_valid_tag_is_malformed() {
        // A key holder can produce a valid tag over garbage; the cipher step must then reject it.
        let alg = SymmetricAlgorithm::A128CbcHs256;
        let key = [4u8; 32];
        let iv = [0u8; 16];
        let ciphertext = [1u8; 17];
        let tag = compute_tag(HmacHash::Sha256, 128, &key[..16], b"", &iv, &ciphertext).unwrap();

        let err = engine(alg)
            .decrypt(&ciphertext, b"", &iv, &key, &tag)
            .unwrap_err();
        assert!(matches!(err, JwaError::MalformedCiphertext(_)));
    }

    #[test]
    fn test_short_iv_with_valid_tag_is_malformed() {
        let alg = SymmetricAlgorithm::A128CbcHs256;
        let key = [4u8; 32];
        let iv = [0u8; 15];
        let ciphertext = [1u8; 16];
        let tag = compute_tag(HmacHash::Sha256, 128, &key[..16], b"", &iv, &ciphertext).unwrap();

        let err = engine(alg)
            .decrypt(&ciphertext, b"", &iv, &key, &tag)
            .unwrap_err();
        assert!(
            matches!(err, JwaError::MalformedCiphertext(ref m) if m == "IV must be 16 bytes, got 15"),
            "{err:?}"
        );

        // without a valid tag the IV is never looked at
        let err = engine(alg)
            .decrypt(&ciphertext, b"", &[], &key, &[])
            .unwrap_err();
        assert!(matches!(err, JwaError::AuthenticationFailure));
    }

    #[test]
    fn test_bad_padding_with_valid_tag_is_malformed() {
        for alg in COMPOSITE {
            let half = alg.key_bits() / 8;
            let key: Vec<u8> = (0..alg.key_len()).map(|i| i as u8).collect();
            let iv = [7u8; 16];

            // a final plaintext byte of 0x00 is never valid PKCS#7
            let block = [0u8; 16];
            let ciphertext = match alg.key_bits() {
                128 => raw_cbc_encrypt::<Aes128>(&key[half..], &iv, &block),
                192 => raw_cbc_encrypt::<Aes192>(&key[half..], &iv, &block),
                _ => raw_cbc_encrypt::<Aes256>(&key[half..], &iv, &block),
            };
            let hash = HmacHash::from_bits(alg.hash_bits().unwrap()).unwrap();
            let tag = compute_tag(hash, alg.key_bits(), &key[..half], b"", &iv, &ciphertext).unwrap();

            let err = engine(alg)
                .decrypt(&ciphertext, b"", &iv, &key, &tag)
                .unwrap_err();
            assert!(
                matches!(err, JwaError::MalformedCiphertext(ref m) if m.contains("padding")),
                "{alg}: {err:?}"
            );
        }
    }

    fn raw_cbc_encrypt<C>(key: &[u8], iv: &[u8], block: &[u8; 16]) -> Vec<u8>
    where
        C: BlockEncryptMut + BlockCipher + KeyInit,
    {
        use aes::cipher::block_padding::NoPadding;
        cbc::Encryptor::<C>::new_from_slices(key, iv)
            .unwrap()
            .encrypt_padded_vec_mut::<NoPadding>(block)
    }

    #[test]
    fn test_gcm_algorithm_rejected() {
        assert!(matches!(
            AesCbcHmacSha2::new(SymmetricAlgorithm::A128Gcm, Arc::new(OsRandom)),
            Err(JwaError::UnsupportedAlgorithm(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn roundtrip_any_input(
            idx in 0usize..3,
            plaintext in proptest::collection::vec(any::<u8>(), 0..=512),
            aad in proptest::collection::vec(any::<u8>(), 0..=64),
        ) {
            let e = engine(COMPOSITE[idx]);
            let out = e.encrypt(&plaintext, &aad).unwrap();
            let pt = e.decrypt(&out.ciphertext, &aad, &out.iv, out.key.as_bytes(), &out.tag).unwrap();
            prop_assert_eq!(pt, plaintext);
        }

        #[test]
        fn any_single_bit_flip_fails_auth(
            idx in 0usize..3,
            plaintext in proptest::collection::vec(any::<u8>(), 0..=128),
            aad in proptest::collection::vec(any::<u8>(), 1..=32),
            field in 0usize..4,
            pos in any::<usize>(),
            bit in 0u8..8,
        ) {
            let e = engine(COMPOSITE[idx]);
            let out = e.encrypt(&plaintext, &aad).unwrap();
            let (mut ct, mut aad2, mut iv, mut tag) =
                (out.ciphertext.clone(), aad.clone(), out.iv.clone(), out.tag.clone());
            let target = match field {
                0 => &mut ct,
                1 => &mut aad2,
                2 => &mut iv,
                _ => &mut tag,
            };
            let i = pos % target.len();
            target[i] ^= 1 << bit;

            let result = e.decrypt(&ct, &aad2, &iv, out.key.as_bytes(), &tag);
            prop_assert!(matches!(result, Err(JwaError::AuthenticationFailure)));
        }
    }
}
