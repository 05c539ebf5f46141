// ============================================
// File: crates/coordnode-core/src/crypto/blockcipher.rs
// ============================================
//! # AES-128-CBC with PKCS#7
//!
//! ## Creation Reason
//! Encrypted application data (mID 0x0A) is protected with AES-128 in
//! CBC mode under the session confidentiality key (SCK).
//!
//! ## Wire Format
//! ```text
//! ┌──────────────┬──────────────────────────────────────┐
//! │   IV (16B)   │  Ciphertext (k × 16B, k >= 1)        │
//! └──────────────┴──────────────────────────────────────┘
//! ```
//! Plaintext always receives 1..=16 bytes of PKCS#7 padding, so an
//! input that is already block-aligned gains a full padding block.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Padding is validated in constant time over the whole final block;
//!   do not replace it with an early-return loop
//! - Structural problems (short input, ragged length) are reported as
//!   `MalformedMessage`, everything padding-related as `BadPadding`
//!
//! ## Last Modified
//! v0.1.0 - Initial CBC implementation

use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater};

use super::keys::SymmetricKey;
use super::BLOCK_SIZE;
use crate::error::{CoreError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

// ============================================
// Public API
// ============================================

/// Encrypts `plaintext` under a fresh random IV.
///
/// Returns `IV || ciphertext`.
#[must_use]
pub fn encrypt_cbc_pkcs7(key: &SymmetricKey, plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; BLOCK_SIZE];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes128CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out
}

/// Decrypts `IV || ciphertext` and strips the PKCS#7 padding.
///
/// # Errors
/// - `MalformedMessage` if the input is shorter than two blocks or the
///   ciphertext is not a whole number of blocks
/// - `BadPadding` if the final block does not carry valid padding
pub fn decrypt_cbc_pkcs7(key: &SymmetricKey, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 * BLOCK_SIZE {
        return Err(CoreError::malformed(format!(
            "ciphertext needs at least {} bytes, got {}",
            2 * BLOCK_SIZE,
            data.len()
        )));
    }
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CoreError::malformed(
            "ciphertext is not a multiple of the block size",
        ));
    }

    let (iv, ciphertext) = data.split_at(BLOCK_SIZE);
    let mut plaintext = decrypt_cbc_raw(key, iv, ciphertext)?;

    let pad = padding_len(&plaintext)?;
    plaintext.truncate(plaintext.len() - pad);
    Ok(plaintext)
}

// ============================================
// Internals
// ============================================

/// Raw CBC decryption without any padding handling.
pub(crate) fn decrypt_cbc_raw(key: &SymmetricKey, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let iv: &[u8; BLOCK_SIZE] = iv
        .try_into()
        .map_err(|_| CoreError::malformed("IV must be one block"))?;

    Aes128CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| CoreError::malformed("ciphertext is not block aligned"))
}

/// Checks the PKCS#7 padding of the final block without branching on
/// secret data and returns the padding length.
#[allow(clippy::cast_possible_truncation)]
fn padding_len(plaintext: &[u8]) -> Result<usize> {
    let Some(last) = plaintext.len().checked_sub(BLOCK_SIZE).map(|at| &plaintext[at..]) else {
        return Err(CoreError::BadPadding);
    };

    let pad = last[BLOCK_SIZE - 1];
    let mut ok: Choice = !pad.ct_eq(&0) & !pad.ct_gt(&(BLOCK_SIZE as u8));

    for (i, byte) in last.iter().enumerate() {
        let from_end = (BLOCK_SIZE - i) as u8;
        let in_pad = !from_end.ct_gt(&pad);
        ok &= !in_pad | byte.ct_eq(&pad);
    }

    if bool::from(ok) {
        Ok(usize::from(pad))
    } else {
        Err(CoreError::BadPadding)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    const NIST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";

    // NIST SP 800-38A F.2.2, one block at a time with the chained IV.
    const NIST_BLOCKS: [(&str, &str, &str); 4] = [
        (
            "000102030405060708090a0b0c0d0e0f",
            "7649abac8119b246cee98e9b12e9197d",
            "6bc1bee22e409f96e93d7e117393172a",
        ),
        (
            "7649abac8119b246cee98e9b12e9197d",
            "5086cb9b507219ee95db113a917678b2",
            "ae2d8a571e03ac9c9eb76fac45af8e51",
        ),
        (
            "5086cb9b507219ee95db113a917678b2",
            "73bed6b8e3c1743b7116e69e22229516",
            "30c81c46a35ce411e5fbc1191a0a52ef",
        ),
        (
            "73bed6b8e3c1743b7116e69e22229516",
            "3ff1caa1681fac09120eca307586e1a7",
            "f69f2445df4f9b17ad2b417be66c3710",
        ),
    ];

    fn nist_key() -> SymmetricKey {
        SymmetricKey::from_slice(&hex::decode(NIST_KEY).unwrap()).unwrap()
    }

    fn encrypt_raw(key: &SymmetricKey, iv: &[u8; BLOCK_SIZE], plaintext: &[u8]) -> Vec<u8> {
        Aes128CbcEnc::new(key.as_bytes().into(), iv.into())
            .encrypt_padded_vec_mut::<NoPadding>(plaintext)
    }

    #[test]
    fn test_nist_vectors_decrypt() {
        let key = nist_key();
        for (iv, ct, pt) in NIST_BLOCKS {
            let out = decrypt_cbc_raw(&key, &hex::decode(iv).unwrap(), &hex::decode(ct).unwrap())
                .unwrap();
            assert_eq!(hex::encode(out), pt);
        }
    }

    #[test]
    fn test_nist_vectors_encrypt() {
        let key = nist_key();
        for (iv, ct, pt) in NIST_BLOCKS {
            let iv: [u8; BLOCK_SIZE] = hex::decode(iv).unwrap().try_into().unwrap();
            let out = encrypt_raw(&key, &iv, &hex::decode(pt).unwrap());
            assert_eq!(hex::encode(out), ct);
        }
    }

    #[test]
    fn test_roundtrip_all_lengths_up_to_two_blocks() {
        let key = SymmetricKey::from_bytes([0x42; 16]);
        for len in 0..=2 * BLOCK_SIZE + 1 {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let sealed = encrypt_cbc_pkcs7(&key, &plaintext);

            let expected_ct = (len / BLOCK_SIZE + 1) * BLOCK_SIZE;
            assert_eq!(sealed.len(), BLOCK_SIZE + expected_ct, "len {len}");
            assert_eq!(decrypt_cbc_pkcs7(&key, &sealed).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let key = SymmetricKey::from_bytes([7; 16]);
        let a = encrypt_cbc_pkcs7(&key, b"same");
        let b = encrypt_cbc_pkcs7(&key, b"same");
        assert_ne!(a[..BLOCK_SIZE], b[..BLOCK_SIZE]);
    }

    #[test]
    fn test_structural_errors_are_malformed() {
        let key = SymmetricKey::from_bytes([7; 16]);
        assert!(matches!(
            decrypt_cbc_pkcs7(&key, &[0u8; 16]),
            Err(CoreError::MalformedMessage { .. })
        ));
        assert!(matches!(
            decrypt_cbc_pkcs7(&key, &[0u8; 40]),
            Err(CoreError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_invalid_padding_rejected() {
        let key = SymmetricKey::from_bytes([9; 16]);
        let iv = [0x11; BLOCK_SIZE];

        let mut zero_pad = [0xaa; BLOCK_SIZE];
        zero_pad[15] = 0x00;

        let mut oversized = [0xaa; BLOCK_SIZE];
        oversized[15] = 0x11;

        let mut inconsistent = [0xaa; BLOCK_SIZE];
        inconsistent[13] = 0x03;
        inconsistent[14] = 0x02;
        inconsistent[15] = 0x03;

        for block in [zero_pad, oversized, inconsistent] {
            let mut sealed = iv.to_vec();
            sealed.extend(encrypt_raw(&key, &iv, &block));
            assert!(matches!(
                decrypt_cbc_pkcs7(&key, &sealed),
                Err(CoreError::BadPadding)
            ));
        }
    }

    #[test]
    fn test_full_block_padding_accepted() {
        let key = SymmetricKey::from_bytes([9; 16]);
        let iv = [0x22; BLOCK_SIZE];

        let mut sealed = iv.to_vec();
        sealed.extend(encrypt_raw(&key, &iv, &[0x10; BLOCK_SIZE]));
        assert!(decrypt_cbc_pkcs7(&key, &sealed).unwrap().is_empty());
    }
}
