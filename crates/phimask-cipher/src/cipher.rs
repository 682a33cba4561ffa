//! AES-256-GCM with associated data.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::error::{CipherError, CipherResult};
use crate::key::AesKey;

/// Size of the IV in bytes (96 bits for AES-GCM).
pub const IV_SIZE: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A fresh random IV. Never reuse one under the same key.
pub fn random_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` under `key`, authenticating `aad` alongside it.
/// The returned ciphertext includes the tag.
pub(crate) fn seal(
    key: &AesKey,
    iv: &[u8; IV_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> CipherResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .encrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CipherError::Encryption(e.to_string()))
}

/// Decrypt and verify. `None` when the tag does not match, which covers a
/// wrong key, a wrong IV, tampered bytes and mismatched `aad` alike.
pub(crate) fn open(
    key: &AesKey,
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Option<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .ok()
}
