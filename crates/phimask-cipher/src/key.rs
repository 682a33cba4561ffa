//! Key types.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CipherError, CipherResult};

/// Size of AES-256 keys in bytes.
pub const KEY_SIZE: usize = 32;

/// Raw AES-256 key bytes, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct AesKey {
    bytes: [u8; KEY_SIZE],
}

impl AesKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub(crate) fn from_slice(bytes: &[u8]) -> CipherResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CipherError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    pub(crate) fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The process-wide key that wraps every record key.
#[derive(Clone, Debug)]
pub struct MasterKey {
    pub(crate) key: AesKey,
}

impl MasterKey {
    pub fn generate() -> Self {
        Self {
            key: AesKey::generate(),
        }
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self {
            key: AesKey::from_bytes(bytes),
        }
    }

    /// Decode a standard-base64 key of exactly [`KEY_SIZE`] bytes.
    pub fn from_base64(encoded: &str) -> CipherResult<Self> {
        let mut bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::InvalidKey(format!("invalid base64: {e}")))?;
        let key = AesKey::from_slice(&bytes);
        bytes.zeroize();
        Ok(Self { key: key? })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key.as_bytes())
    }
}
