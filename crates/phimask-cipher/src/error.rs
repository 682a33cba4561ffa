//! Error types for field encryption.

use thiserror::Error;

pub type CipherResult<T> = Result<T, CipherError>;

/// Data-integrity failures. None of these are transient; retrying will not
/// help.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The record has no wrapped key, or the field or its IV is absent.
    #[error("missing key material: {0}")]
    MissingKeyMaterial(String),

    /// The wrapped record key could not be unwrapped (wrong master key or
    /// corrupt wrapper).
    #[error("failed to unwrap record key: {0}")]
    UnwrapFailure(String),

    /// Tag mismatch, corrupt ciphertext, or an IV that does not belong to
    /// the ciphertext.
    #[error("decryption failed: {0}")]
    DecryptFailure(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// A field name whose column collides with a record-level column.
    #[error("field name {0:?} is reserved")]
    InvalidFieldName(String),

    /// Key bytes of the wrong size or encoding.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}
