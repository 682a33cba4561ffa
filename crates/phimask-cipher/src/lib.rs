//! phimask-cipher
//!
//! Field-level encryption for sensitive record fields.
//!
//! Two tiers of keys:
//!
//! 1. Master key: process-wide, supplied by the operator.
//! 2. Record key: random AES-256 key per record, stored wrapped (encrypted)
//!    under the master key as `encrypted_aes_key`.
//!
//! Each field is encrypted with the record key under a fresh IV, so rotating
//! the master key only re-wraps record keys.

pub mod cipher;
pub mod error;
pub mod field;
pub mod key;

pub use error::{CipherError, CipherResult};
pub use field::{EncryptedField, FieldCipher, SensitiveRecord, WrappedKey};
pub use key::MasterKey;
