//! Per-record field encryption.
//!
//! A [`SensitiveRecord`] carries its own random record key, wrapped under the
//! master key. Fields are encrypted with the record key and stored on the
//! record as `encrypted_<field_name>`. The record id and field name are bound
//! as associated data, so a ciphertext copied onto another record or field
//! fails to decrypt.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

use crate::cipher::{self, IV_SIZE, TAG_SIZE};
use crate::error::{CipherError, CipherResult};
use crate::key::{AesKey, MasterKey};

/// Prefix of the stored column name for an encrypted field.
pub const FIELD_PREFIX: &str = "encrypted_";

/// Record-level columns a field column must never shadow.
const RESERVED_COLUMNS: [&str; 2] = ["id", "encrypted_aes_key"];

/// Associated data for wrapped record keys.
const WRAP_AAD: &[u8] = b"phimask.record-key.v1";

/// An encrypted field value: base64 ciphertext (tag included) and the
/// base64 IV it was produced with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    pub ciphertext: String,
    pub iv: String,
}

/// A record key encrypted under the master key, stored as base64 of
/// `iv || ciphertext`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrappedKey(String);

impl WrappedKey {
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored record whose sensitive fields are encrypted.
///
/// Serializes flat: `id`, `encrypted_aes_key` and one
/// `encrypted_<field>` object per field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_aes_key: Option<WrappedKey>,
    #[serde(flatten)]
    fields: BTreeMap<String, EncryptedField>,
}

impl SensitiveRecord {
    /// A new record with a freshly provisioned record key.
    pub fn new(id: impl Into<String>, cipher: &FieldCipher) -> CipherResult<Self> {
        Ok(Self {
            id: id.into(),
            encrypted_aes_key: Some(cipher.generate_wrapped_key()?),
            fields: BTreeMap::new(),
        })
    }

    /// A record with no key material yet.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            encrypted_aes_key: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, field_name: &str) -> Option<&EncryptedField> {
        self.fields.get(&column_name(field_name))
    }

    /// Names of the encrypted fields, without the `encrypted_` prefix.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .keys()
            .filter_map(|k| k.strip_prefix(FIELD_PREFIX))
    }

    /// Store `field` as `field_name`. Names whose column would shadow a
    /// record-level column (`aes_key`) are refused.
    pub fn set_field(&mut self, field_name: &str, field: EncryptedField) -> CipherResult<()> {
        let column = checked_column_name(field_name)?;
        self.fields.insert(column, field);
        Ok(())
    }

    pub fn remove_field(&mut self, field_name: &str) -> Option<EncryptedField> {
        self.fields.remove(&column_name(field_name))
    }
}

/// The stored column name for `field_name`.
pub fn column_name(field_name: &str) -> String {
    format!("{FIELD_PREFIX}{field_name}")
}

fn checked_column_name(field_name: &str) -> CipherResult<String> {
    let column = column_name(field_name);
    if field_name.is_empty() || RESERVED_COLUMNS.contains(&column.as_str()) {
        return Err(CipherError::InvalidFieldName(field_name.to_string()));
    }
    Ok(column)
}

/// Encrypts and decrypts record fields under one master key.
#[derive(Debug, Clone)]
pub struct FieldCipher {
    master: MasterKey,
}

impl FieldCipher {
    pub fn new(master: MasterKey) -> Self {
        Self { master }
    }

    /// A fresh random record key, wrapped under the master key.
    pub fn generate_wrapped_key(&self) -> CipherResult<WrappedKey> {
        wrap(&self.master, &AesKey::generate())
    }

    /// Encrypt `plaintext` into `record` as `field_name`, replacing any
    /// previous value.
    pub fn encrypt_field(
        &self,
        record: &mut SensitiveRecord,
        field_name: &str,
        plaintext: &str,
    ) -> CipherResult<EncryptedField> {
        checked_column_name(field_name)?;
        let wrapped = record_key(record)?;
        let field = self.encrypt_with_key(wrapped, &record.id, field_name, plaintext)?;
        record.set_field(field_name, field.clone())?;
        Ok(field)
    }

    pub fn decrypt_field(&self, record: &SensitiveRecord, field_name: &str) -> CipherResult<String> {
        let wrapped = record_key(record)?;
        let field = record.field(field_name).ok_or_else(|| {
            CipherError::MissingKeyMaterial(format!(
                "record {} has no field {field_name}",
                record.id
            ))
        })?;
        self.decrypt_with_key(wrapped, &record.id, field_name, field)
    }

    pub fn encrypt_with_key(
        &self,
        wrapped: &WrappedKey,
        record_id: &str,
        field_name: &str,
        plaintext: &str,
    ) -> CipherResult<EncryptedField> {
        let key = unwrap(&self.master, wrapped)?;
        let iv = cipher::random_iv();
        let ciphertext = cipher::seal(
            &key,
            &iv,
            plaintext.as_bytes(),
            &field_aad(record_id, field_name),
        )?;

        debug!(record_id, field_name, bytes = plaintext.len(), "field encrypted");

        Ok(EncryptedField {
            ciphertext: STANDARD.encode(ciphertext),
            iv: STANDARD.encode(iv),
        })
    }

    pub fn decrypt_with_key(
        &self,
        wrapped: &WrappedKey,
        record_id: &str,
        field_name: &str,
        field: &EncryptedField,
    ) -> CipherResult<String> {
        if field.iv.is_empty() {
            return Err(CipherError::MissingKeyMaterial(format!(
                "field {field_name} of record {record_id} has no IV"
            )));
        }

        let key = unwrap(&self.master, wrapped)?;
        let iv = decode_iv(&field.iv)?;
        let ciphertext = STANDARD
            .decode(&field.ciphertext)
            .map_err(|e| CipherError::DecryptFailure(format!("invalid ciphertext base64: {e}")))?;
        if ciphertext.len() < TAG_SIZE {
            return Err(CipherError::DecryptFailure(
                "ciphertext shorter than the authentication tag".to_string(),
            ));
        }

        let plaintext = cipher::open(&key, &iv, &ciphertext, &field_aad(record_id, field_name))
            .ok_or_else(|| {
                CipherError::DecryptFailure(format!(
                    "field {field_name} of record {record_id} failed authentication"
                ))
            })?;

        debug!(record_id, field_name, "field decrypted");

        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            CipherError::DecryptFailure("plaintext is not valid UTF-8".to_string())
        })
    }

    /// Re-wrap the record key under `new_master`. Field ciphertexts are left
    /// as they are; afterwards only a cipher holding `new_master` can read
    /// the record.
    pub fn rewrap_key(&self, record: &mut SensitiveRecord, new_master: &MasterKey) -> CipherResult<()> {
        let key = unwrap(&self.master, record_key(record)?)?;
        record.encrypted_aes_key = Some(wrap(new_master, &key)?);
        debug!(record_id = %record.id, "record key re-wrapped");
        Ok(())
    }
}

fn record_key(record: &SensitiveRecord) -> CipherResult<&WrappedKey> {
    record.encrypted_aes_key.as_ref().ok_or_else(|| {
        CipherError::MissingKeyMaterial(format!("record {} has no encrypted_aes_key", record.id))
    })
}

/// Record id and field name, separated by a byte neither can be confused with.
fn field_aad(record_id: &str, field_name: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(record_id.len() + field_name.len() + 1);
    aad.extend_from_slice(record_id.as_bytes());
    aad.push(0);
    aad.extend_from_slice(field_name.as_bytes());
    aad
}

fn decode_iv(encoded: &str) -> CipherResult<[u8; IV_SIZE]> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| CipherError::DecryptFailure(format!("invalid IV base64: {e}")))?;
    bytes.as_slice().try_into().map_err(|_| {
        CipherError::DecryptFailure(format!("IV must be {IV_SIZE} bytes, got {}", bytes.len()))
    })
}

fn wrap(master: &MasterKey, key: &AesKey) -> CipherResult<WrappedKey> {
    let iv = cipher::random_iv();
    let ciphertext = cipher::seal(&master.key, &iv, key.as_bytes(), WRAP_AAD)?;

    let mut bytes = Vec::with_capacity(IV_SIZE + ciphertext.len());
    bytes.extend_from_slice(&iv);
    bytes.extend_from_slice(&ciphertext);
    Ok(WrappedKey(STANDARD.encode(bytes)))
}

fn unwrap(master: &MasterKey, wrapped: &WrappedKey) -> CipherResult<AesKey> {
    let bytes = STANDARD
        .decode(wrapped.as_str())
        .map_err(|e| CipherError::UnwrapFailure(format!("invalid base64: {e}")))?;
    if bytes.len() < IV_SIZE + TAG_SIZE {
        return Err(CipherError::UnwrapFailure("wrapped key too short".to_string()));
    }

    let (iv, ciphertext) = bytes.split_at(IV_SIZE);
    let iv: [u8; IV_SIZE] = iv
        .try_into()
        .map_err(|_| CipherError::UnwrapFailure("wrapped key too short".to_string()))?;

    let mut raw = cipher::open(&master.key, &iv, ciphertext, WRAP_AAD).ok_or_else(|| {
        CipherError::UnwrapFailure("wrong master key or corrupt wrapped key".to_string())
    })?;
    let key = AesKey::from_slice(&raw).map_err(|e| CipherError::UnwrapFailure(e.to_string()));
    raw.zeroize();
    key
}
