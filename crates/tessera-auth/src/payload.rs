//! Field-level AES-256-GCM decryption of request payloads.
//!
//! An encrypted field is the string `<base64 iv>:<base64 ciphertext‖tag>`
//! with a 12-byte IV and a 16-byte authentication tag appended to the
//! ciphertext. Payloads are walked structurally: any object key named in
//! the allow-list whose value is a string is replaced by its plaintext.
//! Objects are recursed into, as are objects held directly in arrays.
//! Everything else is left alone.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::AuthError;

pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Parse a 256-bit field key from 64 hex characters.
pub fn parse_field_key(hex_key: &str) -> Result<[u8; 32], AuthError> {
    let bytes = hex::decode(hex_key.trim()).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| AuthError::InvalidKey(format!("expected 32 bytes, got {}", b.len())))
}

/// Encrypt `plaintext` into the `<iv>:<ciphertext‖tag>` wire form with
/// a fresh random IV.
pub fn encrypt_field(key: &[u8; 32], plaintext: &str) -> Result<String, AuthError> {
    let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(*key));
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let sealed = cipher
        .encrypt(&Nonce::from(iv), plaintext.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("AES-GCM encrypt: {e}")))?;

    Ok(format!("{}:{}", STANDARD.encode(iv), STANDARD.encode(sealed)))
}

/// Decrypt a single encrypted field.
pub fn decrypt_field(key: &[u8; 32], encoded: &str) -> Result<String, AuthError> {
    let (iv_b64, sealed_b64) = encoded
        .split_once(':')
        .filter(|(iv, sealed)| !iv.is_empty() && !sealed.is_empty())
        .ok_or_else(|| AuthError::Decryption("Invalid encrypted data format".into()))?;

    let iv: [u8; IV_LEN] = STANDARD
        .decode(iv_b64)
        .map_err(|e| AuthError::Decryption(format!("IV is not base64: {e}")))?
        .try_into()
        .map_err(|_| AuthError::Decryption("Invalid IV length".into()))?;

    let sealed = STANDARD
        .decode(sealed_b64)
        .map_err(|e| AuthError::Decryption(format!("ciphertext is not base64: {e}")))?;
    if sealed.len() < TAG_LEN {
        return Err(AuthError::Decryption("ciphertext too short".into()));
    }

    let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(*key));
    let plaintext = cipher
        .decrypt(&Nonce::from(iv), sealed.as_slice())
        .map_err(|_| AuthError::Decryption("authentication failed".into()))?;

    String::from_utf8(plaintext)
        .map_err(|_| AuthError::Decryption("plaintext is not UTF-8".into()))
}

/// Decrypt every allow-listed field inside `payload`.
///
/// The payload is consumed: on error nothing partially decrypted is
/// handed back.
pub fn decrypt_fields(
    mut payload: Value,
    fields: &[&str],
    key: &[u8; 32],
) -> Result<Value, AuthError> {
    walk(&mut payload, fields, key)?;
    Ok(payload)
}

fn walk(value: &mut Value, fields: &[&str], key: &[u8; 32]) -> Result<(), AuthError> {
    match value {
        Value::Object(map) => {
            for (name, child) in map.iter_mut() {
                match child {
                    Value::String(encoded) if fields.contains(&name.as_str()) => {
                        *encoded = decrypt_field(key, encoded)?;
                    }
                    _ => walk(child, fields, key)?,
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut().filter(|item| item.is_object()) {
                walk(item, fields, key)?;
            }
        }
        _ => {}
    }
    Ok(())
}
