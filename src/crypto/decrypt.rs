//! AES-256-GCM decryption of platform certificate payloads.
//!
//! The gateway delivers rotating platform certificates encrypted under the
//! merchant's APIv3 key. Each payload carries the AEAD nonce and associated
//! data alongside the base64 ciphertext, with the 16-byte auth tag appended
//! to the ciphertext body.
//!
//! Nonce uniqueness per key is the gateway's obligation; the client cannot
//! verify it and trusts the gateway on this point.

use crate::protocol::models::EncryptedCertificate;
use crate::PaywardenError;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};

/// The only AEAD algorithm the gateway issues certificates under.
pub const AEAD_ALGORITHM: &str = "AEAD_AES_256_GCM";

/// Size of the APIv3 key in bytes.
const KEY_SIZE: usize = 32;

/// Size of the AEAD nonce in bytes (96 bits for GCM).
const NONCE_SIZE: usize = 12;

/// Size of the authentication tag appended to the ciphertext.
const TAG_SIZE: usize = 16;

/// Decrypt an encrypted certificate payload into PEM text.
///
/// Pure function of its inputs; safe to call concurrently. Any failure —
/// wrong key length, wrong nonce length, tag mismatch from a tampered
/// ciphertext or associated data — is a [`PaywardenError::DecryptionError`].
/// Corrupted plaintext is never returned silently.
pub fn decrypt_certificate(
    key: &[u8],
    payload: &EncryptedCertificate,
) -> Result<String, PaywardenError> {
    if payload.algorithm != AEAD_ALGORITHM {
        return Err(PaywardenError::DecryptionError(format!(
            "unsupported algorithm: {}",
            payload.algorithm
        )));
    }

    if key.len() != KEY_SIZE {
        return Err(PaywardenError::DecryptionError(format!(
            "APIv3 key must be {} bytes, got {}",
            KEY_SIZE,
            key.len()
        )));
    }

    let nonce_bytes = payload.nonce.as_bytes();
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(PaywardenError::DecryptionError(format!(
            "nonce must be {} bytes, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        )));
    }

    let ciphertext = STANDARD
        .decode(&payload.ciphertext)
        .map_err(|e| PaywardenError::DecryptionError(format!("invalid ciphertext base64: {}", e)))?;

    if ciphertext.len() < TAG_SIZE {
        return Err(PaywardenError::DecryptionError(
            "ciphertext shorter than auth tag".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| PaywardenError::DecryptionError(e.to_string()))?;

    // The aes-gcm crate consumes body‖tag directly, matching the gateway's
    // layout of the tag appended to the ciphertext.
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: &ciphertext,
                aad: payload.associated_data.as_bytes(),
            },
        )
        .map_err(|_| {
            PaywardenError::DecryptionError("authentication tag mismatch".to_string())
        })?;

    String::from_utf8(plaintext)
        .map_err(|e| PaywardenError::DecryptionError(format!("plaintext is not UTF-8: {}", e)))
}

/// Build an encrypted payload the way the gateway would; test-only inverse
/// of [`decrypt_certificate`].
#[cfg(test)]
pub(crate) fn encrypt_certificate_for_tests(
    key: &[u8; 32],
    nonce: &str,
    aad: &str,
    plaintext: &str,
) -> EncryptedCertificate {
    let cipher = Aes256Gcm::new_from_slice(key).unwrap();
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(nonce.as_bytes()),
            Payload {
                msg: plaintext.as_bytes(),
                aad: aad.as_bytes(),
            },
        )
        .unwrap();

    EncryptedCertificate {
        algorithm: AEAD_ALGORITHM.to_string(),
        associated_data: aad.to_string(),
        ciphertext: STANDARD.encode(ciphertext),
        nonce: nonce.to_string(),
    }
}
