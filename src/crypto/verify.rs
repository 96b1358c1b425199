//! RSA-SHA256 response signature verification.

use crate::PaywardenError;
use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use x509_cert::der::{DecodePem, Encode};
use x509_cert::Certificate;

/// Extract the RSA public key from a PEM-encoded platform certificate.
///
/// Platform certificates arrive as decrypted X.509 PEM text. A certificate
/// that does not parse, or whose subject key is not RSA, is a load-time
/// failure: it must never be inserted into the certificate store.
pub fn public_key_from_cert_pem(pem: &str) -> Result<RsaPublicKey, PaywardenError> {
    let certificate = Certificate::from_pem(pem.as_bytes())
        .map_err(|e| PaywardenError::ConfigError(format!("Invalid platform certificate: {}", e)))?;

    let spki_der = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| {
            PaywardenError::ConfigError(format!("Invalid certificate public key: {}", e))
        })?;

    RsaPublicKey::from_public_key_der(&spki_der).map_err(|e| {
        PaywardenError::ConfigError(format!("Certificate key is not RSA: {}", e))
    })
}

/// Verify a base64 RSA-SHA256 signature over a canonical message.
///
/// Returns [`PaywardenError::SignatureMismatch`] when the signature does not
/// match; malformed base64 is a [`PaywardenError::ProtocolError`].
pub fn verify(
    key: &RsaPublicKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<(), PaywardenError> {
    let signature = STANDARD
        .decode(signature_b64)
        .map_err(|e| PaywardenError::ProtocolError(format!("Invalid signature base64: {}", e)))?;

    let digest = Sha256::digest(message);

    key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
        .map_err(|_| PaywardenError::SignatureMismatch)
}
