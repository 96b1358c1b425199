//! Verification pipeline composing all response checks.
//!
//! The unified flow:
//! 1. Require the `wechatpay-*` signature headers (fail-closed)
//! 2. Build the verify-form canonical message over the raw body bytes
//! 3. Select the platform certificate by serial, lazily refreshing an
//!    empty store exactly once
//! 4. Verify the RSA-SHA256 signature

use crate::client::http::GatewayResponse;
use crate::crypto::message::CanonicalMessage;
use crate::crypto::verify::verify;
use crate::store::CertificateStore;
use crate::PaywardenError;
use tracing::{debug, warn};

/// Verify a gateway response's authenticity.
///
/// `refresh` is invoked at most once, and only when the serial lookup misses
/// against a store that has never been populated. An unknown serial against
/// a populated store fails immediately; certificate rotation mid-life is the
/// owning client's job via an explicit refresh.
///
/// # Errors
/// * `SignatureMissing` - any required `wechatpay-*` header absent
/// * `CertificateNotFound` - no certificate for the response serial, even
///   after the one lazy refresh
/// * `SignatureMismatch` - certificate found, signature invalid (treat as a
///   potential tampering/MITM event)
pub fn verify_response<F>(
    response: &GatewayResponse,
    store: &CertificateStore,
    refresh: F,
) -> Result<(), PaywardenError>
where
    F: FnOnce() -> Result<(), PaywardenError>,
{
    // 1. Fail-closed on missing signature headers
    let timestamp = response
        .timestamp
        .as_deref()
        .ok_or(PaywardenError::SignatureMissing)?;
    let nonce = response
        .nonce
        .as_deref()
        .ok_or(PaywardenError::SignatureMissing)?;
    let serial = response
        .serial
        .as_deref()
        .ok_or(PaywardenError::SignatureMissing)?;
    let signature = response
        .signature
        .as_deref()
        .ok_or(PaywardenError::SignatureMissing)?;

    // 2. Canonical message over header values verbatim and raw body bytes
    let message = CanonicalMessage::Verify {
        timestamp,
        nonce,
        body: &response.body,
    }
    .canonicalize();

    // 3. Certificate selection, one lazy refresh while the store is empty
    let certificate = match store.lookup(serial) {
        Some(certificate) => certificate,
        None if store.is_empty() => {
            debug!(serial, "certificate store empty, fetching before verification");
            refresh()?;
            store
                .lookup(serial)
                .ok_or_else(|| PaywardenError::CertificateNotFound {
                    serial: serial.to_string(),
                })?
        }
        None => {
            return Err(PaywardenError::CertificateNotFound {
                serial: serial.to_string(),
            })
        }
    };

    // 4. RSA-SHA256 verification
    verify(&certificate.public_key, &message, signature).map_err(|e| {
        warn!(serial, "response signature verification failed");
        e
    })
}
