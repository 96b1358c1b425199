//! In-memory platform certificate store.
//!
//! The gateway rotates its signing certificates; every verifiable response
//! names the serial of the certificate that signed it. The store maps serial
//! numbers to decrypted certificates and is replaced wholesale on refresh:
//! readers hold an `Arc` snapshot, so a concurrent refresh can never expose
//! a mix of old and new entries.

use crate::crypto::verify::public_key_from_cert_pem;
use crate::PaywardenError;
use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A decrypted platform certificate ready for signature verification.
#[derive(Debug, Clone)]
pub struct PlatformCertificate {
    /// Serial number, the store key.
    pub serial_no: String,
    /// Decrypted PEM certificate text.
    pub certificate_pem: String,
    /// RSA public key extracted from the certificate at load time.
    pub public_key: RsaPublicKey,
    /// When the certificate becomes valid.
    pub effective_time: DateTime<Utc>,
    /// When the certificate expires.
    pub expire_time: DateTime<Utc>,
}

impl PlatformCertificate {
    /// Build a certificate from decrypted PEM text, parsing the public key
    /// up front so a malformed certificate can never enter the store.
    pub fn new(
        serial_no: String,
        certificate_pem: String,
        effective_time: DateTime<Utc>,
        expire_time: DateTime<Utc>,
    ) -> Result<Self, PaywardenError> {
        let public_key = public_key_from_cert_pem(&certificate_pem)?;
        Ok(Self {
            serial_no,
            certificate_pem,
            public_key,
            effective_time,
            expire_time,
        })
    }
}

/// Serial-number-keyed set of platform certificates, refreshed atomically.
///
/// Owned per client instance, never process-global, so multiple merchant
/// credentials can coexist without cross-contamination.
pub struct CertificateStore {
    current: RwLock<Arc<HashMap<String, PlatformCertificate>>>,
}

impl CertificateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    // A poisoned lock only means a panic elsewhere mid-swap; the map behind
    // the Arc is always a complete generation, so recovery is safe.
    fn snapshot(&self) -> Arc<HashMap<String, PlatformCertificate>> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Look up a certificate by serial number.
    pub fn lookup(&self, serial_no: &str) -> Option<PlatformCertificate> {
        self.snapshot().get(serial_no).cloned()
    }

    /// Whether the store has never been populated (or was refreshed empty).
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Number of certificates in the current generation.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Atomically replace the entire certificate set.
    ///
    /// The new mapping is built completely before a single reference swap;
    /// concurrent refreshes race benignly (snapshots are idempotent,
    /// last write wins).
    pub fn refresh(&self, certificates: Vec<PlatformCertificate>) {
        let next: HashMap<String, PlatformCertificate> = certificates
            .into_iter()
            .map(|cert| (cert.serial_no.clone(), cert))
            .collect();
        let next = Arc::new(next);

        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

impl Default for CertificateStore {
    fn default() -> Self {
        Self::new()
    }
}
