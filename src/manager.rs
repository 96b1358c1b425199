//! Pay manager - the main public API for Paywarden.
//!
//! The `PayManager` ties one merchant credential to its signing, transport,
//! and certificate state:
//! - signs outbound requests and builds the authorization header
//! - verifies response signatures against the platform certificate store
//! - fetches, decrypts, and atomically refreshes platform certificates

use crate::client::http::{GatewayClient, GatewayResponse};
use crate::clock::{Clock, SystemClock};
use crate::config::PaywardenConfig;
use crate::crypto::decrypt::decrypt_certificate;
use crate::crypto::message::{path_and_query, CanonicalMessage};
use crate::crypto::pipeline;
use crate::crypto::sign::{load_private_key, sign};
use crate::nonce::{NonceSource, RandomNonceSource};
use crate::protocol::models::{
    gateway_error, parse_certificate_download, CertificateEntry, EncryptedCertificate,
};
use crate::protocol::token::{AuthToken, PaySign, SIGN_TYPE_RSA};
use crate::store::{CertificateStore, PlatformCertificate};
use crate::PaywardenError;
use reqwest::Method;
use rsa::RsaPrivateKey;
use std::sync::Arc;
use tracing::debug;

/// Per-call signature verification mode.
///
/// `Skip` exists for exactly one flow: the certificate bootstrap fetch,
/// which cannot be verified before any certificate is known and is trusted
/// via the TLS channel instead. There is no global toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Verify the response signature (the default).
    Enforce,
    /// Skip verification for this call only.
    Skip,
}

/// Main gateway manager for Paywarden.
///
/// Create one instance per merchant credential and reuse it for all calls.
/// Each instance owns its certificate store, so multiple credentials can
/// coexist in one process without sharing verification state.
pub struct PayManager {
    config: PaywardenConfig,
    private_key: RsaPrivateKey,
    nonce_source: Arc<dyn NonceSource>,
    clock: Arc<dyn Clock>,
    client: GatewayClient,
    store: CertificateStore,
}

impl PayManager {
    /// Create a manager with the given configuration.
    ///
    /// Uses the system clock and the CSPRNG nonce source.
    ///
    /// # Errors
    /// Returns `ConfigError` if validation fails or the private key PEM
    /// does not parse.
    pub fn new(config: PaywardenConfig) -> Result<Self, PaywardenError> {
        Self::with_parts(config, Arc::new(RandomNonceSource), Arc::new(SystemClock))
    }

    /// Create a manager with injected nonce source and clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_seams(
        config: PaywardenConfig,
        nonce_source: Arc<dyn NonceSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PaywardenError> {
        Self::with_parts(config, nonce_source, clock)
    }

    fn with_parts(
        config: PaywardenConfig,
        nonce_source: Arc<dyn NonceSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PaywardenError> {
        config.validate()?;
        let private_key = load_private_key(&config.private_key_pem)?;
        let client = GatewayClient::new()?;

        Ok(Self {
            config,
            private_key,
            nonce_source,
            clock,
            client,
            store: CertificateStore::new(),
        })
    }

    /// Sign an outbound request, producing the auth token for its
    /// authorization header.
    ///
    /// `body` is the JSON body string exactly as it will be sent, or the
    /// empty string for body-less requests.
    pub fn sign_request(
        &self,
        method: &Method,
        url: &str,
        body: &str,
    ) -> Result<AuthToken, PaywardenError> {
        let timestamp = self.clock.epoch_seconds();
        let nonce = self.nonce_source.generate(self.config.nonce_length);
        let path_and_query = path_and_query(url)?;

        let message = CanonicalMessage::Request {
            method: method.as_str(),
            path_and_query: &path_and_query,
            timestamp,
            nonce: &nonce,
            body,
        }
        .canonicalize();

        let signature = sign(&self.private_key, &message)?;

        Ok(AuthToken {
            mch_id: self.config.mch_id.clone(),
            nonce,
            timestamp,
            serial_no: self.config.serial_no.clone(),
            signature,
        })
    }

    /// Perform a signed, verified gateway call.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
    ) -> Result<GatewayResponse, PaywardenError> {
        self.request_with(method, url, body, VerifyMode::Enforce)
    }

    /// Perform a signed gateway call with an explicit verification mode.
    ///
    /// Non-2xx statuses are mapped to [`PaywardenError::Gateway`]. Responses
    /// without a JSON content type (bill downloads) are returned raw and
    /// skip verification regardless of mode.
    pub fn request_with(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        verify: VerifyMode,
    ) -> Result<GatewayResponse, PaywardenError> {
        let token = self.sign_request(&method, url, body.unwrap_or(""))?;
        debug!(%method, url, "gateway request");

        let response = self
            .client
            .send(method, url, &token.header_value(), body)?;

        if !response.is_success() {
            return Err(gateway_error(response.status, &response.body));
        }

        if verify == VerifyMode::Skip {
            debug!(url, "verification skipped for this call");
            return Ok(response);
        }

        if !response.is_json() {
            debug!(url, "non-JSON response, skipping verification");
            return Ok(response);
        }

        self.verify_response(&response)?;
        Ok(response)
    }

    /// Verify a response's signature against the platform certificate store.
    ///
    /// If the store has never been populated, a single certificate refresh
    /// is attempted before failing with `CertificateNotFound`.
    pub fn verify_response(&self, response: &GatewayResponse) -> Result<(), PaywardenError> {
        pipeline::verify_response(response, &self.store, || self.refresh_certificates())
    }

    /// Fetch the current platform certificates, decrypt each payload, and
    /// atomically replace the store contents.
    ///
    /// The fetch itself runs with `VerifyMode::Skip`: it bootstraps the very
    /// certificates verification needs, and is trusted via TLS.
    pub fn refresh_certificates(&self) -> Result<(), PaywardenError> {
        let url = self.client.certificates_url();
        let response = self.request_with(Method::GET, &url, None, VerifyMode::Skip)?;
        let download = parse_certificate_download(&response.body)?;
        self.refresh_from_entries(download.data)
    }

    /// Decrypt an already-fetched certificate list and atomically replace
    /// the store contents.
    ///
    /// Useful when the fetch is performed by an external transport; a
    /// failing entry aborts the refresh and leaves the prior generation
    /// in place.
    pub fn refresh_from_entries(
        &self,
        entries: Vec<CertificateEntry>,
    ) -> Result<(), PaywardenError> {
        let mut certificates = Vec::with_capacity(entries.len());
        for entry in entries {
            let pem = decrypt_certificate(
                self.config.api_v3_key_bytes(),
                &entry.encrypt_certificate,
            )?;
            certificates.push(PlatformCertificate::new(
                entry.serial_no,
                pem,
                entry.effective_time,
                entry.expire_time,
            )?);
        }

        debug!(count = certificates.len(), "refreshed platform certificates");
        self.store.refresh(certificates);
        Ok(())
    }

    /// Decrypt a single encrypted certificate payload with the APIv3 key.
    pub fn decrypt_certificate(
        &self,
        payload: &EncryptedCertificate,
    ) -> Result<String, PaywardenError> {
        decrypt_certificate(self.config.api_v3_key_bytes(), payload)
    }

    /// Produce the signed pay-sign payload for a prepay id, for the
    /// front-end JSAPI/APP payment call.
    pub fn pay_sign(&self, prepay_id: &str) -> Result<PaySign, PaywardenError> {
        let timestamp = self.clock.epoch_seconds();
        let nonce = self.nonce_source.generate(self.config.nonce_length);

        let message = CanonicalMessage::PaySign {
            app_id: &self.config.app_id,
            timestamp,
            nonce: &nonce,
            prepay_id,
            trade_type: self.config.trade_type,
        }
        .canonicalize();

        let signature = sign(&self.private_key, &message)?;

        Ok(PaySign {
            app_id: self.config.app_id.clone(),
            timestamp,
            nonce_str: nonce,
            sign_type: SIGN_TYPE_RSA,
            pay_sign: signature,
        })
    }

    /// Read access to the platform certificate store.
    pub fn certificates(&self) -> &CertificateStore {
        &self.store
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PaywardenConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::config::TradeType;
    use crate::crypto::decrypt::encrypt_certificate_for_tests;
    use crate::crypto::testkeys;
    use crate::crypto::verify::verify;
    use crate::nonce::FixedNonceSource;
    use chrono::Utc;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};

    const API_V3_KEY: &str = "0123456789abcdef0123456789abcdef";

    fn test_config() -> PaywardenConfig {
        PaywardenConfig {
            app_id: "wx1".to_string(),
            mch_id: "1900000001".to_string(),
            serial_no: "MCHSERIAL01".to_string(),
            private_key_pem: testkeys::rsa_2048()
                .to_pkcs8_pem(LineEnding::LF)
                .unwrap()
                .to_string(),
            api_v3_key: API_V3_KEY.to_string(),
            trade_type: TradeType::Jsapi,
            nonce_length: 3,
        }
    }

    fn seamed_manager(config: PaywardenConfig) -> PayManager {
        PayManager::new_with_seams(
            config,
            Arc::new(FixedNonceSource::new("abc")),
            Arc::new(MockClock::at_epoch(1_700_000_000)),
        )
        .unwrap()
    }

    #[test]
    fn manager_creation() {
        assert!(PayManager::new(test_config()).is_ok());
    }

    #[test]
    fn manager_rejects_invalid_config() {
        let mut config = test_config();
        config.mch_id.clear();
        assert!(matches!(
            PayManager::new(config),
            Err(PaywardenError::ConfigError(_))
        ));
    }

    #[test]
    fn manager_rejects_bad_private_key() {
        let mut config = test_config();
        config.private_key_pem = "garbage".to_string();
        assert!(matches!(
            PayManager::new(config),
            Err(PaywardenError::ConfigError(_))
        ));
    }

    #[test]
    fn sign_request_token_fields() {
        let manager = seamed_manager(test_config());
        let token = manager
            .sign_request(&Method::GET, "https://host/v3/path?query=1", "")
            .unwrap();

        assert_eq!(token.mch_id, "1900000001");
        assert_eq!(token.nonce, "abc");
        assert_eq!(token.timestamp, 1_700_000_000);
        assert_eq!(token.serial_no, "MCHSERIAL01");
    }

    #[test]
    fn sign_request_signature_covers_canonical_message() {
        let manager = seamed_manager(test_config());
        let token = manager
            .sign_request(&Method::GET, "https://host/v3/path?query=1", "")
            .unwrap();

        let expected_message = b"GET\n/v3/path?query=1\n1700000000\nabc\n\n";
        let public_key = testkeys::rsa_2048().to_public_key();
        assert!(verify(&public_key, expected_message, &token.signature).is_ok());
    }

    #[test]
    fn sign_request_rejects_bad_url() {
        let manager = seamed_manager(test_config());
        let result = manager.sign_request(&Method::GET, "not a url", "");
        assert!(matches!(result, Err(PaywardenError::ProtocolError(_))));
    }

    #[test]
    fn pay_sign_jsapi_regression() {
        let manager = seamed_manager(test_config());
        let pay_sign = manager.pay_sign("up_1").unwrap();

        assert_eq!(pay_sign.app_id, "wx1");
        assert_eq!(pay_sign.timestamp, 1_700_000_000);
        assert_eq!(pay_sign.nonce_str, "abc");
        assert_eq!(pay_sign.sign_type, "RSA");

        // Signature over exactly the JSAPI pay-sign form.
        let expected_message = b"wx1\n1700000000\nabc\nprepay_id=up_1\n";
        let public_key = testkeys::rsa_2048().to_public_key();
        assert!(verify(&public_key, expected_message, &pay_sign.pay_sign).is_ok());

        // PKCS#1 v1.5 is deterministic: same key, clock, and nonce always
        // reproduce the same signature.
        let again = seamed_manager(test_config()).pay_sign("up_1").unwrap();
        assert_eq!(again.pay_sign, pay_sign.pay_sign);
    }

    #[test]
    fn pay_sign_app_form() {
        let mut config = test_config();
        config.trade_type = TradeType::App;
        let manager = seamed_manager(config);
        let pay_sign = manager.pay_sign("up_1").unwrap();

        let expected_message = b"wx1\n1700000000\nabc\nup_1\n";
        let public_key = testkeys::rsa_2048().to_public_key();
        assert!(verify(&public_key, expected_message, &pay_sign.pay_sign).is_ok());
    }

    #[test]
    fn verify_response_against_populated_store() {
        let manager = seamed_manager(test_config());
        manager.certificates().refresh(vec![PlatformCertificate {
            serial_no: "PLAT01".to_string(),
            certificate_pem: String::new(),
            public_key: testkeys::rsa_2048().to_public_key(),
            effective_time: Utc::now(),
            expire_time: Utc::now(),
        }]);

        let body = br#"{"code":"SUCCESS"}"#;
        let message = CanonicalMessage::Verify {
            timestamp: "1700000000",
            nonce: "respnonce",
            body,
        }
        .canonicalize();
        let signature = sign(testkeys::rsa_2048(), &message).unwrap();

        let response = GatewayResponse {
            status: 200,
            timestamp: Some("1700000000".to_string()),
            nonce: Some("respnonce".to_string()),
            serial: Some("PLAT01".to_string()),
            signature: Some(signature),
            content_type: Some("application/json".to_string()),
            body: body.to_vec(),
        };

        assert!(manager.verify_response(&response).is_ok());
    }

    #[test]
    fn refresh_from_entries_end_to_end() {
        // Encrypted cert payload -> AEAD decrypt -> X.509 parse -> store,
        // then a signed response verifies against the stored key.
        let manager = seamed_manager(test_config());
        let key: &[u8; 32] = API_V3_KEY.as_bytes().try_into().unwrap();
        let pem = testkeys::certificate_pem();
        let payload = encrypt_certificate_for_tests(key, "abcdef123456", "certificate", &pem);

        let entry = CertificateEntry {
            serial_no: "PLAT01".to_string(),
            effective_time: Utc::now(),
            expire_time: Utc::now(),
            encrypt_certificate: payload,
        };

        manager.refresh_from_entries(vec![entry]).unwrap();
        assert_eq!(manager.certificates().len(), 1);

        let body = br#"{"code":"SUCCESS"}"#;
        let message = CanonicalMessage::Verify {
            timestamp: "1700000000",
            nonce: "respnonce",
            body,
        }
        .canonicalize();
        let signature = sign(testkeys::rsa_2048(), &message).unwrap();

        let response = GatewayResponse {
            status: 200,
            timestamp: Some("1700000000".to_string()),
            nonce: Some("respnonce".to_string()),
            serial: Some("PLAT01".to_string()),
            signature: Some(signature),
            content_type: Some("application/json".to_string()),
            body: body.to_vec(),
        };
        assert!(manager.verify_response(&response).is_ok());
    }

    #[test]
    fn refresh_from_entries_bad_payload_keeps_prior_generation() {
        let manager = seamed_manager(test_config());
        manager.certificates().refresh(vec![PlatformCertificate {
            serial_no: "KEEP".to_string(),
            certificate_pem: String::new(),
            public_key: testkeys::rsa_2048().to_public_key(),
            effective_time: Utc::now(),
            expire_time: Utc::now(),
        }]);

        let entry = CertificateEntry {
            serial_no: "BAD".to_string(),
            effective_time: Utc::now(),
            expire_time: Utc::now(),
            encrypt_certificate: EncryptedCertificate {
                algorithm: "AEAD_AES_256_GCM".to_string(),
                associated_data: "certificate".to_string(),
                ciphertext: "!!!".to_string(),
                nonce: "abcdef123456".to_string(),
            },
        };

        let result = manager.refresh_from_entries(vec![entry]);
        assert!(matches!(result, Err(PaywardenError::DecryptionError(_))));
        assert!(manager.certificates().lookup("KEEP").is_some());
    }

    #[test]
    fn decrypt_certificate_roundtrip() {
        let manager = seamed_manager(test_config());
        let key: &[u8; 32] = API_V3_KEY.as_bytes().try_into().unwrap();
        let payload =
            encrypt_certificate_for_tests(key, "abcdef123456", "certificate", "PEM TEXT");

        assert_eq!(manager.decrypt_certificate(&payload).unwrap(), "PEM TEXT");
    }

    #[test]
    fn config_accessor_redacts_nothing_needed() {
        let manager = seamed_manager(test_config());
        assert_eq!(manager.config().app_id, "wx1");
    }
}
