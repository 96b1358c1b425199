//! Gateway wire structs and envelope parsing.

use crate::PaywardenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope returned by `GET /v3/certificates`.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateDownload {
    /// One entry per currently-valid platform certificate.
    pub data: Vec<CertificateEntry>,
}

/// A single platform certificate as delivered on the wire, still encrypted.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateEntry {
    /// Serial number identifying the certificate.
    pub serial_no: String,
    /// When the certificate becomes valid.
    pub effective_time: DateTime<Utc>,
    /// When the certificate expires.
    pub expire_time: DateTime<Utc>,
    /// The encrypted certificate payload.
    pub encrypt_certificate: EncryptedCertificate,
}

/// Encrypted certificate payload: AES-256-GCM under the merchant APIv3 key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedCertificate {
    /// AEAD algorithm name, `AEAD_AES_256_GCM`.
    pub algorithm: String,
    /// Additional authenticated data, UTF-8.
    pub associated_data: String,
    /// Base64 ciphertext with the 16-byte tag appended.
    pub ciphertext: String,
    /// 12-byte UTF-8 string used as the AEAD IV.
    pub nonce: String,
}

/// Error envelope the gateway returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorBody {
    /// Machine-readable error code, e.g. `PARAM_ERROR`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail (field-level validation info).
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

/// Parse a certificate download envelope.
pub fn parse_certificate_download(body: &[u8]) -> Result<CertificateDownload, PaywardenError> {
    serde_json::from_slice(body).map_err(|e| {
        PaywardenError::ProtocolError(format!("Invalid certificate download: {}", e))
    })
}

/// Map a non-2xx response body to a [`PaywardenError::Gateway`].
///
/// Bodies that are not a parseable error envelope still surface the status,
/// with code `UNKNOWN`.
pub fn gateway_error(status: u16, body: &[u8]) -> PaywardenError {
    match serde_json::from_slice::<GatewayErrorBody>(body) {
        Ok(envelope) => PaywardenError::Gateway {
            status,
            code: envelope.code,
            message: envelope.message,
            detail: envelope.detail,
        },
        Err(_) => PaywardenError::Gateway {
            status,
            code: "UNKNOWN".to_string(),
            message: String::from_utf8_lossy(body).into_owned(),
            detail: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWNLOAD: &str = r#"{
        "data": [
            {
                "serial_no": "5157F09EFDC096DE15EBE81A47057A7232F1B8E1",
                "effective_time": "2021-06-08T10:34:56+08:00",
                "expire_time": "2026-06-08T10:34:56+08:00",
                "encrypt_certificate": {
                    "algorithm": "AEAD_AES_256_GCM",
                    "associated_data": "certificate",
                    "ciphertext": "Zm9vYmFy",
                    "nonce": "abcdef123456"
                }
            }
        ]
    }"#;

    #[test]
    fn parse_certificate_download_valid() {
        let download = parse_certificate_download(DOWNLOAD.as_bytes()).unwrap();
        assert_eq!(download.data.len(), 1);

        let entry = &download.data[0];
        assert_eq!(entry.serial_no, "5157F09EFDC096DE15EBE81A47057A7232F1B8E1");
        assert_eq!(entry.encrypt_certificate.algorithm, "AEAD_AES_256_GCM");
        assert_eq!(entry.encrypt_certificate.nonce, "abcdef123456");
        // +08:00 offsets normalize to UTC
        assert_eq!(entry.effective_time.to_rfc3339(), "2021-06-08T02:34:56+00:00");
    }

    #[test]
    fn parse_certificate_download_empty_list() {
        let download = parse_certificate_download(br#"{"data": []}"#).unwrap();
        assert!(download.data.is_empty());
    }

    #[test]
    fn parse_certificate_download_malformed() {
        let result = parse_certificate_download(b"not json");
        assert!(matches!(result, Err(PaywardenError::ProtocolError(_))));
    }

    #[test]
    fn gateway_error_parses_envelope() {
        let body = br#"{"code":"PARAM_ERROR","message":"invalid mchid","detail":{"field":"mchid"}}"#;
        let error = gateway_error(400, body);

        match error {
            PaywardenError::Gateway {
                status,
                code,
                message,
                detail,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "PARAM_ERROR");
                assert_eq!(message, "invalid mchid");
                assert!(detail.is_some());
            }
            other => panic!("expected Gateway error, got {:?}", other),
        }
    }

    #[test]
    fn gateway_error_unparseable_body_falls_back() {
        let error = gateway_error(502, b"Bad Gateway");

        match error {
            PaywardenError::Gateway { status, code, .. } => {
                assert_eq!(status, 502);
                assert_eq!(code, "UNKNOWN");
            }
            other => panic!("expected Gateway error, got {:?}", other),
        }
    }
}
