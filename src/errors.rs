//! Paywarden error types.

use thiserror::Error;

/// Errors that can occur while signing requests or verifying responses.
#[derive(Debug, Error)]
pub enum PaywardenError {
    /// Configuration is invalid (malformed key or certificate at load time).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The merchant private key could not be used for signing.
    #[error("Request signing failed: {0}")]
    SigningError(String),

    /// Certificate payload decryption failed (tag mismatch or bad key/nonce).
    #[error("Certificate decryption failed: {0}")]
    DecryptionError(String),

    /// No platform certificate matches the response serial number.
    #[error("No platform certificate for serial {serial}")]
    CertificateNotFound {
        /// The serial number the response claimed to be signed with.
        serial: String,
    },

    /// Response signature verification failed (possible tampering/MITM).
    #[error("Response signature verification failed")]
    SignatureMismatch,

    /// Required response signature headers are missing (fail-closed).
    #[error("Response signature headers missing")]
    SignatureMissing,

    /// Malformed wire data: bad base64, bad JSON, bad URL, invalid UTF-8.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// HTTP transport error communicating with the gateway.
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The gateway rejected the request with an error envelope.
    #[error("Gateway returned {status}: {code}: {message}")]
    Gateway {
        /// HTTP status code.
        status: u16,
        /// Gateway error code (e.g. `PARAM_ERROR`), `UNKNOWN` if unparseable.
        code: String,
        /// Human-readable gateway message.
        message: String,
        /// Optional structured detail from the error envelope.
        detail: Option<serde_json::Value>,
    },
}
