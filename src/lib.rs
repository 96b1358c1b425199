//! # Paywarden
//!
//! **Hardened WeChat Pay v3 API authentication for Rust.**
//!
//! Paywarden signs outbound gateway calls with the merchant's RSA key and
//! **cryptographically verifies** every response against the gateway's
//! rotating platform certificates, preventing MITM attacks and spoofed
//! gateway responses.
//!
//! ## Features
//!
//! - **RSA-SHA256 request signing** — `WECHATPAY2-SHA256-RSA2048` auth
//!   tokens built from byte-exact canonical messages
//! - **Response signature verification** — every JSON response is checked
//!   against the platform certificate named by its `wechatpay-serial` header
//! - **AES-256-GCM certificate decryption** — rotating platform certificates
//!   are decrypted under the merchant APIv3 key, tag-authenticated
//! - **Atomic certificate refresh** — readers see a complete certificate
//!   generation, never a partial one
//! - **Fail-closed security** — missing signature headers cause rejection,
//!   not bypass
//!
//! ## Quickstart
//!
//! ```no_run
//! use paywarden::{PayManager, PaywardenConfig, TradeType};
//!
//! fn main() -> Result<(), paywarden::PaywardenError> {
//!     let config = PaywardenConfig {
//!         app_id: "wx8888888888888888".to_string(),
//!         mch_id: "1900000001".to_string(),
//!         serial_no: "your-merchant-cert-serial".to_string(),
//!         private_key_pem: std::fs::read_to_string("apiclient_key.pem")
//!             .expect("merchant private key"),
//!         api_v3_key: "your-32-byte-apiv3-key-goes-here".to_string(),
//!         trade_type: TradeType::Jsapi,
//!         ..Default::default()
//!     };
//!
//!     let manager = PayManager::new(config)?;
//!     manager.refresh_certificates()?;
//!
//!     let response = manager.request(
//!         reqwest::Method::GET,
//!         "https://api.mch.weixin.qq.com/v3/pay/transactions/id/42?mchid=1900000001",
//!         None,
//!     )?;
//!     println!("verified response: {}", response.body_str()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Paywarden protects against:
//! - **MITM attacks** — spoofed gateway responses are rejected (signature
//!   mismatch against the platform certificate)
//! - **Tampered certificates** — certificate payloads are AEAD-authenticated;
//!   a flipped bit fails decryption, never yields silent garbage
//! - **Accidental verification bypass** — skipping is per call
//!   ([`VerifyMode::Skip`]), used only for the certificate bootstrap fetch
//!
//! Paywarden does **not** verify that the gateway generates unique AEAD
//! nonces per key; that is the gateway's obligation and an accepted trust
//! boundary. Transport-level retries and certificate persistence across
//! restarts are the caller's concern.
//!
//! ## Configuration
//!
//! - `mch_id` / `app_id` — merchant and application ids from the gateway
//! - `serial_no` — serial of the merchant's own API certificate
//! - `private_key_pem` — merchant RSA-2048 key (PKCS#8 or PKCS#1 PEM)
//! - `api_v3_key` — 32-byte symmetric key for certificate decryption
//!
//! See [`PaywardenConfig`] for full documentation.

#![deny(warnings)]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/paywarden/0.1.0")]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;
pub mod nonce;

// Crypto layer
pub mod crypto;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Certificate store
pub mod store;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use client::http::{GatewayClient, GatewayResponse};
pub use clock::{Clock, SystemClock};
pub use config::{PaywardenConfig, TradeType};
pub use errors::PaywardenError;
pub use manager::{PayManager, VerifyMode};
pub use nonce::{NonceSource, RandomNonceSource, DEFAULT_NONCE_LENGTH};
pub use protocol::models::{CertificateDownload, CertificateEntry, EncryptedCertificate};
pub use protocol::token::{AuthToken, PaySign};
pub use store::{CertificateStore, PlatformCertificate};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-seams"))]
pub use nonce::FixedNonceSource;
