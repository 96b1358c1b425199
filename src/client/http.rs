//! Reqwest-based HTTP transport for the gateway API.
//!
//! This module handles the raw HTTP communication with the gateway,
//! capturing the `wechatpay-*` headers needed for signature verification.

use crate::PaywardenError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use std::time::Duration;

/// Production gateway origin.
pub const DEFAULT_BASE_URL: &str = "https://api.mch.weixin.qq.com";

const HEADER_TIMESTAMP: &str = "wechatpay-timestamp";
const HEADER_NONCE: &str = "wechatpay-nonce";
const HEADER_SERIAL: &str = "wechatpay-serial";
const HEADER_SIGNATURE: &str = "wechatpay-signature";

/// HTTP response with captured headers and raw body.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,

    /// `wechatpay-timestamp` header value.
    pub timestamp: Option<String>,

    /// `wechatpay-nonce` header value.
    pub nonce: Option<String>,

    /// `wechatpay-serial` header value: which platform certificate signed
    /// this response.
    pub serial: Option<String>,

    /// `wechatpay-signature` header value, base64.
    pub signature: Option<String>,

    /// `content-type` header value.
    pub content_type: Option<String>,

    /// Raw response body. Verification runs over these exact bytes.
    pub body: Vec<u8>,
}

impl GatewayResponse {
    /// Extract status, signature headers, and body from a reqwest response.
    fn from_response(response: reqwest::blocking::Response) -> Result<Self, PaywardenError> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        let body = response
            .bytes()
            .map_err(|e| PaywardenError::Transport(format!("Failed to read body: {}", e)))?
            .to_vec();

        Ok(Self {
            status,
            timestamp: header(HEADER_TIMESTAMP),
            nonce: header(HEADER_NONCE),
            serial: header(HEADER_SERIAL),
            signature: header(HEADER_SIGNATURE),
            content_type: header("content-type"),
            body,
        })
    }

    /// Get the body as a UTF-8 string.
    pub fn body_str(&self) -> Result<&str, PaywardenError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| PaywardenError::ProtocolError(format!("Invalid UTF-8 in body: {}", e)))
    }

    /// Whether the response carries a JSON body. Non-JSON responses (bill
    /// downloads) are returned raw and skip signature verification.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false)
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking gateway HTTP client.
pub struct GatewayClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl GatewayClient {
    /// Create a client against the production gateway.
    pub fn new() -> Result<Self, PaywardenError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a custom origin (sandbox or mock gateway).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, PaywardenError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                PaywardenError::Transport(format!("Failed to create client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            user_agent: format!("paywarden/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Set request timeout with fallible construction.
    pub fn try_with_timeout(mut self, timeout: Duration) -> Result<Self, PaywardenError> {
        self.client = Client::builder().timeout(timeout).build().map_err(|e| {
            PaywardenError::ConfigError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(self)
    }

    /// URL of the platform certificate endpoint.
    pub fn certificates_url(&self) -> String {
        format!("{}/v3/certificates", self.base_url)
    }

    /// Perform a signed request and capture the verification headers.
    ///
    /// `authorization` is the full header value including the scheme prefix.
    /// The gateway requires `accept`/`content-type: application/json` and a
    /// User-Agent on every call.
    pub fn send(
        &self,
        method: Method,
        url: &str,
        authorization: &str,
        body: Option<&str>,
    ) -> Result<GatewayResponse, PaywardenError> {
        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent);

        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request
            .send()
            .map_err(|e| PaywardenError::Transport(format!("Request failed: {}", e)))?;

        GatewayResponse::from_response(response)
    }

    /// Get the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
