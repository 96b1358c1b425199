//! Authorization token and pay-sign assembly.

use serde::Serialize;

/// Authorization scheme name prefixed to the rendered token.
pub const AUTH_SCHEME: &str = "WECHATPAY2-SHA256-RSA2048";

/// Signature algorithm name reported in pay-sign payloads.
pub const SIGN_TYPE_RSA: &str = "RSA";

/// The signed authorization token carried on every outbound request.
///
/// Field order and quoting of the rendered form are fixed by the gateway's
/// authorization scheme.
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Merchant id.
    pub mch_id: String,
    /// Request nonce, also part of the signed canonical message.
    pub nonce: String,
    /// Epoch seconds, also part of the signed canonical message.
    pub timestamp: i64,
    /// Serial number of the merchant API certificate.
    pub serial_no: String,
    /// Base64 RSA-SHA256 signature over the canonical request message.
    pub signature: String,
}

impl AuthToken {
    /// Render the token body, exactly:
    /// `mchid="…",nonce_str="…",timestamp="…",serial_no="…",signature="…"`.
    pub fn render(&self) -> String {
        format!(
            r#"mchid="{}",nonce_str="{}",timestamp="{}",serial_no="{}",signature="{}""#,
            self.mch_id, self.nonce, self.timestamp, self.serial_no, self.signature
        )
    }

    /// Full `authorization` header value, scheme prefix included.
    pub fn header_value(&self) -> String {
        format!("{} {}", AUTH_SCHEME, self.render())
    }
}

/// Signed payload handed to the front-end JSAPI/APP payment call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaySign {
    /// Application id.
    pub app_id: String,
    /// Epoch seconds at signing time.
    pub timestamp: i64,
    /// Pay-sign nonce.
    pub nonce_str: String,
    /// Always `RSA` for the v3 scheme.
    pub sign_type: &'static str,
    /// Base64 RSA-SHA256 signature over the pay-sign canonical message.
    pub pay_sign: String,
}
