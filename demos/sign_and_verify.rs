//! Signed gateway call walkthrough.
//!
//! This demo signs a transaction query, prints the authorization header,
//! refreshes the platform certificates, and performs a verified call.
//!
//! # Running
//!
//! ```bash
//! export WECHATPAY_KEY_PATH="/path/to/apiclient_key.pem"
//! export WECHATPAY_API_V3_KEY="your-32-byte-apiv3-key"
//! cargo run --example sign_and_verify
//! ```
//!
//! # Note
//!
//! `mch_id`, `app_id`, and `serial_no` are merchant constants; only the key
//! material should come from protected storage.

use paywarden::{PayManager, PaywardenConfig, PaywardenError, TradeType};

const APP_ID: &str = "wx8888888888888888";
const MCH_ID: &str = "1900000001";
const MCH_SERIAL: &str = "1DDE55AD98ED71D6EDD4A4A16996DE7B47773A8C";

fn main() {
    let key_path =
        std::env::var("WECHATPAY_KEY_PATH").expect("Set WECHATPAY_KEY_PATH environment variable");
    let api_v3_key = std::env::var("WECHATPAY_API_V3_KEY")
        .expect("Set WECHATPAY_API_V3_KEY environment variable");

    let config = PaywardenConfig {
        app_id: APP_ID.to_string(),
        mch_id: MCH_ID.to_string(),
        serial_no: MCH_SERIAL.to_string(),
        private_key_pem: std::fs::read_to_string(&key_path).expect("read merchant private key"),
        api_v3_key,
        trade_type: TradeType::Jsapi,
        ..Default::default()
    };

    let manager = match PayManager::new(config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Sign without sending, just to show the header.
    let url = format!(
        "https://api.mch.weixin.qq.com/v3/pay/transactions/id/42?mchid={}",
        MCH_ID
    );
    let token = manager
        .sign_request(&reqwest::Method::GET, &url, "")
        .expect("sign request");
    println!("authorization: {}", token.header_value());

    // Populate the certificate store, then make a verified call.
    //
    // This performs:
    // 1. HTTPS fetch of /v3/certificates (verification skipped: bootstrap)
    // 2. AES-256-GCM decryption of each certificate payload
    // 3. Atomic store refresh
    // 4. A signed GET whose response signature is verified
    if let Err(e) = manager.refresh_certificates() {
        eprintln!("Certificate refresh failed: {}", e);
        std::process::exit(1);
    }
    println!("platform certificates loaded: {}", manager.certificates().len());

    match manager.request(reqwest::Method::GET, &url, None) {
        Ok(response) => {
            println!("verified response ({}):", response.status);
            println!("{}", response.body_str().unwrap_or("<binary>"));
        }
        Err(e) => {
            match &e {
                PaywardenError::SignatureMismatch => {
                    // Security: someone may be tampering with responses
                    eprintln!("SECURITY: Response signature verification failed!");
                }
                PaywardenError::CertificateNotFound { serial } => {
                    eprintln!("No platform certificate for serial {}", serial);
                }
                PaywardenError::Gateway { status, code, .. } => {
                    eprintln!("Gateway rejected the call: {} {}", status, code);
                }
                _ => {
                    eprintln!("Request failed: {}", e);
                }
            }
            std::process::exit(1);
        }
    }
}
