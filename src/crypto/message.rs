//! Canonical message construction.
//!
//! The gateway signs and verifies exact byte strings, newline-terminated:
//!
//! ```text
//! request:  METHOD \n PATH[?QUERY] \n TIMESTAMP \n NONCE \n BODY \n
//! verify:   TIMESTAMP \n NONCE \n BODY \n
//! pay-sign: APPID \n TIMESTAMP \n NONCE \n [prepay_id=]PREPAY_ID \n
//! ```
//!
//! No escaping, trimming, or normalization is applied beyond substitution.
//! A trailing slash, reordered query parameter, or re-serialized body yields
//! a different message and must fail verification.

use crate::config::TradeType;
use crate::PaywardenError;
use url::Url;

/// Strip scheme and host from a request URL, keeping the path and the query
/// string verbatim as sent.
pub fn path_and_query(url: &str) -> Result<String, PaywardenError> {
    let parsed = Url::parse(url)
        .map_err(|e| PaywardenError::ProtocolError(format!("Invalid request URL: {}", e)))?;

    match parsed.query() {
        Some(query) => Ok(format!("{}?{}", parsed.path(), query)),
        None => Ok(parsed.path().to_string()),
    }
}

/// A message in one of the gateway's canonical forms.
///
/// Both signing and verification go through [`CanonicalMessage::canonicalize`]
/// so the two sides can never drift apart in string-building logic.
#[derive(Debug, Clone)]
pub enum CanonicalMessage<'a> {
    /// Outbound request form, signed with the merchant private key.
    Request {
        /// HTTP method, uppercase as sent (`GET`, `POST`, ...).
        method: &'a str,
        /// Path plus verbatim query, from [`path_and_query`].
        path_and_query: &'a str,
        /// Epoch seconds embedded in the auth token.
        timestamp: i64,
        /// Request nonce embedded in the auth token.
        nonce: &'a str,
        /// JSON body string, empty if the request has no body.
        body: &'a str,
    },
    /// Response form, verified against a platform certificate. Timestamp and
    /// nonce are the `wechatpay-*` header values verbatim; the body is the
    /// exact raw payload bytes, never re-serialized.
    Verify {
        /// `wechatpay-timestamp` header value.
        timestamp: &'a str,
        /// `wechatpay-nonce` header value.
        nonce: &'a str,
        /// Raw response body bytes.
        body: &'a [u8],
    },
    /// Front-end pay-sign form handed to the JSAPI/APP payment call.
    PaySign {
        /// Application id.
        app_id: &'a str,
        /// Epoch seconds.
        timestamp: i64,
        /// Pay-sign nonce.
        nonce: &'a str,
        /// Prepay id returned by the transaction endpoint.
        prepay_id: &'a str,
        /// Flow variant; JSAPI prefixes the prepay id with `prepay_id=`.
        trade_type: TradeType,
    },
}

impl CanonicalMessage<'_> {
    /// Render the exact bytes that get signed or verified.
    pub fn canonicalize(&self) -> Vec<u8> {
        match self {
            CanonicalMessage::Request {
                method,
                path_and_query,
                timestamp,
                nonce,
                body,
            } => format!(
                "{}\n{}\n{}\n{}\n{}\n",
                method, path_and_query, timestamp, nonce, body
            )
            .into_bytes(),

            CanonicalMessage::Verify {
                timestamp,
                nonce,
                body,
            } => {
                let mut out =
                    Vec::with_capacity(timestamp.len() + nonce.len() + body.len() + 3);
                out.extend_from_slice(timestamp.as_bytes());
                out.push(b'\n');
                out.extend_from_slice(nonce.as_bytes());
                out.push(b'\n');
                out.extend_from_slice(body);
                out.push(b'\n');
                out
            }

            CanonicalMessage::PaySign {
                app_id,
                timestamp,
                nonce,
                prepay_id,
                trade_type,
            } => match trade_type {
                TradeType::Jsapi => format!(
                    "{}\n{}\n{}\nprepay_id={}\n",
                    app_id, timestamp, nonce, prepay_id
                )
                .into_bytes(),
                TradeType::App => {
                    format!("{}\n{}\n{}\n{}\n", app_id, timestamp, nonce, prepay_id)
                        .into_bytes()
                }
            },
        }
    }
}
