//! Gateway transport layer.

pub mod http;
