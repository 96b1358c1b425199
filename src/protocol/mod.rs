//! Gateway protocol layer: wire models and authorization token assembly.

pub mod models;
pub mod token;
