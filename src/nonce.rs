//! Nonce generation for signed requests.
//!
//! Every canonical message carries a fresh nonce. The source is a capability
//! trait so tests (and callers with their own entropy requirements) can swap
//! in a deterministic implementation without touching the signing path.

use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Nonce length used when the configuration does not override it.
pub const DEFAULT_NONCE_LENGTH: usize = 16;

/// Source of random nonce strings.
pub trait NonceSource: Send + Sync {
    /// Generate a nonce of `length` characters drawn from `0-9a-zA-Z`,
    /// one independent uniform draw per character.
    fn generate(&self, length: usize) -> String;
}

/// Default nonce source backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonceSource;

impl NonceSource for RandomNonceSource {
    fn generate(&self, length: usize) -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

/// Fixed nonce source for deterministic testing.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone)]
pub struct FixedNonceSource {
    nonce: String,
}

#[cfg(any(test, feature = "test-seams"))]
impl FixedNonceSource {
    /// Create a source that always returns the given nonce, truncated or
    /// repeated to the requested length.
    pub fn new(nonce: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
        }
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl NonceSource for FixedNonceSource {
    fn generate(&self, length: usize) -> String {
        self.nonce.chars().cycle().take(length).collect()
    }
}
