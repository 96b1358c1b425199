//! Cryptographic primitives for request signing and response verification.

pub mod decrypt;
pub mod message;
pub mod pipeline;
pub mod sign;
pub mod verify;

/// Shared RSA test material. Key generation is expensive, so every test
/// module borrows the same lazily-generated keys.
#[cfg(test)]
pub(crate) mod testkeys {
    use once_cell::sync::Lazy;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::RsaPrivateKey;
    use sha2::Sha256;
    use std::str::FromStr;
    use std::time::Duration;
    use x509_cert::builder::{Builder, CertificateBuilder, Profile};
    use x509_cert::der::{pem::LineEnding, EncodePem};
    use x509_cert::name::Name;
    use x509_cert::serial_number::SerialNumber;
    use x509_cert::spki::SubjectPublicKeyInfoOwned;
    use x509_cert::time::Validity;

    static RSA_2048: Lazy<RsaPrivateKey> = Lazy::new(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("generate 2048-bit test key")
    });

    static RSA_1024: Lazy<RsaPrivateKey> = Lazy::new(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("generate 1024-bit test key")
    });

    /// The gateway-sized test key.
    pub(crate) fn rsa_2048() -> &'static RsaPrivateKey {
        &RSA_2048
    }

    /// An undersized key for rejection tests.
    pub(crate) fn rsa_1024() -> &'static RsaPrivateKey {
        &RSA_1024
    }

    /// Self-signed certificate over the test key, PEM-encoded, standing in
    /// for a decrypted platform certificate.
    pub(crate) fn certificate_pem() -> String {
        let key = rsa_2048();
        let signer = rsa::pkcs1v15::SigningKey::<Sha256>::new(key.clone());
        let spki_der = key
            .to_public_key()
            .to_public_key_der()
            .expect("encode test public key");
        let spki = SubjectPublicKeyInfoOwned::try_from(spki_der.as_bytes())
            .expect("parse test public key");
        let builder = CertificateBuilder::new(
            Profile::Root,
            SerialNumber::from(1u32),
            Validity::from_now(Duration::from_secs(365 * 24 * 3600)).expect("validity"),
            Name::from_str("CN=paywarden test platform cert").expect("subject"),
            spki,
            &signer,
        )
        .expect("certificate builder");

        builder
            .build::<rsa::pkcs1v15::Signature>()
            .expect("build test certificate")
            .to_pem(LineEnding::LF)
            .expect("encode test certificate")
    }
}
