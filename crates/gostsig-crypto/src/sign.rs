#![forbid(unsafe_code)]

//! Signature algorithm implementations (GOST R 34.10-2001 with GOST R 34.11-94).

use crate::digest;
use crate::gost::{SigningKey, VerifyingKey};
use gostsig_core::{algorithm, Error};

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send + Sync {
    fn uri(&self) -> &'static str;
    /// Hash `data` and sign the digest.
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    /// Hash `data` and check `signature` against the digest.
    fn verify(&self, key: &VerifyingKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::GOSTR34102001_GOSTR3411 => Ok(Box::new(Gost2001)),
        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

// ── GOST R 34.10-2001 ────────────────────────────────────────────────

struct Gost2001;

impl SignatureAlgorithm for Gost2001 {
    fn uri(&self) -> &'static str {
        algorithm::GOSTR34102001_GOSTR3411
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        key.sign_digest(&digest::gost3411(data))
    }

    fn verify(&self, key: &VerifyingKey, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        key.verify_digest(&digest::gost3411(data), signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let alg = from_uri(algorithm::GOSTR34102001_GOSTR3411).unwrap();
        let key = SigningKey::random(&mut rand::thread_rng());
        let sig = alg.sign(&key, b"<SignedInfo/>").unwrap();
        assert!(alg.verify(&key.verifying_key(), b"<SignedInfo/>", &sig).unwrap());
        assert!(!alg.verify(&key.verifying_key(), b"<SignedInfo />", &sig).unwrap());
    }

    #[test]
    fn test_unknown_uri() {
        assert!(matches!(
            from_uri("http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
