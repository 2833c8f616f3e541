#![forbid(unsafe_code)]

//! Cryptographic primitives for the gostsig XML signature library.
//!
//! GOST R 34.11-94 digests (one-shot, streamed, and through a digesting
//! reader) and GOST R 34.10-2001 signatures on the CryptoPro-A curve.

pub mod digest;
pub mod gost;
pub mod sign;

pub use digest::{calculate_digest, DigestAlgorithm, DigestReader};
pub use gost::{SigningKey, VerifyingKey};
pub use sign::SignatureAlgorithm;
