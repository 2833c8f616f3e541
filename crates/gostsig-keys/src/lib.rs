#![forbid(unsafe_code)]

//! Certificate and KeyInfo handling for the gostsig XML signature library.
//!
//! The signer is identified by an X.509 certificate carrying a GOST
//! R 34.10-2001 public key.  The certificate travels inside the signature
//! (`KeyInfo/X509Data`) so a verifier needs no external lookup.

pub mod keyinfo;
pub mod x509;

pub use keyinfo::{append_key_info, extract_certificate};
pub use x509::Certificate;
