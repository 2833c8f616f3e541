#![forbid(unsafe_code)]

//! XML Digital Signature (XML-DSig) for the GOST signing profile.
//!
//! Creates enveloped and detached signatures and validates them, including
//! signatures that are misplaced within their document or shipped apart
//! from the content they sign.

pub mod context;
pub mod locate;
pub mod reconstruct;
pub mod reference;
pub mod sign;
pub mod verify;

pub use context::DsigContext;
pub use reconstruct::{ReconstructionCase, ValidationContext};
pub use sign::{sign_detached, sign_enveloped, sign_enveloped_with, EnvelopedOptions, SignaturePosition};
pub use verify::{
    validate_all, validate_detached, validate_enveloped, ValidationResult, VerifyResult,
};
