#![forbid(unsafe_code)]

//! GOST XML-DSig signing and validation.
//!
//! [`SignatureProcessor`] signs XML documents with enveloped or detached
//! signatures, validates them (one signature, or every signature in a
//! document), and signs or validates binary content with detached PKCS#7
//! envelopes.  The building blocks are re-exported for callers that need
//! finer control.

pub mod processor;

pub use gostsig_c14n as c14n;
pub use gostsig_cms as cms;
pub use gostsig_core as core;
pub use gostsig_crypto as crypto;
pub use gostsig_dsig as dsig;
pub use gostsig_keys as keys;
pub use gostsig_transforms as transforms;
pub use gostsig_xml as xml;

pub use gostsig_core::{Error, SignatureError};
pub use gostsig_crypto::{DigestReader, SigningKey, VerifyingKey};
pub use gostsig_dsig::{DsigContext, EnvelopedOptions, SignaturePosition, ValidationResult};
pub use gostsig_keys::Certificate;
pub use gostsig_xml::{Document, NodeId};
pub use processor::SignatureProcessor;
