#![forbid(unsafe_code)]

/// Low-level errors produced by the gostsig building blocks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("DER encoding error: {0}")]
    Der(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("invalid path expression: {0}")]
    InvalidPath(String),

    #[error("certificate error: {0}")]
    Certificate(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome kinds surfaced to callers of the signing and validation API.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// Signature construction, or a structural step of validation, could
    /// not complete.
    #[error("signature processing failed: {0}")]
    Processing(#[source] Error),

    /// No signature element could be located at all.
    #[error("document is not signed: {0}")]
    NotSigned(String),

    /// A signature was found but does not validate.
    #[error("signature validation failed: {reason}")]
    Validation {
        reason: String,
        #[source]
        cause: Option<Error>,
    },
}

impl SignatureError {
    /// Build a validation failure without an underlying cause.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
            cause: None,
        }
    }

    /// Wrap a low-level error as a validation failure.
    pub fn invalid_because(cause: Error) -> Self {
        Self::Validation {
            reason: cause.to_string(),
            cause: Some(cause),
        }
    }

    pub fn is_not_signed(&self) -> bool {
        matches!(self, Self::NotSigned(_))
    }
}

impl From<Error> for SignatureError {
    fn from(e: Error) -> Self {
        Self::Processing(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_level_errors_become_processing_failures() {
        let e: SignatureError = Error::MissingElement("Signature".into()).into();
        assert!(matches!(e, SignatureError::Processing(Error::MissingElement(_))));
    }

    #[test]
    fn validation_failure_keeps_cause() {
        let e = SignatureError::invalid_because(Error::Base64("bad".into()));
        match e {
            SignatureError::Validation { reason, cause } => {
                assert!(reason.contains("bad"));
                assert!(cause.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(SignatureError::NotSigned("x".into()).is_not_signed());
    }
}
