#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for the gostsig XML signature library.
//!
//! The signing profile uses Exclusive Canonical XML 1.0 for both the
//! reference transforms and `SignedInfo`; the with-comments variant is
//! accepted on validation.

pub mod exclusive;
pub mod render;

use gostsig_core::{algorithm, Error};
use gostsig_xml::{Document, NodeSet};

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveWithComments)
    }
}

/// Canonicalize a document, or the subset selected by `node_set`.
pub fn canonicalize(
    doc: &Document,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    exclusive::canonicalize(doc, mode.with_comments(), node_set)
}

/// Convenience: parse `xml` and canonicalize the whole document.
pub fn canonicalize_str(xml: &str, mode: C14nMode) -> Result<Vec<u8>, Error> {
    let doc = Document::parse(xml)?;
    canonicalize(&doc, mode, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_uris() {
        for mode in [C14nMode::Exclusive, C14nMode::ExclusiveWithComments] {
            assert_eq!(C14nMode::from_uri(mode.uri()), Some(mode));
        }
        assert_eq!(
            C14nMode::from_uri("http://www.w3.org/TR/2001/REC-xml-c14n-20010315"),
            None
        );
    }

    #[test]
    fn test_canonicalize_str_drops_declaration() {
        let out = canonicalize_str("<?xml version=\"1.0\"?>\n<a  b='1'/>", C14nMode::Exclusive).unwrap();
        assert_eq!(out, b"<a b=\"1\"></a>");
    }
}
