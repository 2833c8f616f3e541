#![forbid(unsafe_code)]

//! Locating `ds:Signature` elements.
//!
//! The search always covers the whole document the given node belongs to,
//! not just the subtree under it.

use gostsig_core::{ns, SignatureError};
use gostsig_xml::{Document, NodeId};

/// The first `ds:Signature` in document order.
pub fn find_signature(doc: &Document) -> Result<NodeId, SignatureError> {
    doc.find_element(doc.root(), ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| SignatureError::NotSigned("no ds:Signature element found".into()))
}

/// Every `ds:Signature` in document order; at least one.
pub fn find_signatures(doc: &Document) -> Result<Vec<NodeId>, SignatureError> {
    let found = doc.find_elements(doc.root(), ns::DSIG, ns::node::SIGNATURE);
    if found.is_empty() {
        return Err(SignatureError::NotSigned("no ds:Signature element found".into()));
    }
    tracing::debug!(count = found.len(), "signatures located");
    Ok(found)
}
