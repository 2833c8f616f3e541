#![forbid(unsafe_code)]

//! Reference URI computation for the element being signed.

use gostsig_core::{ns, Error};
use gostsig_xml::{Document, NodeId};

/// The reference URI for `element`.
///
/// The local `Id` attribute is used, falling back to `wsu:Id`; a blank or
/// missing identifier yields `""` (the whole document).  A non-empty
/// identifier is returned in fragment form, `#id`.  Never fails.
pub fn reference_uri(doc: &Document, element: NodeId) -> String {
    let Some(elem) = doc.element(element) else {
        return String::new();
    };
    let id = elem
        .attribute(ns::attr::ID)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            elem.attribute_ns(ns::WSU, ns::attr::ID)
                .filter(|v| !v.trim().is_empty())
        });
    match id {
        None => String::new(),
        Some(id) if id.starts_with('#') => id.to_owned(),
        Some(id) => format!("#{id}"),
    }
}

/// Read the `URI` of the first `Reference` below `signature`; absent means `""`.
pub fn first_reference_uri(doc: &Document, signature: NodeId) -> Result<String, Error> {
    let reference = doc
        .find_element(signature, ns::DSIG, ns::node::REFERENCE)
        .ok_or_else(|| Error::MissingElement("Reference".into()))?;
    Ok(doc
        .element(reference)
        .and_then(|e| e.attribute(ns::attr::URI))
        .unwrap_or("")
        .to_owned())
}
