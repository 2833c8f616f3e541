#![forbid(unsafe_code)]

//! KeyInfo processing: writing and reading `<ds:KeyInfo><ds:X509Data>`.

use crate::x509::Certificate;
use gostsig_core::{ns, Error};
use gostsig_xml::{Document, NodeId, QName};

fn ds(local: &str) -> QName {
    QName::ns(Some(ns::DSIG_PREFIX), local, ns::DSIG)
}

/// Build `<ds:KeyInfo><ds:X509Data><ds:X509Certificate>` for `cert` and
/// append it to `signature`.
pub fn append_key_info(
    doc: &mut Document,
    signature: NodeId,
    cert: &Certificate,
) -> Result<NodeId, Error> {
    let key_info = doc.create_element(ds(ns::node::KEY_INFO));
    let x509_data = doc.create_element(ds(ns::node::X509_DATA));
    let x509_cert = doc.create_element(ds(ns::node::X509_CERTIFICATE));
    let text = doc.create_text(cert.to_base64());
    doc.append_child(x509_cert, text)?;
    doc.append_child(x509_data, x509_cert)?;
    doc.append_child(key_info, x509_data)?;
    doc.append_child(signature, key_info)
}

/// Read the signer certificate from the `KeyInfo` of `signature`.
///
/// Returns `Ok(None)` when there is no `KeyInfo`, no `X509Data` or no
/// `X509Certificate`; a present but undecodable certificate is an error.
pub fn extract_certificate(doc: &Document, signature: NodeId) -> Result<Option<Certificate>, Error> {
    let Some(key_info) = doc.child_element(signature, ns::DSIG, ns::node::KEY_INFO) else {
        return Ok(None);
    };
    for x509_data in doc.child_elements(key_info, ns::DSIG, ns::node::X509_DATA) {
        if let Some(node) = doc.child_element(x509_data, ns::DSIG, ns::node::X509_CERTIFICATE) {
            return Certificate::from_base64(&doc.text(node)).map(Some);
        }
    }
    Ok(None)
}
