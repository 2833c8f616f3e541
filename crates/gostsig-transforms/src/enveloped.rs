#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the enclosing `<Signature>` element from the node set.

use crate::pipeline::{Transform, TransformData};
use gostsig_core::{algorithm, Error};
use gostsig_xml::{NodeId, NodeSet};

/// The enveloped signature transform: removes the `<Signature>` element
/// and its descendants from the node set.
pub struct EnvelopedSignatureTransform {
    signature: NodeId,
}

impl EnvelopedSignatureTransform {
    /// Create with the `Signature` element to remove.
    pub fn new(signature: NodeId) -> Self {
        Self { signature }
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute<'a>(&self, input: TransformData<'a>) -> Result<TransformData<'a>, Error> {
        match input {
            TransformData::Xml { doc, node_set } => {
                if !doc.owns(self.signature) {
                    return Err(Error::Transform(
                        "enveloped-signature transform: signature is not in the referenced document"
                            .into(),
                    ));
                }
                let mut set =
                    node_set.unwrap_or_else(|| NodeSet::tree_without_comments(doc.root()));
                set.exclude_subtree(self.signature);
                Ok(TransformData::Xml {
                    doc,
                    node_set: Some(set),
                })
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gostsig_xml::Document;

    #[test]
    fn test_foreign_signature_rejected() {
        let doc = Document::parse("<r/>").unwrap();
        let other = Document::parse("<s/>").unwrap();
        let sig = other.document_element().unwrap();
        let t = EnvelopedSignatureTransform::new(sig);
        let result = t.execute(TransformData::Xml {
            doc: &doc,
            node_set: None,
        });
        assert!(matches!(result, Err(Error::Transform(_))));
    }

    #[test]
    fn test_binary_input_rejected() {
        let doc = Document::parse("<r/>").unwrap();
        let t = EnvelopedSignatureTransform::new(doc.root());
        assert!(t.execute(TransformData::Binary(b"<r/>".to_vec())).is_err());
    }
}
