#![forbid(unsafe_code)]

//! Building the document a signature is validated in.
//!
//! Three situations are distinguished:
//!
//! - **co-resident**: the signature is a child of the signed content (or
//!   was supplied explicitly from the same document) and references it by
//!   ID; validation runs on the caller's document as-is.
//! - **detached, foreign**: an explicit signature comes from a different
//!   document.  A synthetic document is built whose root is
//!   `<root_validator>` holding a copy of the signature followed by a copy
//!   of the content.
//! - **promoted**: the located signature sits under some element other
//!   than the content, or its first reference URI is empty.  The
//!   signature's parent is copied into a synthetic document as its root
//!   and the signature is located again there.
//!
//! The caller's documents are never modified.

use crate::locate::find_signature;
use crate::reference::first_reference_uri;
use gostsig_core::{ns, Error, SignatureError};
use gostsig_xml::{Document, NodeId, QName};

/// Name of the synthetic root used for foreign detached signatures.
pub const VALIDATOR_ROOT: &str = "root_validator";

/// Which reconstruction was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionCase {
    /// Validated in the caller's document as-is.
    CoResident,
    /// Signature and content copied under a `root_validator` element.
    DetachedForeign,
    /// The signature's parent copied into a new document as its root.
    Promoted,
}

enum ValidationDocument<'a> {
    Borrowed(&'a Document),
    Owned(Document),
}

/// A document plus the signature to validate within it.
pub struct ValidationContext<'a> {
    document: ValidationDocument<'a>,
    signature: NodeId,
    case: ReconstructionCase,
}

impl<'a> ValidationContext<'a> {
    /// The document validation runs in.
    pub fn document(&self) -> &Document {
        match &self.document {
            ValidationDocument::Borrowed(doc) => *doc,
            ValidationDocument::Owned(doc) => doc,
        }
    }

    /// The `Signature` element, as a node of [`Self::document`].
    pub fn signature(&self) -> NodeId {
        self.signature
    }

    /// How [`Self::document`] was obtained.
    pub fn case(&self) -> ReconstructionCase {
        self.case
    }
}

/// Validation context for a signature enveloped somewhere in `doc`.
///
/// `content` is the element the caller considers signed; when it is not
/// an element of `doc` there is nothing signed to validate.
pub fn for_enveloped(doc: &Document, content: NodeId) -> Result<ValidationContext<'_>, SignatureError> {
    if !doc.is_element(content) {
        return Err(SignatureError::NotSigned("signed fragment not supplied".into()));
    }
    let signature = find_signature(doc)?;
    let empty_ref = first_reference_uri(doc, signature)
        .map_err(SignatureError::invalid_because)?
        .is_empty();
    let parent = doc.parent(signature);

    if parent == Some(content) && !empty_ref {
        tracing::debug!("validating co-resident signature in place");
        return Ok(ValidationContext {
            document: ValidationDocument::Borrowed(doc),
            signature,
            case: ReconstructionCase::CoResident,
        });
    }

    let parent = parent
        .filter(|&p| doc.is_element(p))
        .ok_or_else(|| Error::XmlStructure("signature has no enclosing element".into()))?;
    tracing::debug!(empty_ref, "promoting the signature's parent to a document root");
    let mut promoted = Document::new();
    let promoted_root = promoted.root();
    promoted.import_and_append(promoted_root, doc, parent)?;
    promoted.normalize();
    let signature = find_signature(&promoted)?;
    Ok(ValidationContext {
        document: ValidationDocument::Owned(promoted),
        signature,
        case: ReconstructionCase::Promoted,
    })
}

/// Validation context for an explicitly supplied signature.
pub fn for_detached<'a>(
    content_doc: &'a Document,
    content: NodeId,
    signature_doc: &Document,
    signature: NodeId,
) -> Result<ValidationContext<'a>, SignatureError> {
    if !signature_doc.is_named(signature, ns::DSIG, ns::node::SIGNATURE) {
        return Err(SignatureError::invalid(format!(
            "the signature root element is not {{{}}}{}",
            ns::DSIG,
            ns::node::SIGNATURE
        )));
    }
    if !content_doc.is_element(content) {
        return Err(Error::XmlStructure("signed content must be an element".into()).into());
    }

    if content_doc.id() == signature_doc.id() {
        tracing::debug!("signature shares the content document");
        return Ok(ValidationContext {
            document: ValidationDocument::Borrowed(content_doc),
            signature,
            case: ReconstructionCase::CoResident,
        });
    }

    tracing::debug!("combining content and foreign signature under {VALIDATOR_ROOT}");
    let mut combined = Document::new();
    let combined_root = combined.root();
    let holder = combined.create_element(QName::local(VALIDATOR_ROOT));
    combined.append_child(combined_root, holder)?;
    let signature = combined.import_and_append(holder, signature_doc, signature)?;
    combined.import_and_append(holder, content_doc, content)?;
    combined.normalize();
    Ok(ValidationContext {
        document: ValidationDocument::Owned(combined),
        signature,
        case: ReconstructionCase::DetachedForeign,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(uri: &str) -> String {
        format!(
            r#"<ds:Signature xmlns:ds="{}"><ds:SignedInfo><ds:Reference URI="{uri}"/></ds:SignedInfo></ds:Signature>"#,
            ns::DSIG
        )
    }

    #[test]
    fn test_co_resident_borrowed() {
        let doc = Document::parse(&format!(r#"<c Id="x">{}</c>"#, sig("#x"))).unwrap();
        let content = doc.document_element().unwrap();
        let vctx = for_enveloped(&doc, content).unwrap();
        assert_eq!(vctx.case(), ReconstructionCase::CoResident);
        assert_eq!(vctx.document().id(), doc.id());
    }

    #[test]
    fn test_misplaced_signature_promoted() {
        let xml = format!(r#"<w><p Id="x">{}<v/></p></w>"#, sig("#x"));
        let doc = Document::parse(&xml).unwrap();
        let before = doc.to_xml();
        let wrapper = doc.document_element().unwrap();

        let vctx = for_enveloped(&doc, wrapper).unwrap();
        assert_eq!(vctx.case(), ReconstructionCase::Promoted);
        let promoted = vctx.document();
        assert_ne!(promoted.id(), doc.id());
        let root = promoted.document_element().unwrap();
        assert_eq!(promoted.element(root).unwrap().name.local_name, "p");
        assert_eq!(promoted.parent(vctx.signature()), Some(root));
        assert_eq!(doc.to_xml(), before);
    }

    #[test]
    fn test_empty_reference_promoted() {
        let doc = Document::parse(&format!("<c>{}</c>", sig(""))).unwrap();
        let content = doc.document_element().unwrap();
        let vctx = for_enveloped(&doc, content).unwrap();
        assert_eq!(vctx.case(), ReconstructionCase::Promoted);
    }

    #[test]
    fn test_missing_fragment_is_not_signed() {
        let doc = Document::parse(&format!(r#"<c Id="x">{}t</c>"#, sig("#x"))).unwrap();
        let other = Document::parse(r#"<c Id="x"/>"#).unwrap();

        let foreign = other.document_element().unwrap();
        let err = for_enveloped(&doc, foreign).err().unwrap();
        assert!(err.is_not_signed());

        let c = doc.document_element().unwrap();
        let text = doc.children(c).last().unwrap();
        assert!(for_enveloped(&doc, text).err().unwrap().is_not_signed());
        assert!(for_enveloped(&doc, doc.root()).err().unwrap().is_not_signed());
    }

    #[test]
    fn test_foreign_signature_combined() {
        let content_doc = Document::parse(r#"<data Id="d"/>"#).unwrap();
        let sig_doc = Document::parse(&sig("#d")).unwrap();
        let content = content_doc.document_element().unwrap();
        let signature = sig_doc.document_element().unwrap();

        let vctx = for_detached(&content_doc, content, &sig_doc, signature).unwrap();
        assert_eq!(vctx.case(), ReconstructionCase::DetachedForeign);
        let combined = vctx.document();
        let root = combined.document_element().unwrap();
        assert_eq!(combined.element(root).unwrap().name.local_name, VALIDATOR_ROOT);
        let kids: Vec<_> = combined.children(root).collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0], vctx.signature());
        assert!(combined.is_named(kids[1], "", "data"));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let content_doc = Document::parse("<data/>").unwrap();
        let other = Document::parse("<NotASignature/>").unwrap();
        let err = for_detached(
            &content_doc,
            content_doc.document_element().unwrap(),
            &other,
            other.document_element().unwrap(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SignatureError::Validation { .. }));
    }
}
