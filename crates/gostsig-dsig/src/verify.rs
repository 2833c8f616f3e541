#![forbid(unsafe_code)]

//! XML-DSig signature verification.
//!
//! Processing order:
//! 1. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod
//! 2. For each `<Reference>`: resolve URI, run transforms, compute digest, compare
//! 3. Canonicalize `<SignedInfo>`
//! 4. Verify `<SignatureValue>` with the key of the embedded certificate
//!
//! The entry points below pick the document to verify in (see
//! [`crate::reconstruct`]) and map outcomes onto [`SignatureError`].

use crate::context::DsigContext;
use crate::locate::find_signatures;
use crate::reconstruct;
use base64::Engine;
use gostsig_c14n::C14nMode;
use gostsig_core::{ns, Error, SignatureError};
use gostsig_crypto::{digest, sign};
use gostsig_keys::{extract_certificate, Certificate};
use gostsig_transforms::{uri, TransformData, TransformPipeline};
use gostsig_xml::{Document, NodeId, NodeSet};
use std::collections::HashMap;

/// Reported when the digest or signature value does not match.
pub const SIGNATURE_INVALID: &str = "signature integrity is violated";

/// Reported when the signature carries no usable certificate.
pub const PUBLIC_KEY_NOT_FOUND: &str = "no public key information; the signature cannot be checked";

/// Result of signature verification.
#[derive(Debug)]
pub enum VerifyResult {
    /// Signature is valid.
    Valid,
    /// Signature is invalid.
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }
}

/// Per-signature outcome of [`validate_all`].
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    /// Signer certificate, when one could be read.
    pub certificate: Option<Certificate>,
    /// Human-readable reason when `valid` is false.
    pub error: Option<String>,
    /// The underlying failure when `valid` is false.
    pub fault: Option<SignatureError>,
}

impl ValidationResult {
    fn valid(cert: Certificate) -> Self {
        Self {
            valid: true,
            certificate: Some(cert),
            error: None,
            fault: None,
        }
    }

    fn invalid(certificate: Option<Certificate>, fault: SignatureError) -> Self {
        let error = match &fault {
            SignatureError::Validation { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self {
            valid: false,
            certificate,
            error: Some(error),
            fault: Some(fault),
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────

/// Validate the first signature found in the document holding `content`.
///
/// Returns the signer certificate on success.
pub fn validate_enveloped(
    ctx: &DsigContext,
    doc: &Document,
    content: NodeId,
) -> Result<Certificate, SignatureError> {
    let vctx = reconstruct::for_enveloped(doc, content)?;
    verify_signature(ctx, vctx.document(), vctx.signature())
}

/// Validate an explicitly supplied signature over `content`.
///
/// The signature may live in `content_doc` itself or in another document.
pub fn validate_detached(
    ctx: &DsigContext,
    content_doc: &Document,
    content: NodeId,
    signature_doc: &Document,
    signature: NodeId,
) -> Result<Certificate, SignatureError> {
    let vctx = reconstruct::for_detached(content_doc, content, signature_doc, signature)?;
    verify_signature(ctx, vctx.document(), vctx.signature())
}

/// Validate every signature in `doc` independently, in document order.
///
/// A failing signature never stops the others from being checked.
pub fn validate_all(
    ctx: &DsigContext,
    doc: &Document,
) -> Result<Vec<ValidationResult>, SignatureError> {
    let signatures = find_signatures(doc)?;
    let mut results = Vec::with_capacity(signatures.len());
    for signature in signatures {
        let certificate = extract_certificate(doc, signature).ok().flatten();
        let result = match verify_signature(ctx, doc, signature) {
            Ok(cert) => ValidationResult::valid(cert),
            Err(fault) => {
                tracing::debug!(error = %fault, "signature failed validation");
                ValidationResult::invalid(certificate, fault)
            }
        };
        results.push(result);
    }
    Ok(results)
}

/// Verify `signature` inside `doc` with the certificate it embeds.
pub fn verify_signature(
    ctx: &DsigContext,
    doc: &Document,
    signature: NodeId,
) -> Result<Certificate, SignatureError> {
    let cert = extract_certificate(doc, signature)
        .map_err(SignatureError::invalid_because)?
        .ok_or_else(|| SignatureError::invalid(PUBLIC_KEY_NOT_FOUND))?;
    match check_signature_value(ctx, doc, signature, &cert) {
        Ok(VerifyResult::Valid) => {
            tracing::debug!(signer = %cert.subject(), "signature is valid");
            Ok(cert)
        }
        Ok(VerifyResult::Invalid { reason }) => {
            tracing::debug!(%reason, "signature is invalid");
            Err(SignatureError::invalid(SIGNATURE_INVALID))
        }
        Err(e) => Err(SignatureError::invalid_because(e)),
    }
}

// ── Core check ───────────────────────────────────────────────────────

/// Check every reference digest and the signature value of `signature`.
pub fn check_signature_value(
    ctx: &DsigContext,
    doc: &Document,
    signature: NodeId,
    cert: &Certificate,
) -> Result<VerifyResult, Error> {
    let signed_info = doc
        .child_element(signature, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

    let c14n_uri = algorithm_of(doc, signed_info, ns::node::CANONICALIZATION_METHOD)?;
    let c14n_mode = C14nMode::from_uri(&c14n_uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
    let sig_method_uri = algorithm_of(doc, signed_info, ns::node::SIGNATURE_METHOD)?;

    let references = doc.child_elements(signed_info, ns::DSIG, ns::node::REFERENCE);
    if references.is_empty() {
        return Err(Error::MissingElement("Reference".into()));
    }
    let id_map = doc.build_id_map(&ctx.id_attrs);
    for reference in references {
        if let VerifyResult::Invalid { reason } =
            verify_reference(doc, &id_map, signature, reference)?
        {
            return Ok(VerifyResult::Invalid {
                reason: format!("Reference digest failed: {reason}"),
            });
        }
    }

    let c14n_signed_info = gostsig_c14n::canonicalize(
        doc,
        c14n_mode,
        Some(&NodeSet::tree_without_comments(signed_info)),
    )?;
    tracing::trace!(
        signed_info = %String::from_utf8_lossy(&c14n_signed_info),
        "canonical SignedInfo"
    );

    let sig_value_node = doc
        .child_element(signature, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    let sig_value = decode_base64(&doc.text(sig_value_node), "SignatureValue")?;

    let public_key = cert.public_key()?;
    let sig_alg = sign::from_uri(&sig_method_uri)?;
    if sig_alg.verify(&public_key, &c14n_signed_info, &sig_value)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature value verification failed".into(),
        })
    }
}

fn verify_reference(
    doc: &Document,
    id_map: &HashMap<String, NodeId>,
    signature: NodeId,
    reference: NodeId,
) -> Result<VerifyResult, Error> {
    let uri = doc
        .element(reference)
        .and_then(|e| e.attribute(ns::attr::URI))
        .unwrap_or("");

    let transform_uris: Vec<String> = match doc.child_element(reference, ns::DSIG, ns::node::TRANSFORMS) {
        Some(transforms) => doc
            .child_elements(transforms, ns::DSIG, ns::node::TRANSFORM)
            .into_iter()
            .map(|t| {
                doc.element(t)
                    .and_then(|e| e.attribute(ns::attr::ALGORITHM))
                    .map(str::to_owned)
                    .ok_or_else(|| Error::MissingAttribute("Algorithm on Transform".into()))
            })
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    };
    let pipeline = TransformPipeline::from_uris(&transform_uris, signature)?;

    let digest_uri = algorithm_of(doc, reference, ns::node::DIGEST_METHOD)?;
    let digest_value_node = doc
        .child_element(reference, ns::DSIG, ns::node::DIGEST_VALUE)
        .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
    let expected = decode_base64(&doc.text(digest_value_node), "DigestValue")?;

    let node_set = uri::resolve_uri(uri, doc, id_map)?;
    let octets = pipeline.execute(TransformData::Xml {
        doc,
        node_set: Some(node_set),
    })?;
    tracing::trace!(
        %uri,
        content = %String::from_utf8_lossy(&octets),
        "pre-digest reference content"
    );
    let computed = digest::digest(&digest_uri, &octets)?;

    if computed == expected {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: format!("digest mismatch for URI '{uri}'"),
        })
    }
}

/// Read the `Algorithm` attribute of the child `local` of `parent`.
fn algorithm_of(doc: &Document, parent: NodeId, local: &str) -> Result<String, Error> {
    let node = doc
        .child_element(parent, ns::DSIG, local)
        .ok_or_else(|| Error::MissingElement(local.into()))?;
    doc.element(node)
        .and_then(|e| e.attribute(ns::attr::ALGORITHM))
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingAttribute(format!("Algorithm on {local}")))
}

fn decode_base64(text: &str, what: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(&clean)
        .map_err(|e| Error::Base64(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::{sign_detached, sign_enveloped, sign_enveloped_with, EnvelopedOptions};
    use gostsig_crypto::SigningKey;
    use gostsig_keys::x509::self_signed;

    fn signer(name: &str) -> (SigningKey, Certificate) {
        let key = SigningKey::random(&mut rand::thread_rng());
        let cert = self_signed(&key, name).unwrap();
        (key, cert)
    }

    fn reason(err: SignatureError) -> String {
        match err {
            SignatureError::Validation { reason, .. } => reason,
            other => panic!("expected a validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_enveloped_round_trip() {
        let (key, cert) = signer("alice");
        let ctx = DsigContext::new();
        let mut doc = Document::parse("<order><item qty=\"2\">tea</item></order>").unwrap();
        let root = doc.document_element().unwrap();
        sign_enveloped(&ctx, &mut doc, root, &key, &cert).unwrap();

        let reparsed = Document::parse(&doc.to_xml()).unwrap();
        let root = reparsed.document_element().unwrap();
        let signer_cert = validate_enveloped(&ctx, &reparsed, root).unwrap();
        assert_eq!(signer_cert, cert);
    }

    #[test]
    fn test_tampered_content_rejected() {
        let (key, cert) = signer("alice");
        let ctx = DsigContext::new();
        let mut doc = Document::parse("<order><item>tea</item></order>").unwrap();
        let root = doc.document_element().unwrap();
        sign_enveloped(&ctx, &mut doc, root, &key, &cert).unwrap();

        let tampered = doc.to_xml().replace(">tea<", ">coffee<");
        let tampered = Document::parse(&tampered).unwrap();
        let root = tampered.document_element().unwrap();
        let err = validate_enveloped(&ctx, &tampered, root).unwrap_err();
        assert_eq!(reason(err), SIGNATURE_INVALID);
    }

    #[test]
    fn test_unsigned_document() {
        let ctx = DsigContext::new();
        let doc = Document::parse("<order/>").unwrap();
        let root = doc.document_element().unwrap();
        assert!(validate_enveloped(&ctx, &doc, root).unwrap_err().is_not_signed());
        assert!(validate_all(&ctx, &doc).unwrap_err().is_not_signed());
    }

    #[test]
    fn test_missing_certificate() {
        let (key, cert) = signer("alice");
        let ctx = DsigContext::new();
        let mut doc = Document::parse(r#"<order Id="o"/>"#).unwrap();
        let root = doc.document_element().unwrap();
        sign_enveloped(&ctx, &mut doc, root, &key, &cert).unwrap();

        let signature = doc.find_element(root, ns::DSIG, ns::node::SIGNATURE).unwrap();
        let key_info = doc.child_element(signature, ns::DSIG, ns::node::KEY_INFO).unwrap();
        doc.detach(key_info).unwrap();

        let err = validate_enveloped(&ctx, &doc, root).unwrap_err();
        assert_eq!(reason(err), PUBLIC_KEY_NOT_FOUND);
    }

    #[test]
    fn test_detached_same_and_foreign_document() {
        let (key, cert) = signer("bob");
        let ctx = DsigContext::new();
        let mut doc = Document::parse(r#"<payload Id="p1"><v>1</v></payload>"#).unwrap();
        let content = doc.document_element().unwrap();
        let signature = sign_detached(&ctx, &mut doc, content, Some("s1"), &key, &cert).unwrap();

        // Same document, signature left unattached.
        assert_eq!(validate_detached(&ctx, &doc, content, &doc, signature).unwrap(), cert);

        // Signature shipped separately.
        let mut sig_doc = Document::new();
        let sig_root = sig_doc.root();
        sig_doc.import_and_append(sig_root, &doc, signature).unwrap();
        let sig_doc = Document::parse(&sig_doc.to_xml()).unwrap();
        let moved_sig = sig_doc.document_element().unwrap();
        let content_doc = Document::parse(r#"<payload Id="p1"><v>1</v></payload>"#).unwrap();
        let content = content_doc.document_element().unwrap();
        assert_eq!(
            validate_detached(&ctx, &content_doc, content, &sig_doc, moved_sig).unwrap(),
            cert
        );

        let altered = Document::parse(r#"<payload Id="p1"><v>2</v></payload>"#).unwrap();
        let content = altered.document_element().unwrap();
        let err = validate_detached(&ctx, &altered, content, &sig_doc, moved_sig).unwrap_err();
        assert_eq!(reason(err), SIGNATURE_INVALID);
    }

    #[test]
    fn test_validate_all_isolates_failures() {
        let ctx = DsigContext::new();
        let mut doc =
            Document::parse(r#"<batch><item Id="a">1</item><item Id="b">2</item><item Id="c">3</item></batch>"#)
                .unwrap();
        let root = doc.document_element().unwrap();
        let signers: Vec<_> = ["a", "b", "c"].iter().map(|n| signer(n)).collect();
        for (id, (key, cert)) in ["a", "b", "c"].iter().zip(&signers) {
            let path = format!("/batch/item[@Id='{id}']");
            let options = EnvelopedOptions {
                path: Some(&path),
                ..Default::default()
            };
            sign_enveloped_with(&ctx, &mut doc, root, &options, key, cert).unwrap();
        }

        let signatures = doc.find_elements(root, ns::DSIG, ns::node::SIGNATURE);
        assert_eq!(signatures.len(), 3);
        let key_info = doc.child_element(signatures[1], ns::DSIG, ns::node::KEY_INFO).unwrap();
        doc.detach(key_info).unwrap();

        let results = validate_all(&ctx, &doc).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].valid);
        assert_eq!(results[0].certificate.as_ref(), Some(&signers[0].1));
        assert!(!results[1].valid);
        assert!(results[1].certificate.is_none());
        assert_eq!(results[1].error.as_deref(), Some(PUBLIC_KEY_NOT_FOUND));
        assert!(results[2].valid);
        assert_eq!(results[2].certificate.as_ref(), Some(&signers[2].1));
    }
}
