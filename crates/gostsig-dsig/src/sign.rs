#![forbid(unsafe_code)]

//! XML-DSig signature creation.
//!
//! Signatures always use the fixed profile: exclusive C14N for `SignedInfo`,
//! GOST R 34.11-94 digests, GOST R 34.10-2001 signature values and one
//! `Reference` whose transform chain is [enveloped-signature], exc-C14N,
//! SMEV.  The signer certificate is embedded in `KeyInfo`.

use crate::context::DsigContext;
use crate::reference::reference_uri;
use base64::Engine;
use gostsig_c14n::C14nMode;
use gostsig_core::{algorithm, ns, Error, SignatureError};
use gostsig_crypto::{digest, sign, SigningKey};
use gostsig_keys::{append_key_info, Certificate};
use gostsig_transforms::{uri, TransformData, TransformPipeline};
use gostsig_xml::{Document, NodeId, NodeSet, PathExpr, QName};

/// Where an enveloped signature is inserted among the children of the
/// signed element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignaturePosition {
    /// Before the first child.
    #[default]
    First,
    /// After the last child.
    Last,
}

/// Options for [`sign_enveloped_with`].
#[derive(Debug, Clone, Default)]
pub struct EnvelopedOptions<'a> {
    /// Path expression, evaluated against the document root element, that
    /// selects the element to sign.
    pub path: Option<&'a str>,
    /// Insertion point of the signature.
    pub position: SignaturePosition,
    /// `Id` attribute to set on the `Signature` element.
    pub signature_id: Option<&'a str>,
}

fn ds(local: &str) -> QName {
    QName::ns(Some(ns::DSIG_PREFIX), local, ns::DSIG)
}

fn with_algorithm(doc: &mut Document, local: &str, uri: &str) -> Result<NodeId, Error> {
    let node = doc.create_element(ds(local));
    let elem = doc
        .element_mut(node)
        .ok_or_else(|| Error::XmlStructure(format!("{local} is not an element")))?;
    elem.set_attribute(QName::local(ns::attr::ALGORITHM), uri);
    Ok(node)
}

/// Sign `root` in place with an enveloped signature inserted as its first child.
pub fn sign_enveloped(
    ctx: &DsigContext,
    doc: &mut Document,
    root: NodeId,
    key: &SigningKey,
    cert: &Certificate,
) -> Result<(), SignatureError> {
    sign_enveloped_with(ctx, doc, root, &EnvelopedOptions::default(), key, cert)
}

/// Sign an element of `doc` with an enveloped signature.
///
/// When `root` is the document element and no path is given the whole
/// document is signed where it stands.  Otherwise the element to sign
/// (`root`, or the element the path selects under it) is copied into a
/// fresh working document, signed there, and only the finished `Signature`
/// is imported back and inserted into the original element.  Nothing is
/// attached to `doc` unless signing succeeds.
pub fn sign_enveloped_with(
    ctx: &DsigContext,
    doc: &mut Document,
    root: NodeId,
    options: &EnvelopedOptions<'_>,
    key: &SigningKey,
    cert: &Certificate,
) -> Result<(), SignatureError> {
    if !doc.is_element(root) {
        return Err(Error::XmlStructure("the document root must be an element".into()).into());
    }
    let target = match options.path {
        None => root,
        Some(expr) => {
            let path = PathExpr::compile(expr, |p| ctx.resolve_prefix(p))?;
            path.select(doc, root)
                .into_iter()
                .find(|&n| doc.is_element(n))
                .ok_or_else(|| Error::MissingElement(format!("no element matches '{expr}'")))?
        }
    };

    let in_place = options.path.is_none() && doc.parent(root) == Some(doc.root());
    let signature = if in_place {
        tracing::debug!("signing document in place");
        build_signature(ctx, doc, root, true, options.signature_id, key, cert)?
    } else {
        tracing::debug!(path = ?options.path, "signing a copy of the selected element");
        let mut working = Document::new();
        let working_root = working.root();
        let copy = working.import_and_append(working_root, doc, target)?;
        let signed = build_signature(ctx, &mut working, copy, true, options.signature_id, key, cert)?;
        doc.import_node(&working, signed)?
    };

    match options.position {
        SignaturePosition::First => doc.prepend_child(target, signature)?,
        SignaturePosition::Last => doc.append_child(target, signature)?,
    };
    Ok(())
}

/// Build a detached signature over `content`.
///
/// The returned `Signature` element belongs to `doc` but is not attached
/// anywhere; the caller decides where it goes.
pub fn sign_detached(
    ctx: &DsigContext,
    doc: &mut Document,
    content: NodeId,
    signature_id: Option<&str>,
    key: &SigningKey,
    cert: &Certificate,
) -> Result<NodeId, SignatureError> {
    if !doc.is_element(content) {
        return Err(Error::XmlStructure("signed content must be an element".into()).into());
    }
    Ok(build_signature(ctx, doc, content, false, signature_id, key, cert)?)
}

/// Build a complete, unattached `Signature` element for `signed`.
fn build_signature(
    ctx: &DsigContext,
    doc: &mut Document,
    signed: NodeId,
    enveloped: bool,
    signature_id: Option<&str>,
    key: &SigningKey,
    cert: &Certificate,
) -> Result<NodeId, Error> {
    let engine = base64::engine::general_purpose::STANDARD;
    let ref_uri = reference_uri(doc, signed);

    // ── Skeleton ─────────────────────────────────────────────────────
    let signature = doc.create_element(ds(ns::node::SIGNATURE));
    if let Some(id) = signature_id {
        if let Some(elem) = doc.element_mut(signature) {
            elem.set_attribute(QName::local(ns::attr::ID), id);
        }
    }
    let signed_info = doc.create_element(ds(ns::node::SIGNED_INFO));
    doc.append_child(signature, signed_info)?;
    let c14n_method = with_algorithm(
        doc,
        ns::node::CANONICALIZATION_METHOD,
        algorithm::profile::CANONICALIZATION,
    )?;
    doc.append_child(signed_info, c14n_method)?;
    let sig_method = with_algorithm(doc, ns::node::SIGNATURE_METHOD, algorithm::profile::SIGNATURE)?;
    doc.append_child(signed_info, sig_method)?;

    let reference = doc.create_element(ds(ns::node::REFERENCE));
    if let Some(elem) = doc.element_mut(reference) {
        elem.set_attribute(QName::local(ns::attr::URI), ref_uri.as_str());
    }
    doc.append_child(signed_info, reference)?;

    let pipeline = TransformPipeline::for_profile(enveloped.then_some(signature));
    let transforms = doc.create_element(ds(ns::node::TRANSFORMS));
    for transform_uri in pipeline.uris() {
        let transform = with_algorithm(doc, ns::node::TRANSFORM, transform_uri)?;
        doc.append_child(transforms, transform)?;
    }
    doc.append_child(reference, transforms)?;
    let digest_method = with_algorithm(doc, ns::node::DIGEST_METHOD, algorithm::profile::DIGEST)?;
    doc.append_child(reference, digest_method)?;
    let digest_value = doc.create_element(ds(ns::node::DIGEST_VALUE));
    doc.append_child(reference, digest_value)?;

    // ── Reference digest ─────────────────────────────────────────────
    let id_map = doc.build_id_map(&ctx.id_attrs);
    let node_set = uri::resolve_uri(&ref_uri, doc, &id_map)?;
    let octets = pipeline.execute(TransformData::Xml {
        doc: &*doc,
        node_set: Some(node_set),
    })?;
    tracing::trace!(
        uri = %ref_uri,
        content = %String::from_utf8_lossy(&octets),
        "pre-digest reference content"
    );
    let digest = digest::digest(algorithm::profile::DIGEST, &octets)?;
    doc.set_text(digest_value, engine.encode(&digest))?;

    // ── Signature value ──────────────────────────────────────────────
    let c14n_signed_info = gostsig_c14n::canonicalize(
        doc,
        C14nMode::Exclusive,
        Some(&NodeSet::tree_without_comments(signed_info)),
    )?;
    tracing::trace!(
        signed_info = %String::from_utf8_lossy(&c14n_signed_info),
        "canonical SignedInfo"
    );
    let sig_alg = sign::from_uri(algorithm::profile::SIGNATURE)?;
    let sig_value = sig_alg.sign(key, &c14n_signed_info)?;
    let sig_value_node = doc.create_element(ds(ns::node::SIGNATURE_VALUE));
    doc.set_text(sig_value_node, engine.encode(&sig_value))?;
    doc.append_child(signature, sig_value_node)?;

    append_key_info(doc, signature, cert)?;
    tracing::debug!(uri = %ref_uri, enveloped, "signature built");
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gostsig_keys::x509::self_signed;

    fn signer() -> (SigningKey, Certificate) {
        let key = SigningKey::random(&mut rand::thread_rng());
        let cert = self_signed(&key, "sign-test").unwrap();
        (key, cert)
    }

    fn transform_uris(doc: &Document, signature: NodeId) -> Vec<String> {
        doc.find_elements(signature, ns::DSIG, ns::node::TRANSFORM)
            .into_iter()
            .filter_map(|t| doc.element(t)?.attribute(ns::attr::ALGORITHM).map(str::to_owned))
            .collect()
    }

    #[test]
    fn test_enveloped_in_place_first_child() {
        let (key, cert) = signer();
        let ctx = DsigContext::new();
        let mut doc = Document::parse(r#"<doc><a>1</a></doc>"#).unwrap();
        let root = doc.document_element().unwrap();

        sign_enveloped(&ctx, &mut doc, root, &key, &cert).unwrap();

        let first = doc.children(root).next().unwrap();
        assert!(doc.is_named(first, ns::DSIG, ns::node::SIGNATURE));
        let reference = doc.find_element(first, ns::DSIG, ns::node::REFERENCE).unwrap();
        assert_eq!(doc.element(reference).unwrap().attribute("URI"), Some(""));
        assert_eq!(
            transform_uris(&doc, first),
            vec![
                algorithm::ENVELOPED_SIGNATURE,
                algorithm::EXC_C14N,
                algorithm::SMEV_TRANSFORM
            ]
        );
        assert!(doc.find_element(first, ns::DSIG, ns::node::X509_CERTIFICATE).is_some());
    }

    #[test]
    fn test_enveloped_with_path_last_and_id() {
        let (key, cert) = signer();
        let ctx = DsigContext::new();
        let mut doc = Document::parse(r#"<env><body Id="b1"><x/></body></env>"#).unwrap();
        let root = doc.document_element().unwrap();
        let options = EnvelopedOptions {
            path: Some("/env/body"),
            position: SignaturePosition::Last,
            signature_id: Some("sig-1"),
        };

        sign_enveloped_with(&ctx, &mut doc, root, &options, &key, &cert).unwrap();

        let body = doc.child_element(root, "", "body").unwrap();
        let last = doc.children(body).last().unwrap();
        assert!(doc.is_named(last, ns::DSIG, ns::node::SIGNATURE));
        assert_eq!(doc.element(last).unwrap().attribute("Id"), Some("sig-1"));
        let reference = doc.find_element(last, ns::DSIG, ns::node::REFERENCE).unwrap();
        assert_eq!(doc.element(reference).unwrap().attribute("URI"), Some("#b1"));
        // Nothing was added outside the selected element.
        assert_eq!(doc.find_elements(root, ns::DSIG, ns::node::SIGNATURE).len(), 1);
    }

    #[test]
    fn test_path_with_axis_and_prefix() {
        let (key, cert) = signer();
        let mut ctx = DsigContext::new();
        ctx.add_namespace("m", "urn:msg");
        let mut doc = Document::parse(
            r#"<env xmlns:m="urn:msg"><head/><m:body Id="first"/><m:body Id="second"/></env>"#,
        )
        .unwrap();
        let root = doc.document_element().unwrap();
        let options = EnvelopedOptions {
            path: Some("/env/head/following-sibling::m:body[last()]"),
            ..Default::default()
        };

        sign_enveloped_with(&ctx, &mut doc, root, &options, &key, &cert).unwrap();

        let bodies = doc.child_elements(root, "urn:msg", "body");
        assert!(doc.child_element(bodies[0], ns::DSIG, ns::node::SIGNATURE).is_none());
        let signature = doc.child_element(bodies[1], ns::DSIG, ns::node::SIGNATURE).unwrap();
        let reference = doc.find_element(signature, ns::DSIG, ns::node::REFERENCE).unwrap();
        assert_eq!(doc.element(reference).unwrap().attribute("URI"), Some("#second"));
    }

    #[test]
    fn test_unmatched_path_leaves_document_untouched() {
        let (key, cert) = signer();
        let ctx = DsigContext::new();
        let mut doc = Document::parse("<env><body/></env>").unwrap();
        let before = doc.to_xml();
        let root = doc.document_element().unwrap();
        let options = EnvelopedOptions {
            path: Some("/env/missing"),
            ..Default::default()
        };

        let err = sign_enveloped_with(&ctx, &mut doc, root, &options, &key, &cert).unwrap_err();
        assert!(matches!(err, SignatureError::Processing(Error::MissingElement(_))));
        assert_eq!(doc.to_xml(), before);
    }

    #[test]
    fn test_detached_is_unattached() {
        let (key, cert) = signer();
        let ctx = DsigContext::new();
        let mut doc = Document::parse(r#"<data Id="d"><v>42</v></data>"#).unwrap();
        let before = doc.to_xml();
        let content = doc.document_element().unwrap();

        let signature = sign_detached(&ctx, &mut doc, content, None, &key, &cert).unwrap();

        assert_eq!(doc.parent(signature), None);
        assert_eq!(doc.to_xml(), before);
        assert_eq!(
            transform_uris(&doc, signature),
            vec![algorithm::EXC_C14N, algorithm::SMEV_TRANSFORM]
        );
        let reference = doc.find_element(signature, ns::DSIG, ns::node::REFERENCE).unwrap();
        assert_eq!(doc.element(reference).unwrap().attribute("URI"), Some("#d"));
    }
}
