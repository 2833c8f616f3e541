//! End-to-end behaviour of `SignatureProcessor` over XML and binary content.

use gostsig::dsig::reference::reference_uri;
use gostsig::dsig::verify::{PUBLIC_KEY_NOT_FOUND, SIGNATURE_INVALID};
use gostsig::keys::x509::self_signed;
use gostsig::core::ns;
use gostsig::{
    Certificate, Document, EnvelopedOptions, SignatureError, SignaturePosition, SignatureProcessor,
    SigningKey,
};
use std::cell::Cell;
use std::io::{self, Read};
use std::rc::Rc;

fn signer(name: &str) -> (SigningKey, Certificate) {
    let key = SigningKey::random(&mut rand::thread_rng());
    let cert = self_signed(&key, name).unwrap();
    (key, cert)
}

fn validation_reason(err: SignatureError) -> String {
    match err {
        SignatureError::Validation { reason, .. } => reason,
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

const ORDER: &str = r#"<order xmlns="urn:shop" xmlns:x="urn:x"><item x:sku="42">tea</item><note>  keep   spaces </note></order>"#;

#[test]
fn enveloped_round_trip_returns_signer() {
    let (key, cert) = signer("round-trip");
    let processor = SignatureProcessor::new();
    let mut doc = Document::parse(ORDER).unwrap();
    let root = doc.document_element().unwrap();
    processor.sign_enveloped(&mut doc, root, &key, &cert).unwrap();

    let wire = Document::parse(&doc.to_xml()).unwrap();
    let root = wire.document_element().unwrap();
    assert_eq!(processor.validate_enveloped(&wire, root).unwrap(), cert);
}

#[test]
fn detached_round_trip_returns_signer() {
    let (key, cert) = signer("detached");
    let processor = SignatureProcessor::new();
    let mut doc = Document::parse(r#"<msg Id="m-1"><body>hello</body></msg>"#).unwrap();
    let content = doc.document_element().unwrap();
    let signature = processor
        .sign_detached(&mut doc, content, Some("sig-m-1"), &key, &cert)
        .unwrap();

    assert_eq!(
        processor
            .validate_detached(&doc, content, &doc, signature)
            .unwrap(),
        cert
    );
}

#[test]
fn tampering_is_detected() {
    let (key, cert) = signer("tamper");
    let processor = SignatureProcessor::new();
    let mut doc = Document::parse(ORDER).unwrap();
    let root = doc.document_element().unwrap();
    processor.sign_enveloped(&mut doc, root, &key, &cert).unwrap();
    let signed = doc.to_xml();

    for (from, to) in [(">tea<", ">tee<"), ("sku=\"42\"", "sku=\"43\""), ("keep", "kept")] {
        let tampered = Document::parse(&signed.replace(from, to)).unwrap();
        let root = tampered.document_element().unwrap();
        let err = processor.validate_enveloped(&tampered, root).unwrap_err();
        assert_eq!(validation_reason(err), SIGNATURE_INVALID, "mutation {from} -> {to}");
    }
}

#[test]
fn reference_uri_resolution() {
    let doc = Document::parse(r##"<r><a/><b Id="abc"/><c Id="#abc"/></r>"##).unwrap();
    let root = doc.document_element().unwrap();
    let kids: Vec<_> = doc.children(root).collect();
    assert_eq!(reference_uri(&doc, kids[0]), "");
    assert_eq!(reference_uri(&doc, kids[1]), "#abc");
    assert_eq!(reference_uri(&doc, kids[2]), "#abc");
}

#[test]
fn detached_signature_moved_to_another_document() {
    let (key, cert) = signer("cross-doc");
    let processor = SignatureProcessor::new();
    let mut doc_a = Document::parse(r#"<invoice Id="inv"><sum>10</sum></invoice>"#).unwrap();
    let content = doc_a.document_element().unwrap();
    let signature = processor
        .sign_detached(&mut doc_a, content, None, &key, &cert)
        .unwrap();

    let mut doc_b = Document::parse("<envelope><header/></envelope>").unwrap();
    let envelope = doc_b.document_element().unwrap();
    let moved = doc_b.import_and_append(envelope, &doc_a, signature).unwrap();

    assert_eq!(
        processor
            .validate_detached(&doc_a, content, &doc_b, moved)
            .unwrap(),
        cert
    );
}

#[test]
fn detached_rejects_non_signature_root() {
    let processor = SignatureProcessor::new();
    let content_doc = Document::parse("<data/>").unwrap();
    let other = Document::parse(&format!(r#"<ds:Object xmlns:ds="{}"/>"#, ns::DSIG)).unwrap();
    let err = processor
        .validate_detached(
            &content_doc,
            content_doc.document_element().unwrap(),
            &other,
            other.document_element().unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, SignatureError::Validation { .. }));
}

#[test]
fn misplaced_enveloped_signature_validates() {
    let (key, cert) = signer("misplaced");
    let processor = SignatureProcessor::new();
    let mut doc =
        Document::parse(r#"<wrapper><meta/><payload Id="p"><v>1</v></payload></wrapper>"#).unwrap();
    let root = doc.document_element().unwrap();
    let options = EnvelopedOptions {
        path: Some("/wrapper/payload"),
        position: SignaturePosition::Last,
        signature_id: None,
    };
    processor
        .sign_enveloped_with(&mut doc, root, &options, &key, &cert)
        .unwrap();

    // The signature sits in `payload`, but the caller hands in the wrapper.
    let wire = Document::parse(&doc.to_xml()).unwrap();
    let wrapper = wire.document_element().unwrap();
    assert_eq!(processor.validate_enveloped(&wire, wrapper).unwrap(), cert);

    let unsigned = Document::parse(r#"<wrapper><payload Id="p"/></wrapper>"#).unwrap();
    let wrapper = unsigned.document_element().unwrap();
    assert!(processor
        .validate_enveloped(&unsigned, wrapper)
        .unwrap_err()
        .is_not_signed());
}

#[test]
fn enveloped_fragment_from_another_document_is_not_signed() {
    let (key, cert) = signer("fragment");
    let processor = SignatureProcessor::new();
    let mut signed = Document::parse(ORDER).unwrap();
    let root = signed.document_element().unwrap();
    processor.sign_enveloped(&mut signed, root, &key, &cert).unwrap();

    let unrelated = Document::parse(ORDER).unwrap();
    let foreign = unrelated.document_element().unwrap();
    let err = processor.validate_enveloped(&signed, foreign).unwrap_err();
    assert!(err.is_not_signed(), "{err:?}");
}

#[test]
fn non_root_element_without_path_is_signed_in_place() {
    let (key, cert) = signer("nested");
    let processor = SignatureProcessor::new();
    let mut doc = Document::parse("<outer><inner><v>1</v></inner></outer>").unwrap();
    let outer = doc.document_element().unwrap();
    let inner = doc.children(outer).next().unwrap();
    processor.sign_enveloped(&mut doc, inner, &key, &cert).unwrap();

    let first = doc.children(inner).next().unwrap();
    assert!(doc.is_named(first, ns::DSIG, ns::node::SIGNATURE));
    assert_eq!(processor.validate_enveloped(&doc, inner).unwrap(), cert);
}

#[test]
fn multi_signature_isolation() {
    let processor = SignatureProcessor::new();
    let mut doc = Document::parse(
        r#"<batch><entry Id="e1">a</entry><entry Id="e2">b</entry><entry Id="e3">c</entry></batch>"#,
    )
    .unwrap();
    let root = doc.document_element().unwrap();
    let signers: Vec<_> = ["one", "two", "three"].into_iter().map(signer).collect();
    for (i, (key, cert)) in signers.iter().enumerate() {
        let path = format!("/batch/entry[{}]", i + 1);
        let options = EnvelopedOptions {
            path: Some(&path),
            ..Default::default()
        };
        processor
            .sign_enveloped_with(&mut doc, root, &options, key, cert)
            .unwrap();
    }

    let signatures = doc.find_elements(root, ns::DSIG, ns::node::SIGNATURE);
    let key_info = doc
        .child_element(signatures[1], ns::DSIG, ns::node::KEY_INFO)
        .unwrap();
    doc.detach(key_info).unwrap();

    let wire = Document::parse(&doc.to_xml()).unwrap();
    let results = processor.validate_all(&wire).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0].valid);
    assert!(!results[1].valid);
    assert_eq!(results[1].error.as_deref(), Some(PUBLIC_KEY_NOT_FOUND));
    assert!(results[2].valid);
    assert_eq!(results[0].certificate.as_ref(), Some(&signers[0].1));
    assert_eq!(results[2].certificate.as_ref(), Some(&signers[2].1));
}

#[test]
fn zero_signatures_is_not_signed() {
    let processor = SignatureProcessor::new();
    let doc = Document::parse("<batch><entry/></batch>").unwrap();
    assert!(processor.validate_all(&doc).unwrap_err().is_not_signed());
}

struct Tracked {
    data: Vec<u8>,
    pos: usize,
    fail_after: Option<usize>,
    released: Rc<Cell<bool>>,
}

impl Read for Tracked {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_after.is_some_and(|n| self.pos >= n) {
            return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
        }
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

#[test]
fn stream_digest_releases_stream() {
    let processor = SignatureProcessor::new();
    for fail_after in [None, Some(4096)] {
        let released = Rc::new(Cell::new(false));
        let stream = Tracked {
            data: vec![7u8; 10_000],
            pos: 0,
            fail_after,
            released: Rc::clone(&released),
        };
        let result = processor.calculate_digest(stream);
        assert_eq!(result.is_ok(), fail_after.is_none());
        assert!(released.get());
    }
}

#[test]
fn binary_detached_signature() {
    let (key, cert) = signer("binary");
    let processor = SignatureProcessor::new();
    let content = b"%PDF-1.4 binary blob".to_vec();

    let envelope = processor
        .sign_pkcs7_stream(&content[..], &key, &cert)
        .unwrap();
    assert_eq!(
        processor
            .validate_pkcs7_stream(&content[..], &envelope)
            .unwrap(),
        cert
    );

    let other = processor.calculate_digest(&b"something else"[..]).unwrap();
    let err = processor.validate_pkcs7(&other, &envelope).unwrap_err();
    assert!(matches!(err, SignatureError::Validation { .. }));
}
