#![forbid(unsafe_code)]

//! `SignatureProcessor`: the single entry point for signing and validating
//! XML documents and binary content under the GOST profile.

use gostsig_cms::VerifyResult;
use gostsig_core::{algorithm, SignatureError};
use gostsig_crypto::{DigestReader, SigningKey};
use gostsig_dsig::{DsigContext, EnvelopedOptions, ValidationResult};
use gostsig_keys::Certificate;
use gostsig_xml::{Document, NodeId};
use std::io::Read;

/// Signs and validates with a fixed algorithm profile.
///
/// A processor holds only configuration, so one instance can serve
/// concurrent calls as long as each call works on its own document.
#[derive(Debug, Clone, Default)]
pub struct SignatureProcessor {
    ctx: DsigContext,
}

impl SignatureProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a customised context (extra ID attributes, path prefixes).
    pub fn with_context(ctx: DsigContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &DsigContext {
        &self.ctx
    }

    // ── XML signing ──────────────────────────────────────────────────

    /// Sign `root` with an enveloped signature placed as its first child.
    pub fn sign_enveloped(
        &self,
        doc: &mut Document,
        root: NodeId,
        key: &SigningKey,
        cert: &Certificate,
    ) -> Result<(), SignatureError> {
        gostsig_dsig::sign_enveloped(&self.ctx, doc, root, key, cert)
    }

    /// Sign the element selected by `options.path` under `root`.
    pub fn sign_enveloped_with(
        &self,
        doc: &mut Document,
        root: NodeId,
        options: &EnvelopedOptions<'_>,
        key: &SigningKey,
        cert: &Certificate,
    ) -> Result<(), SignatureError> {
        gostsig_dsig::sign_enveloped_with(&self.ctx, doc, root, options, key, cert)
    }

    /// Build an unattached detached signature over `content`.
    pub fn sign_detached(
        &self,
        doc: &mut Document,
        content: NodeId,
        signature_id: Option<&str>,
        key: &SigningKey,
        cert: &Certificate,
    ) -> Result<NodeId, SignatureError> {
        gostsig_dsig::sign_detached(&self.ctx, doc, content, signature_id, key, cert)
    }

    // ── XML validation ───────────────────────────────────────────────

    pub fn validate_enveloped(
        &self,
        doc: &Document,
        content: NodeId,
    ) -> Result<Certificate, SignatureError> {
        gostsig_dsig::validate_enveloped(&self.ctx, doc, content)
    }

    pub fn validate_detached(
        &self,
        content_doc: &Document,
        content: NodeId,
        signature_doc: &Document,
        signature: NodeId,
    ) -> Result<Certificate, SignatureError> {
        gostsig_dsig::validate_detached(&self.ctx, content_doc, content, signature_doc, signature)
    }

    pub fn validate_all(&self, doc: &Document) -> Result<Vec<ValidationResult>, SignatureError> {
        gostsig_dsig::validate_all(&self.ctx, doc)
    }

    // ── Binary content ───────────────────────────────────────────────

    /// Wrap `input` so that everything read through it is digested.
    pub fn digest_reader<R: Read>(&self, input: R) -> DigestReader<R> {
        DigestReader::new(input)
    }

    /// Digest a whole stream with the profile digest; the stream is dropped
    /// before this returns.
    pub fn calculate_digest<R: Read>(&self, input: R) -> Result<Vec<u8>, SignatureError> {
        Ok(gostsig_crypto::calculate_digest(input, algorithm::profile::DIGEST)?)
    }

    /// Sign a precomputed digest into a detached PKCS#7 envelope.
    pub fn sign_pkcs7(
        &self,
        digest: &[u8],
        key: &SigningKey,
        cert: &Certificate,
    ) -> Result<Vec<u8>, SignatureError> {
        tracing::debug!(len = digest.len(), "signing binary digest");
        Ok(gostsig_cms::sign_detached(digest, key, cert)?)
    }

    /// Digest `content` and sign the result into a detached PKCS#7 envelope.
    pub fn sign_pkcs7_stream<R: Read>(
        &self,
        content: R,
        key: &SigningKey,
        cert: &Certificate,
    ) -> Result<Vec<u8>, SignatureError> {
        let digest = self.calculate_digest(content)?;
        self.sign_pkcs7(&digest, key, cert)
    }

    /// Check a detached PKCS#7 envelope against a precomputed digest.
    pub fn validate_pkcs7(
        &self,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<Certificate, SignatureError> {
        match gostsig_cms::verify_detached(digest, signature) {
            Ok(VerifyResult::Valid(cert)) => Ok(cert),
            Ok(VerifyResult::Invalid { reason }) => Err(SignatureError::invalid(reason)),
            Err(e) => Err(SignatureError::invalid_because(e)),
        }
    }

    /// Digest `content` and check a detached PKCS#7 envelope against it.
    pub fn validate_pkcs7_stream<R: Read>(
        &self,
        content: R,
        signature: &[u8],
    ) -> Result<Certificate, SignatureError> {
        let digest = self.calculate_digest(content)?;
        self.validate_pkcs7(&digest, signature)
    }
}
