#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use crate::enveloped::EnvelopedSignatureTransform;
use crate::smev::SmevTransform;
use gostsig_c14n::C14nMode;
use gostsig_core::{algorithm, Error};
use gostsig_xml::{Document, NodeId, NodeSet};

/// Data flowing through the transform pipeline.
pub enum TransformData<'a> {
    /// A node set over a borrowed document (for XML-aware transforms).
    Xml {
        doc: &'a Document,
        node_set: Option<NodeSet>,
    },
    /// Raw octets.
    Binary(Vec<u8>),
}

impl<'a> TransformData<'a> {
    /// Convert to octets, applying exclusive C14N to a node set.
    pub fn into_binary(self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml { doc, node_set } => {
                gostsig_c14n::canonicalize(doc, C14nMode::Exclusive, node_set.as_ref())
            }
        }
    }
}

/// Trait for individual transforms.
pub trait Transform: Send + Sync {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    /// Execute the transform on the given data.
    fn execute<'a>(&self, input: TransformData<'a>) -> Result<TransformData<'a>, Error>;
}

/// A pipeline of transforms executed in sequence.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// The fixed signing chain: [enveloped-signature], exc-C14N, SMEV.
    ///
    /// `enveloping_signature` is the `Signature` element to remove when the
    /// signature is enveloped; `None` builds the detached chain.
    pub fn for_profile(enveloping_signature: Option<NodeId>) -> Self {
        let mut pipeline = Self::new();
        if let Some(signature) = enveloping_signature {
            pipeline.push(Box::new(EnvelopedSignatureTransform::new(signature)));
        }
        pipeline.push(Box::new(C14nTransform::new(C14nMode::Exclusive)));
        pipeline.push(Box::new(SmevTransform));
        pipeline
    }

    /// Build a pipeline from the `Algorithm` URIs of a `Transforms` element.
    ///
    /// `signature` is the `Signature` element the reference belongs to; the
    /// enveloped-signature transform removes it.
    pub fn from_uris<S: AsRef<str>>(uris: &[S], signature: NodeId) -> Result<Self, Error> {
        let mut pipeline = Self::new();
        for uri in uris {
            let uri = uri.as_ref();
            let transform: Box<dyn Transform> = match uri {
                algorithm::ENVELOPED_SIGNATURE => {
                    Box::new(EnvelopedSignatureTransform::new(signature))
                }
                algorithm::SMEV_TRANSFORM => Box::new(SmevTransform),
                other => match C14nMode::from_uri(other) {
                    Some(mode) => Box::new(C14nTransform::new(mode)),
                    None => {
                        return Err(Error::UnsupportedAlgorithm(format!("transform: {other}")))
                    }
                },
            };
            pipeline.push(transform);
        }
        Ok(pipeline)
    }

    /// Add a transform to the pipeline.
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Execute all transforms in order and return the octets to digest.
    pub fn execute(&self, input: TransformData<'_>) -> Result<Vec<u8>, Error> {
        let mut data = input;
        for transform in &self.transforms {
            data = transform.execute(data)?;
        }
        data.into_binary()
    }

    /// Algorithm URIs in pipeline order.
    pub fn uris(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.uri()).collect()
    }

    /// Number of transforms in the pipeline.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

// ── C14N Transform ───────────────────────────────────────────────────

/// A canonicalization transform.
pub struct C14nTransform {
    mode: C14nMode,
}

impl C14nTransform {
    pub fn new(mode: C14nMode) -> Self {
        Self { mode }
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute<'a>(&self, input: TransformData<'a>) -> Result<TransformData<'a>, Error> {
        let bytes = match input {
            TransformData::Xml { doc, node_set } => {
                gostsig_c14n::canonicalize(doc, self.mode, node_set.as_ref())?
            }
            TransformData::Binary(data) => {
                let doc = Document::parse_bytes(&data)?;
                gostsig_c14n::canonicalize(&doc, self.mode, None)?
            }
        };
        Ok(TransformData::Binary(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_chain_order() {
        let doc = Document::parse("<r><s/></r>").unwrap();
        let r = doc.document_element().unwrap();
        let s = doc.children(r).next().unwrap();

        let enveloped = TransformPipeline::for_profile(Some(s));
        assert_eq!(
            enveloped.uris(),
            [
                algorithm::ENVELOPED_SIGNATURE,
                algorithm::EXC_C14N,
                algorithm::SMEV_TRANSFORM
            ]
        );
        let detached = TransformPipeline::for_profile(None);
        assert_eq!(detached.uris(), [algorithm::EXC_C14N, algorithm::SMEV_TRANSFORM]);
    }

    #[test]
    fn test_from_uris_rejects_unknown() {
        let doc = Document::parse("<r/>").unwrap();
        let r = doc.document_element().unwrap();
        let err = TransformPipeline::from_uris(&["urn:unknown"], r);
        assert!(matches!(err, Err(Error::UnsupportedAlgorithm(_))));

        let ok = TransformPipeline::from_uris(&[algorithm::EXC_C14N], r).unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_execute_removes_signature() {
        let doc = Document::parse(r#"<r a="1"><x>1</x><s>sig</s></r>"#).unwrap();
        let r = doc.document_element().unwrap();
        let s = doc.children(r).nth(1).unwrap();
        let pipeline = TransformPipeline::for_profile(Some(s));
        let out = pipeline
            .execute(TransformData::Xml {
                doc: &doc,
                node_set: Some(NodeSet::tree_without_comments(r)),
            })
            .unwrap();
        assert_eq!(out, br#"<r a="1"><x>1</x></r>"#);
    }
}
