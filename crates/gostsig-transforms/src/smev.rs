#![forbid(unsafe_code)]

//! SMEV content-preparation transform (`urn://smev-gov-ru/xmldsig/transform`).
//!
//! Applied after canonicalization.  The output is a normalized
//! serialization in which:
//! - the XML declaration, processing instructions and comments are dropped
//! - whitespace-only text nodes are dropped
//! - empty elements are written as a start tag plus an end tag
//! - every namespace prefix, the default namespace included, is replaced by
//!   a generated `ns1`, `ns2`, ... prefix numbered in order of first use
//! - a namespace is declared on the element where it is first needed in
//!   scope; declarations nothing uses are dropped
//! - attributes are ordered unqualified first, then by namespace URI and
//!   local name

use crate::pipeline::{Transform, TransformData};
use gostsig_core::{algorithm, ns, Error};
use uppsala::{Document, NodeId, NodeKind};

pub struct SmevTransform;

impl Transform for SmevTransform {
    fn uri(&self) -> &str {
        algorithm::SMEV_TRANSFORM
    }

    fn execute<'a>(&self, input: TransformData<'a>) -> Result<TransformData<'a>, Error> {
        let bytes = input.into_binary()?;
        Ok(TransformData::Binary(prepare(&bytes)?))
    }
}

/// Apply the SMEV normalization to serialized XML.
pub fn prepare(xml: &[u8]) -> Result<Vec<u8>, Error> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| Error::Transform(format!("SMEV transform: invalid UTF-8: {e}")))?;
    let doc = uppsala::parse(text).map_err(|e| Error::XmlParse(e.to_string()))?;

    let mut root = None;
    for child in doc.children(doc.root()) {
        if doc.element(child).is_some() {
            root = Some(child);
            break;
        }
    }
    let root = root.ok_or_else(|| Error::Transform("SMEV transform: no root element".into()))?;

    let mut writer = SmevWriter {
        doc: &doc,
        out: uppsala::XmlWriter::new(),
        scope: Vec::new(),
        counter: 0,
    };
    writer.write(root);
    Ok(writer.out.into_bytes())
}

enum Step {
    Open(NodeId),
    /// Close tag name and the scope length to restore.
    Close(String, usize),
}

struct SmevWriter<'a, 'doc> {
    doc: &'a Document<'doc>,
    out: uppsala::XmlWriter,
    /// `(namespace URI, generated prefix)` bindings, innermost last.
    scope: Vec<(String, String)>,
    counter: usize,
}

impl<'a, 'doc> SmevWriter<'a, 'doc> {
    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.scope
            .iter()
            .rev()
            .find(|(u, _)| u == uri)
            .map(|(_, p)| p.as_str())
    }

    /// Bind `uri` if it is not in scope yet; returns the declaration to write.
    fn bind(&mut self, uri: &str) -> Option<(String, String)> {
        if self.prefix_for(uri).is_some() {
            return None;
        }
        self.counter += 1;
        let prefix = format!("ns{}", self.counter);
        self.scope.push((uri.to_owned(), prefix.clone()));
        Some((format!("xmlns:{prefix}"), uri.to_owned()))
    }

    fn qualify(&self, uri: Option<&str>, local: &str) -> String {
        match uri {
            Some(ns::XML) => format!("xml:{local}"),
            Some(u) => match self.prefix_for(u) {
                Some(p) => format!("{p}:{local}"),
                None => local.to_owned(),
            },
            None => local.to_owned(),
        }
    }

    fn write(&mut self, top: NodeId) {
        let doc = self.doc;
        let mut steps = vec![Step::Open(top)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Open(node) => {
                    if let Some(close) = self.open(node) {
                        steps.push(close);
                        let mark = steps.len();
                        for child in doc.children(node) {
                            steps.push(Step::Open(child));
                        }
                        steps[mark..].reverse();
                    }
                }
                Step::Close(name, mark) => {
                    self.out.end_element(&name);
                    self.scope.truncate(mark);
                }
            }
        }
    }

    /// Write the start tag of an element or the content of a text node.
    /// Returns the matching close step for elements.
    fn open(&mut self, node: NodeId) -> Option<Step> {
        let doc = self.doc;
        match doc.node_kind(node)? {
            NodeKind::Element(_) => {}
            NodeKind::Text(text) | NodeKind::CData(text) => {
                let text = text.to_string();
                if !text.trim().is_empty() {
                    self.out.text(&text);
                }
                return None;
            }
            _ => return None,
        }
        let elem = doc.element(node)?;
        let mark = self.scope.len();

        let element_ns = elem
            .name
            .namespace_uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(str::to_owned);
        let local = elem.name.local_name.to_string();

        let mut declarations = Vec::new();
        if let Some(uri) = &element_ns {
            declarations.extend(self.bind(uri));
        }

        let mut attrs: Vec<(Option<String>, String, String)> = Vec::new();
        for attr in &elem.attributes {
            let local = attr.name.local_name.to_string();
            let prefix = attr.name.prefix.as_deref().unwrap_or("");
            if prefix == "xmlns" || (prefix.is_empty() && local == "xmlns") {
                continue;
            }
            let uri = attr
                .name
                .namespace_uri
                .as_deref()
                .filter(|u| !u.is_empty())
                .map(str::to_owned);
            attrs.push((uri, local, attr.value.to_string()));
        }
        attrs.sort_by(|a, b| {
            a.0.is_some()
                .cmp(&b.0.is_some())
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });
        for (uri, _, _) in &attrs {
            if let Some(uri) = uri.as_deref().filter(|u| *u != ns::XML) {
                declarations.extend(self.bind(uri));
            }
        }

        let name = self.qualify(element_ns.as_deref(), &local);
        let mut written: Vec<(String, String)> = declarations;
        for (uri, local, value) in &attrs {
            written.push((self.qualify(uri.as_deref(), local), value.clone()));
        }
        let written: Vec<(&str, &str)> = written
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        self.out.start_element(&name, &written);
        Some(Step::Close(name, mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(xml: &str) -> String {
        String::from_utf8(prepare(xml.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_prefixes_renumbered() {
        assert_eq!(
            run(r#"<a:r xmlns:a="urn:a" xmlns:unused="urn:u"><b xmlns="urn:b"><a:c/></b></a:r>"#),
            r#"<ns1:r xmlns:ns1="urn:a"><ns2:b xmlns:ns2="urn:b"><ns1:c></ns1:c></ns2:b></ns1:r>"#
        );
    }

    #[test]
    fn test_sibling_scopes_get_fresh_prefixes() {
        assert_eq!(
            run(r#"<r><x:a xmlns:x="urn:x"/><x:b xmlns:x="urn:x"/></r>"#),
            r#"<r><ns1:a xmlns:ns1="urn:x"></ns1:a><ns2:b xmlns:ns2="urn:x"></ns2:b></r>"#
        );
    }

    #[test]
    fn test_whitespace_and_attribute_order() {
        assert_eq!(
            run("<?xml version=\"1.0\"?>\n<r xmlns:p=\"urn:p\" p:z=\"1\" b=\"2\" a=\"&amp;\">\n  <!--c--><?pi?>\n  <t> x </t>\n</r>"),
            r#"<r xmlns:ns1="urn:p" a="&amp;" b="2" ns1:z="1"><t> x </t></r>"#
        );
    }
}
