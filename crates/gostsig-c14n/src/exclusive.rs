#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only "visibly utilized" namespace declarations are output.  A namespace
//! is visibly utilized if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes.
//!
//! The binding is taken from the name itself rather than from stored
//! declarations, so elements built in memory canonicalize the same as
//! parsed ones.

use crate::render::{escape_pi, escape_text, Attr, NsDecl};
use gostsig_core::{ns, Error};
use gostsig_xml::{Document, NodeId, NodeKind, NodeSet};
use std::collections::BTreeMap;

/// Canonicalize using Exclusive C14N 1.0.
///
/// Without a node set the whole document is canonicalized.
pub fn canonicalize(
    doc: &Document,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let start = node_set.map_or_else(|| doc.root(), NodeSet::apex);
    if !doc.owns(start) {
        return Err(Error::Canonicalization(
            "node set does not belong to the document".into(),
        ));
    }
    let ctx = ExcC14nContext {
        doc,
        with_comments,
        node_set,
    };
    ctx.run(start)
}

struct ExcC14nContext<'a> {
    doc: &'a Document,
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
}

/// Children still to visit under one open element (or the document node).
struct Frame {
    children: Vec<NodeId>,
    next: usize,
    /// Namespace bindings rendered on the output ancestors of the children.
    rendered_ns: BTreeMap<String, String>,
    /// End tag to write once the children are done.
    close: Option<String>,
}

impl<'a> ExcC14nContext<'a> {
    fn is_visible(&self, id: NodeId) -> bool {
        match self.node_set {
            None => true,
            Some(set) => set.contains(self.doc, id),
        }
    }

    fn run(&self, start: NodeId) -> Result<Vec<u8>, Error> {
        let mut output = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.process_node(start, &mut output, &BTreeMap::new())? {
            stack.push(frame);
        }
        while let Some(top) = stack.last_mut() {
            let Some(&child) = top.children.get(top.next) else {
                if let Some(name) = &top.close {
                    output.extend_from_slice(b"</");
                    output.extend_from_slice(name.as_bytes());
                    output.push(b'>');
                }
                stack.pop();
                continue;
            };
            top.next += 1;
            if let Some(frame) = self.process_node(child, &mut output, &top.rendered_ns)? {
                stack.push(frame);
            }
        }
        Ok(output)
    }

    /// Write what `id` contributes before its children.  Returns a frame
    /// when the children still have to be visited.
    fn process_node(
        &self,
        id: NodeId,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<Option<Frame>, Error> {
        match self.doc.kind(id) {
            Some(NodeKind::Document) => {
                return Ok(Some(Frame {
                    children: self.doc.children(id).collect(),
                    next: 0,
                    rendered_ns: rendered_ns.clone(),
                    close: None,
                }));
            }
            Some(NodeKind::Element(_)) => {
                if self.is_visible(id) {
                    return self.process_element(id, output, rendered_ns).map(Some);
                }
            }
            Some(NodeKind::Text(text)) => {
                // Text directly under the document node is not part of the infoset.
                if self.is_visible(id) && !self.parent_is_root(id) {
                    output.extend_from_slice(escape_text(text).as_bytes());
                }
            }
            Some(NodeKind::Comment(text)) => {
                if self.with_comments && self.is_visible(id) {
                    self.top_level_break_before(id, output);
                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(text.as_bytes());
                    output.extend_from_slice(b"-->");
                    self.top_level_break_after(id, output);
                }
            }
            Some(NodeKind::ProcessingInstruction { target, data }) => {
                if self.is_visible(id) {
                    self.top_level_break_before(id, output);
                    output.extend_from_slice(b"<?");
                    output.extend_from_slice(target.as_bytes());
                    if let Some(value) = data {
                        if !value.is_empty() {
                            output.push(b' ');
                            output.extend_from_slice(escape_pi(value).as_bytes());
                        }
                    }
                    output.extend_from_slice(b"?>");
                    self.top_level_break_after(id, output);
                }
            }
            None => {
                return Err(Error::Canonicalization(
                    "node does not belong to the document".into(),
                ))
            }
        }
        Ok(None)
    }

    fn parent_is_root(&self, id: NodeId) -> bool {
        self.doc
            .parent(id)
            .is_some_and(|p| matches!(self.doc.kind(p), Some(NodeKind::Document)))
    }

    fn top_level_break_before(&self, id: NodeId, output: &mut Vec<u8>) {
        if self.parent_is_root(id) && has_preceding_element(self.doc, id) {
            output.push(b'\n');
        }
    }

    fn top_level_break_after(&self, id: NodeId, output: &mut Vec<u8>) {
        if self.parent_is_root(id) && has_following_element(self.doc, id) {
            output.push(b'\n');
        }
    }

    /// Write the start tag of a visible element.
    fn process_element(
        &self,
        id: NodeId,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<Frame, Error> {
        let elem = self
            .doc
            .element(id)
            .ok_or_else(|| Error::Canonicalization("expected an element".into()))?;

        // Prefixes visibly utilized here, with the namespace each one names.
        let mut utilized: BTreeMap<String, String> = BTreeMap::new();
        utilized.insert(elem.name.prefix().to_owned(), elem.name.namespace().to_owned());
        for attr in &elem.attributes {
            if let Some(prefix) = &attr.name.prefix {
                if attr.name.namespace() != ns::XML {
                    utilized.insert(prefix.clone(), attr.name.namespace().to_owned());
                }
            }
        }

        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for (prefix, uri) in &utilized {
            if prefix == "xml" {
                continue;
            }
            let previously_rendered = rendered_ns.get(prefix).map(String::as_str);
            if prefix.is_empty() && uri.is_empty() {
                // xmlns="" only undoes a non-empty default rendered above.
                if previously_rendered.is_some_and(|u| !u.is_empty()) {
                    ns_decls.push(NsDecl {
                        prefix: String::new(),
                        uri: String::new(),
                    });
                }
            } else if previously_rendered != Some(uri.as_str()) {
                ns_decls.push(NsDecl {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                });
            }
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = elem
            .attributes
            .iter()
            .map(|attr| Attr {
                ns_uri: attr.name.namespace().to_owned(),
                local_name: attr.name.local_name.clone(),
                qualified_name: attr.name.qualified(),
                value: attr.value.clone(),
            })
            .collect();
        attrs.sort();

        let elem_name = elem.name.qualified();
        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for ns_decl in &ns_decls {
            ns_decl.write_to(output);
        }
        for attr in &attrs {
            attr.write_to(output);
        }
        output.push(b'>');

        let mut child_rendered_ns = rendered_ns.clone();
        for ns_decl in &ns_decls {
            child_rendered_ns.insert(ns_decl.prefix.clone(), ns_decl.uri.clone());
        }
        Ok(Frame {
            children: self.doc.children(id).collect(),
            next: 0,
            rendered_ns: child_rendered_ns,
            close: Some(elem_name),
        })
    }
}

/// Check if any preceding sibling is an element.
fn has_preceding_element(doc: &Document, id: NodeId) -> bool {
    let mut sib = doc.previous_sibling(id);
    while let Some(s) = sib {
        if doc.is_element(s) {
            return true;
        }
        sib = doc.previous_sibling(s);
    }
    false
}

/// Check if any following sibling is an element.
fn has_following_element(doc: &Document, id: NodeId) -> bool {
    let mut sib = doc.next_sibling(id);
    while let Some(s) = sib {
        if doc.is_element(s) {
            return true;
        }
        sib = doc.next_sibling(s);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str) -> String {
        let doc = Document::parse(xml).unwrap();
        String::from_utf8(canonicalize(&doc, false, None).unwrap()).unwrap()
    }

    #[test]
    fn test_unused_namespaces_dropped() {
        assert_eq!(
            c14n(r#"<a:r xmlns:a="urn:a" xmlns:b="urn:b"><b:c/><d/></a:r>"#),
            r#"<a:r xmlns:a="urn:a"><b:c xmlns:b="urn:b"></b:c><d></d></a:r>"#
        );
    }

    #[test]
    fn test_attribute_order_and_escaping() {
        assert_eq!(
            c14n(r#"<r xmlns:p="urn:p" z="1" p:a="2" b="&lt;&quot;"/>"#),
            r#"<r xmlns:p="urn:p" b="&lt;&quot;" z="1" p:a="2"></r>"#
        );
    }

    #[test]
    fn test_default_namespace_undeclared() {
        assert_eq!(
            c14n(r#"<r xmlns="urn:d"><x xmlns=""/></r>"#),
            r#"<r xmlns="urn:d"><x xmlns=""></x></r>"#
        );
    }

    #[test]
    fn test_deep_nesting() {
        let mut doc = Document::new();
        let mut parent = doc.root();
        for _ in 0..50_000 {
            let e = doc.create_element(gostsig_xml::QName::local("n"));
            doc.append_child(parent, e).unwrap();
            parent = e;
        }
        let out = canonicalize(&doc, false, None).unwrap();
        assert_eq!(out.len(), 50_000 * "<n></n>".len());
        assert!(out.starts_with(b"<n><n>"));
        assert!(out.ends_with(b"</n></n>"));
    }

    #[test]
    fn test_subtree_and_comments() {
        let doc = Document::parse(r#"<?pi x?><r xmlns:a="urn:a"><a:k><!--c-->t</a:k></r>"#).unwrap();
        let r = doc.document_element().unwrap();
        let k = doc.children(r).next().unwrap();

        let without = canonicalize(&doc, false, Some(&NodeSet::tree_without_comments(k))).unwrap();
        assert_eq!(without, br#"<a:k xmlns:a="urn:a">t</a:k>"#);
        let with = canonicalize(&doc, true, Some(&NodeSet::tree(k))).unwrap();
        assert_eq!(with, br#"<a:k xmlns:a="urn:a"><!--c-->t</a:k>"#);

        let whole = canonicalize(&doc, false, None).unwrap();
        assert_eq!(whole, b"<?pi x?>\n<r><a:k xmlns:a=\"urn:a\">t</a:k></r>".to_vec());
    }
}
