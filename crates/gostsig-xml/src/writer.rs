#![forbid(unsafe_code)]

//! Serialization of a [`Document`] (or a subtree) back to XML text.
//!
//! Markup goes through `uppsala::XmlWriter`.  Declarations stored on
//! elements are written as-is.  Elements and attributes created
//! programmatically carry only a qualified name, so the writer adds any
//! binding their prefix needs that is not already in scope.

use crate::document::{Document, NodeId, NodeKind};

/// Serialize `node` and its descendants.
///
/// For the document node an XML declaration is not emitted; the output is
/// the sequence of top-level nodes.
pub fn serialize(doc: &Document, node: NodeId) -> String {
    let mut out = Output::new();
    let mut scope: Vec<(String, String)> = Vec::new();
    if matches!(doc.kind(node), Some(NodeKind::Document)) {
        for (i, child) in doc.children(node).enumerate() {
            if i > 0 && !matches!(doc.kind(child), Some(NodeKind::Text(_))) {
                out.raw("\n");
            }
            write_tree(doc, child, &mut scope, &mut out);
        }
    } else {
        // Start from the bindings visible at `node` so a subtree keeps its context.
        for ancestor in ancestors(doc, node) {
            if let Some(e) = doc.element(ancestor) {
                scope.extend(e.namespace_declarations.iter().cloned());
            }
        }
        write_tree(doc, node, &mut scope, &mut out);
    }
    out.finish()
}

/// Text written so far plus the writer for the current run of markup.
struct Output {
    done: String,
    writer: uppsala::XmlWriter,
}

impl Output {
    fn new() -> Self {
        Self {
            done: String::new(),
            writer: uppsala::XmlWriter::new(),
        }
    }

    /// Append text verbatim (comments, processing instructions, line breaks).
    fn raw(&mut self, text: &str) {
        let run = std::mem::replace(&mut self.writer, uppsala::XmlWriter::new());
        self.done.push_str(&run.into_string());
        self.done.push_str(text);
    }

    fn finish(mut self) -> String {
        self.done.push_str(&self.writer.into_string());
        self.done
    }
}

enum Step {
    Open(NodeId),
    /// Close tag name and the scope length to restore.
    Close(String, usize),
}

fn ancestors(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut current = doc.parent(node);
    while let Some(n) = current {
        chain.push(n);
        current = doc.parent(n);
    }
    chain.reverse();
    chain
}

fn lookup<'a>(scope: &'a [(String, String)], prefix: &str) -> Option<&'a str> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, u)| u.as_str())
}

fn write_tree(doc: &Document, top: NodeId, scope: &mut Vec<(String, String)>, out: &mut Output) {
    let mut steps = vec![Step::Open(top)];
    while let Some(step) = steps.pop() {
        let node = match step {
            Step::Open(node) => node,
            Step::Close(qname, mark) => {
                out.writer.end_element(&qname);
                scope.truncate(mark);
                continue;
            }
        };
        match doc.kind(node) {
            Some(NodeKind::Element(elem)) => {
                let qname = elem.name.qualified();
                let declared = declarations_needed(elem, scope);

                let mut attrs: Vec<(String, String)> = declared
                    .iter()
                    .map(|(prefix, uri)| {
                        let name = if prefix.is_empty() {
                            "xmlns".to_owned()
                        } else {
                            format!("xmlns:{prefix}")
                        };
                        (name, uri.clone())
                    })
                    .collect();
                attrs.extend(
                    elem.attributes
                        .iter()
                        .map(|a| (a.name.qualified(), a.value.clone())),
                );
                let attrs: Vec<(&str, &str)> =
                    attrs.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();

                let children: Vec<NodeId> = doc.children(node).collect();
                if children.is_empty() {
                    out.writer.empty_element(&qname, &attrs);
                    continue;
                }
                out.writer.start_element(&qname, &attrs);
                let mark = scope.len();
                scope.extend(declared);
                steps.push(Step::Close(qname, mark));
                steps.extend(children.into_iter().rev().map(Step::Open));
            }
            Some(NodeKind::Text(t)) => {
                out.writer.text(t);
            }
            Some(NodeKind::Comment(c)) => out.raw(&format!("<!--{c}-->")),
            Some(NodeKind::ProcessingInstruction { target, data }) => match data {
                Some(d) => out.raw(&format!("<?{target} {d}?>")),
                None => out.raw(&format!("<?{target}?>")),
            },
            Some(NodeKind::Document) | None => {}
        }
    }
}

/// The element's own declarations plus any binding its names need that
/// `scope` does not already provide.
fn declarations_needed(
    elem: &crate::document::Element,
    scope: &[(String, String)],
) -> Vec<(String, String)> {
    let mut declared: Vec<(String, String)> = elem.namespace_declarations.clone();
    let mut needed: Vec<(String, String)> =
        vec![(elem.name.prefix().to_owned(), elem.name.namespace().to_owned())];
    for attr in &elem.attributes {
        if let Some(p) = &attr.name.prefix {
            if p != "xml" {
                needed.push((p.clone(), attr.name.namespace().to_owned()));
            }
        }
    }
    for (prefix, uri) in needed {
        let visible = declared
            .iter()
            .rev()
            .find(|(p, _)| *p == prefix)
            .map(|(_, u)| u.as_str())
            .or_else(|| lookup(scope, &prefix))
            .unwrap_or("");
        if visible != uri {
            declared.push((prefix, uri));
        }
    }
    declared
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, QName};

    #[test]
    fn test_round_trip_preserves_content() {
        let src = r#"<a:r xmlns:a="urn:a"><a:b x="1 &amp; 2">t&lt;</a:b></a:r>"#;
        let doc = Document::parse(src).unwrap();
        let xml = doc.to_xml();

        let again = Document::parse(&xml).unwrap();
        assert_eq!(again.to_xml(), xml);
        let r = again.document_element().unwrap();
        let b = again.child_element(r, "urn:a", "b").unwrap();
        assert_eq!(again.element(b).unwrap().attribute("x"), Some("1 & 2"));
        assert_eq!(again.text(b), "t<");
        assert_eq!(again.element(r).unwrap().namespace_declarations.len(), 1);
    }

    #[test]
    fn test_created_elements_get_bindings() {
        let mut doc = Document::parse("<r/>").unwrap();
        let r = doc.document_element().unwrap();
        let sig = doc.create_element(QName::ns(Some("ds"), "Signature", "urn:ds"));
        let inner = doc.create_element(QName::ns(Some("ds"), "SignedInfo", "urn:ds"));
        doc.append_child(sig, inner).unwrap();
        doc.append_child(r, sig).unwrap();

        let xml = doc.to_xml();
        assert_eq!(xml.matches(r#"xmlns:ds="urn:ds""#).count(), 1);
        let again = Document::parse(&xml).unwrap();
        let r = again.document_element().unwrap();
        let sig = again.child_element(r, "urn:ds", "Signature").unwrap();
        assert!(again.child_element(sig, "urn:ds", "SignedInfo").is_some());
    }

    #[test]
    fn test_comments_and_instructions_kept() {
        let doc = Document::parse("<r><!--note--><?app go?><x>1</x></r>").unwrap();
        let xml = doc.to_xml();
        assert!(xml.contains("<!--note--><?app go?>"));
        let again = Document::parse(&xml).unwrap();
        assert_eq!(again.to_xml(), xml);
    }
}
