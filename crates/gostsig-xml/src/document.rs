#![forbid(unsafe_code)]

//! Arena-backed XML document with per-document node ownership.
//!
//! Every [`NodeId`] remembers the [`Document`] that created it.  Mutating
//! operations reject handles from another document, so content can only
//! cross a document boundary through [`Document::import_node`], which
//! deep-copies the subtree into the importing document.

use gostsig_core::{ns, Error};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Document`], unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

/// Handle to a node owned by a particular [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    doc: DocumentId,
    index: usize,
}

impl NodeId {
    /// The document that owns this node.
    pub fn document(&self) -> DocumentId {
        self.doc
    }

    /// Arena index of the node inside its document.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
}

impl QName {
    /// A name in no namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace_uri: None,
        }
    }

    /// A name in `namespace_uri`, written with `prefix` (`None` = default namespace).
    pub fn ns(prefix: Option<&str>, local_name: &str, namespace_uri: &str) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_owned),
            local_name: local_name.to_owned(),
            namespace_uri: Some(namespace_uri.to_owned()).filter(|u| !u.is_empty()),
        }
    }

    /// The prefix, or `""` when unprefixed.
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// The namespace URI, or `""` when in no namespace.
    pub fn namespace(&self) -> &str {
        self.namespace_uri.as_deref().unwrap_or("")
    }

    /// `prefix:local` or just `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Compare by expanded name, ignoring the prefix.
    pub fn matches(&self, namespace_uri: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace() == namespace_uri
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    /// Namespace declarations written on this element, as `(prefix, uri)`;
    /// the prefix is `""` for the default namespace.
    pub namespace_declarations: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespace_declarations: Vec::new(),
        }
    }

    /// Value of the un-namespaced attribute `local_name`.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace_uri.is_none() && a.name.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Value of the attribute `{namespace_uri}local_name`.
    pub fn attribute_ns(&self, namespace_uri: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.matches(namespace_uri, local_name))
            .map(|a| a.value.as_str())
    }

    /// Add or replace an attribute (matched by expanded name).
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.matches(name.namespace(), &name.local_name))
        {
            Some(existing) => {
                existing.name = name;
                existing.value = value;
            }
            None => self.attributes.push(Attribute { name, value }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: Option<String> },
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// An XML document: the ownership root of a tree of nodes.
///
/// Index `0` is always the document node.  Detached nodes stay in the
/// arena until the document is dropped.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            id: DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed)),
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse XML text into a new document.
    ///
    /// `uppsala` builds the tree; it is then copied node by node into the
    /// arena so it can be mutated.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let source = uppsala::parse(text).map_err(|e| Error::XmlParse(e.to_string()))?;
        let mut doc = Self::new();

        // (source node, arena parent), popped in document order.
        let mut pending: Vec<(uppsala::NodeId, usize)> = Vec::new();
        for child in source.children(source.root()) {
            pending.push((child, 0));
        }
        pending.reverse();
        while let Some((node, parent)) = pending.pop() {
            let Some(kind) = convert(&source, node) else {
                continue;
            };
            let index = doc.push(kind).index;
            doc.link(parent, index);
            let mark = pending.len();
            for child in source.children(node) {
                pending.push((child, index));
            }
            pending[mark..].reverse();
        }
        Ok(doc)
    }

    /// Parse XML from UTF-8 bytes.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?;
        Self::parse(text)
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Whether `node` belongs to this document.
    pub fn owns(&self, node: NodeId) -> bool {
        node.doc == self.id && node.index < self.nodes.len()
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.handle(0)
    }

    /// The single top-level element, if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root()).find(|&c| self.is_element(c))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|d| &d.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        if !self.owns(id) {
            return None;
        }
        match &mut self.nodes[id.index].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Whether `id` is an element with the given expanded name.
    pub fn is_named(&self, id: NodeId, namespace_uri: &str, local_name: &str) -> bool {
        self.element(id)
            .is_some_and(|e| e.name.matches(namespace_uri, local_name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id)?.parent.map(|p| self.handle(p))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let children = self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[]);
        children.iter().map(move |&i| self.handle(i))
    }

    /// Element children with the given expanded name.
    pub fn child_elements(&self, parent: NodeId, namespace_uri: &str, local_name: &str) -> Vec<NodeId> {
        self.children(parent)
            .filter(|&c| self.is_named(c, namespace_uri, local_name))
            .collect()
    }

    /// First element child with the given expanded name.
    pub fn child_element(&self, parent: NodeId, namespace_uri: &str, local_name: &str) -> Option<NodeId> {
        self.children(parent)
            .find(|&c| self.is_named(c, namespace_uri, local_name))
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.position_in_parent(id)?;
        pos.checked_sub(1).map(|p| self.handle(siblings[p]))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.position_in_parent(id)?;
        siblings.get(pos + 1).map(|&i| self.handle(i))
    }

    fn position_in_parent(&self, id: NodeId) -> Option<(&[usize], usize)> {
        let parent = self.data(id)?.parent?;
        let siblings = self.nodes[parent].children.as_slice();
        let pos = siblings.iter().position(|&i| i == id.index)?;
        Some((siblings, pos))
    }

    /// `id` and all its descendants, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.owns(id) {
            return out;
        }
        let mut stack = vec![id.index];
        while let Some(index) = stack.pop() {
            out.push(self.handle(index));
            stack.extend(self.nodes[index].children.iter().rev());
        }
        out
    }

    /// First element named `{namespace_uri}local_name` at or below `scope`.
    pub fn find_element(&self, scope: NodeId, namespace_uri: &str, local_name: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.is_named(n, namespace_uri, local_name))
    }

    /// All elements named `{namespace_uri}local_name` at or below `scope`.
    pub fn find_elements(&self, scope: NodeId, namespace_uri: &str, local_name: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.is_named(n, namespace_uri, local_name))
            .collect()
    }

    /// Check if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Concatenated text content of `id` and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let Some(NodeKind::Text(t)) = self.kind(n) {
                out.push_str(t);
            }
        }
        out
    }

    // ── Construction and mutation ────────────────────────────────────

    /// Create a detached element.
    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, Error> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, Error> {
        let first = self.children(parent).next();
        self.insert_before(parent, child, first)
    }

    /// Insert `child` into `parent` before `reference` (`None` appends).
    ///
    /// An attached `child` is moved.  Both nodes must belong to this
    /// document.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, Error> {
        let p = self.check(parent)?;
        let c = self.check(child)?;
        if c == 0 {
            return Err(Error::XmlStructure("the document node cannot be a child".into()));
        }
        if !matches!(self.nodes[p].kind, NodeKind::Document | NodeKind::Element(_)) {
            return Err(Error::XmlStructure("only elements and documents have children".into()));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::XmlStructure("cannot insert a node into its own subtree".into()));
        }
        if p == 0 && self.is_element(child) {
            if let Some(existing) = self.document_element() {
                if existing != child {
                    return Err(Error::XmlStructure("document already has a root element".into()));
                }
            }
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(Error::XmlStructure("reference node is not a child of parent".into()));
            }
        }
        self.detach(child)?;
        let pos = match reference {
            Some(r) => self.nodes[p]
                .children
                .iter()
                .position(|&i| i == r.index)
                .unwrap_or(self.nodes[p].children.len()),
            None => self.nodes[p].children.len(),
        };
        self.nodes[p].children.insert(pos, c);
        self.nodes[c].parent = Some(p);
        Ok(child)
    }

    /// Remove `id` from its parent; the subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) -> Result<(), Error> {
        let c = self.check(id)?;
        if let Some(p) = self.nodes[c].parent.take() {
            self.nodes[p].children.retain(|&i| i != c);
        }
        Ok(())
    }

    /// Replace the children of `element` with a single text node.
    pub fn set_text(&mut self, element: NodeId, text: impl Into<String>) -> Result<(), Error> {
        let e = self.check(element)?;
        for child in std::mem::take(&mut self.nodes[e].children) {
            self.nodes[child].parent = None;
        }
        let t = self.create_text(text);
        self.append_child(element, t)?;
        Ok(())
    }

    /// Deep-copy `node` from `source` into this document, detached.
    ///
    /// The returned handle is a new node; handles into `source` do not
    /// refer to the copy.
    pub fn import_node(&mut self, source: &Document, node: NodeId) -> Result<NodeId, Error> {
        if !source.owns(node) {
            return Err(Error::XmlStructure("node does not belong to the source document".into()));
        }
        if node.index == 0 {
            return Err(Error::XmlStructure("a document node cannot be imported".into()));
        }
        let index = self.copy_subtree(source, node.index);
        Ok(self.handle(index))
    }

    /// Import `node` from `source` and append the copy to `parent` in one step.
    pub fn import_and_append(
        &mut self,
        parent: NodeId,
        source: &Document,
        node: NodeId,
    ) -> Result<NodeId, Error> {
        self.check(parent)?;
        let copy = self.import_node(source, node)?;
        self.append_child(parent, copy)
    }

    fn copy_subtree(&mut self, source: &Document, index: usize) -> usize {
        let top = self.nodes.len();
        let mut pending: Vec<(usize, Option<usize>)> = vec![(index, None)];
        while let Some((src, parent)) = pending.pop() {
            let copied = self.nodes.len();
            self.nodes.push(NodeData {
                kind: source.nodes[src].kind.clone(),
                parent: None,
                children: Vec::with_capacity(source.nodes[src].children.len()),
            });
            if let Some(p) = parent {
                self.link(p, copied);
            }
            pending.extend(source.nodes[src].children.iter().rev().map(|&c| (c, Some(copied))));
        }
        top
    }

    /// Merge adjacent text nodes and drop empty ones.
    pub fn normalize(&mut self) {
        for index in 0..self.nodes.len() {
            let children = std::mem::take(&mut self.nodes[index].children);
            let mut merged: Vec<usize> = Vec::with_capacity(children.len());
            for child in children {
                let text = match &self.nodes[child].kind {
                    NodeKind::Text(t) => Some(t.clone()),
                    _ => None,
                };
                match text {
                    Some(t) if t.is_empty() => self.nodes[child].parent = None,
                    Some(t) => {
                        let previous = merged.last().copied();
                        if let Some(last) = previous {
                            if let NodeKind::Text(prev) = &mut self.nodes[last].kind {
                                prev.push_str(&t);
                                self.nodes[child].parent = None;
                                continue;
                            }
                        }
                        merged.push(child);
                    }
                    None => merged.push(child),
                }
            }
            self.nodes[index].children = merged;
        }
    }

    /// Build the ID → element mapping for attached elements.
    ///
    /// Plain names match un-namespaced attributes; `{uri}local` (Clark
    /// notation) matches namespaced ones.  The first element in document
    /// order wins when a value repeats.
    pub fn build_id_map(&self, id_attrs: &[String]) -> HashMap<String, NodeId> {
        let mut map = HashMap::new();
        for node in self.descendants(self.root()) {
            let Some(elem) = self.element(node) else {
                continue;
            };
            for attr_name in id_attrs {
                let value = match parse_clark(attr_name) {
                    Some((uri, local)) => elem.attribute_ns(uri, local),
                    None => elem.attribute(attr_name),
                };
                if let Some(v) = value {
                    map.entry(v.to_owned()).or_insert(node);
                }
            }
        }
        map
    }

    /// Serialize the whole document.
    pub fn to_xml(&self) -> String {
        crate::writer::serialize(self, self.root())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn handle(&self, index: usize) -> NodeId {
        NodeId {
            doc: self.id,
            index,
        }
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        if id.doc == self.id {
            self.nodes.get(id.index)
        } else {
            None
        }
    }

    fn check(&self, id: NodeId) -> Result<usize, Error> {
        if self.owns(id) {
            Ok(id.index)
        } else {
            Err(Error::XmlStructure(
                "node belongs to another document; import it first".into(),
            ))
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.handle(self.nodes.len() - 1)
    }

    fn link(&mut self, parent: usize, child: usize) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }
}

/// Split `{uri}local` into its parts.
fn parse_clark(name: &str) -> Option<(&str, &str)> {
    name.strip_prefix('{')?.split_once('}')
}

/// Map one `uppsala` node onto the arena's node kinds.
fn convert(source: &uppsala::Document<'_>, node: uppsala::NodeId) -> Option<NodeKind> {
    match source.node_kind(node)? {
        uppsala::NodeKind::Element(_) => {
            let elem = source.element(node)?;
            let name = QName {
                prefix: elem
                    .name
                    .prefix
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned),
                local_name: elem.name.local_name.to_string(),
                namespace_uri: elem
                    .name
                    .namespace_uri
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .map(str::to_owned),
            };
            let mut converted = Element::new(name);
            for attr in &elem.attributes {
                if let Some(attr) = attribute_from(attr) {
                    converted.attributes.push(attr);
                }
            }
            for (prefix, uri) in &elem.namespace_declarations {
                converted
                    .namespace_declarations
                    .push((prefix.to_string(), uri.to_string()));
            }
            Some(NodeKind::Element(converted))
        }
        uppsala::NodeKind::Text(text) | uppsala::NodeKind::CData(text) => {
            Some(NodeKind::Text(text.to_string()))
        }
        uppsala::NodeKind::Comment(text) => Some(NodeKind::Comment(text.to_string())),
        uppsala::NodeKind::ProcessingInstruction(pi) => Some(NodeKind::ProcessingInstruction {
            target: pi.target.to_string(),
            data: pi.data.as_ref().map(|d| d.to_string()),
        }),
        _ => None,
    }
}

fn attribute_from(attr: &uppsala::Attribute<'_>) -> Option<Attribute> {
    let local_name = attr.name.local_name.to_string();
    let prefix = attr.name.prefix.as_deref().filter(|p| !p.is_empty());
    // Declarations arrive separately through `namespace_declarations`.
    if prefix == Some("xmlns") || (prefix.is_none() && local_name == "xmlns") {
        return None;
    }
    let namespace_uri = attr.name.namespace_uri.as_deref().filter(|u| !u.is_empty());
    let prefix = match namespace_uri {
        None => None,
        Some(ns::XML) => Some("xml".to_owned()),
        Some(_) => prefix.map(str::to_owned),
    };
    Some(Attribute {
        name: QName {
            prefix,
            local_name,
            namespace_uri: namespace_uri.map(str::to_owned),
        },
        value: attr.value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<a:root xmlns:a="urn:a" xmlns="urn:d" Id="r1"><child x="1">text</child><!--c--><a:leaf/></a:root>"#;

    #[test]
    fn test_parse_names_and_prefixes() {
        let doc = Document::parse(SAMPLE).unwrap();
        let root = doc.document_element().unwrap();
        let elem = doc.element(root).unwrap();
        assert_eq!(elem.name.qualified(), "a:root");
        assert_eq!(elem.name.namespace(), "urn:a");
        assert_eq!(elem.attribute("Id"), Some("r1"));
        assert_eq!(elem.namespace_declarations.len(), 2);

        let child = doc.child_element(root, "urn:d", "child").unwrap();
        let child_elem = doc.element(child).unwrap();
        assert_eq!(child_elem.name.prefix, None);
        assert!(child_elem.namespace_declarations.is_empty());
        assert_eq!(doc.text(child), "text");
        assert!(doc.child_element(root, "urn:a", "leaf").is_some());
    }

    #[test]
    fn test_import_is_required_across_documents() {
        let source = Document::parse("<a><b/></a>").unwrap();
        let b = doc_child(&source);
        let mut target = Document::new();
        let root = target.create_element(QName::local("root"));
        target.append_child(target.root(), root).unwrap();

        assert!(target.append_child(root, b).is_err());

        let copy = target.import_and_append(root, &source, b).unwrap();
        assert_ne!(copy, b);
        assert_eq!(copy.document(), target.id());
        assert_eq!(target.parent(copy), Some(root));
        // The source is untouched.
        assert_eq!(source.parent(b), source.document_element());
    }

    #[test]
    fn test_prepend_and_single_root() {
        let mut doc = Document::parse("<a><b/></a>").unwrap();
        let a = doc.document_element().unwrap();
        let first = doc.create_element(QName::local("first"));
        doc.prepend_child(a, first).unwrap();
        assert_eq!(doc.children(a).next(), Some(first));

        let other = doc.create_element(QName::local("other"));
        assert!(doc.append_child(doc.root(), other).is_err());
        assert!(doc.append_child(first, a).is_err());
    }

    #[test]
    fn test_normalize_merges_text() {
        let mut doc = Document::parse("<a>x</a>").unwrap();
        let a = doc.document_element().unwrap();
        let t1 = doc.create_text("y");
        let t2 = doc.create_text("");
        doc.append_child(a, t1).unwrap();
        doc.append_child(a, t2).unwrap();
        assert_eq!(doc.children(a).count(), 3);
        doc.normalize();
        assert_eq!(doc.children(a).count(), 1);
        assert_eq!(doc.text(a), "xy");
    }

    #[test]
    fn test_id_map_clark_names() {
        let doc = Document::parse(
            r#"<r xmlns:wsu="urn:wsu"><x Id="one"/><y wsu:Id="two"/><z Id="one"/></r>"#,
        )
        .unwrap();
        let map = doc.build_id_map(&["Id".to_owned(), "{urn:wsu}Id".to_owned()]);
        let r = doc.document_element().unwrap();
        assert_eq!(map.get("one"), doc.child_elements(r, "", "x").first());
        assert_eq!(map.get("two"), doc.child_elements(r, "", "y").first());
    }

    #[test]
    fn test_import_deeply_nested_subtree() {
        let mut source = Document::new();
        let mut parent = source.root();
        for _ in 0..50_000 {
            let e = source.create_element(QName::local("n"));
            source.append_child(parent, e).unwrap();
            parent = e;
        }
        let leaf = source.create_text("bottom");
        source.append_child(parent, leaf).unwrap();

        let top = source.document_element().unwrap();
        let mut target = Document::new();
        let copy = target.import_node(&source, top).unwrap();
        assert_eq!(target.descendants(copy).len(), 50_001);
        assert_eq!(target.text(copy), "bottom");
    }

    fn doc_child(doc: &Document) -> NodeId {
        let root = doc.document_element().unwrap();
        doc.children(root).next().unwrap()
    }
}
