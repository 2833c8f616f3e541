#![forbid(unsafe_code)]

//! NodeSet type for canonicalization and transforms.
//!
//! The signing profile only ever needs subtree sets: the subtree rooted at
//! a referenced element (or the document node), optionally without
//! comments, minus the subtrees removed by the enveloped-signature
//! transform.  A `NodeSet` captures exactly that.

use crate::document::{Document, NodeId, NodeKind};

/// A subtree of a document, minus excluded subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet {
    apex: NodeId,
    excluded: Vec<NodeId>,
    with_comments: bool,
}

impl NodeSet {
    /// The subtree rooted at `apex` without comment nodes.
    ///
    /// This is what a same-document URI reference dereferences to.
    pub fn tree_without_comments(apex: NodeId) -> Self {
        Self {
            apex,
            excluded: Vec::new(),
            with_comments: false,
        }
    }

    /// The subtree rooted at `apex`, comments included.
    pub fn tree(apex: NodeId) -> Self {
        Self {
            apex,
            excluded: Vec::new(),
            with_comments: true,
        }
    }

    /// Remove the subtree rooted at `node` from the set.
    pub fn exclude_subtree(&mut self, node: NodeId) {
        if !self.excluded.contains(&node) {
            self.excluded.push(node);
        }
    }

    /// The root of the set.
    pub fn apex(&self) -> NodeId {
        self.apex
    }

    /// Whether comment nodes are part of the set.
    pub fn with_comments(&self) -> bool {
        self.with_comments
    }

    /// Check whether `node` is in the set.
    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        if !doc.is_ancestor_or_self(self.apex, node) {
            return false;
        }
        if !self.with_comments && matches!(doc.kind(node), Some(NodeKind::Comment(_))) {
            return false;
        }
        !self
            .excluded
            .iter()
            .any(|&ex| doc.is_ancestor_or_self(ex, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_subtree_and_comments() {
        let doc = Document::parse("<a><b><c/></b><!--x--><d/></a>").unwrap();
        let a = doc.document_element().unwrap();
        let kids: Vec<_> = doc.children(a).collect();
        let (b, comment, d) = (kids[0], kids[1], kids[2]);
        let c = doc.children(b).next().unwrap();

        let mut set = NodeSet::tree_without_comments(a);
        assert!(set.contains(&doc, c));
        assert!(!set.contains(&doc, comment));
        set.exclude_subtree(b);
        assert!(!set.contains(&doc, b));
        assert!(!set.contains(&doc, c));
        assert!(set.contains(&doc, d));
        assert!(!set.contains(&doc, doc.root()));

        assert!(NodeSet::tree(a).contains(&doc, comment));
    }
}
