#![forbid(unsafe_code)]

//! XML document model for the gostsig XML Security library.
//!
//! `uppsala` does the parsing and the writing; the parsed tree is copied
//! into an owned, mutable arena so signatures can be inserted and subtrees
//! imported between documents.  Also provides the `NodeSet` used by
//! canonicalization and the location-path evaluator used to pick the
//! element to sign.

pub mod document;
pub mod nodeset;
pub mod writer;
pub mod xpath;

pub use document::{Attribute, Document, DocumentId, Element, NodeId, NodeKind, QName};
pub use nodeset::NodeSet;
pub use xpath::PathExpr;
