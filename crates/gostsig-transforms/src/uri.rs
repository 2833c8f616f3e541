#![forbid(unsafe_code)]

//! URI resolution for XML-DSig references.
//!
//! Handles:
//! - Empty URI ("") - the entire document minus comments
//! - Same-document references ("#id") - the identified subtree minus comments
//! - `#xpointer(/)` and `#xpointer(id('...'))` - as above, comments kept

use gostsig_core::Error;
use gostsig_xml::{Document, NodeId, NodeSet};
use std::collections::HashMap;

/// Resolve a reference URI to the node set it selects.
pub fn resolve_uri(
    uri: &str,
    doc: &Document,
    id_map: &HashMap<String, NodeId>,
) -> Result<NodeSet, Error> {
    if uri.is_empty() {
        return Ok(NodeSet::tree_without_comments(doc.root()));
    }
    let fragment = uri
        .strip_prefix('#')
        .ok_or_else(|| Error::InvalidUri(format!("external URI not supported: {uri}")))?;
    if fragment == "xpointer(/)" {
        return Ok(NodeSet::tree(doc.root()));
    }
    if let Some(id) = parse_xpointer_id(fragment) {
        return Ok(NodeSet::tree(resolve_id(id_map, id)?));
    }
    Ok(NodeSet::tree_without_comments(resolve_id(id_map, fragment)?))
}

/// Look up an element by ID value.
pub fn resolve_id(id_map: &HashMap<String, NodeId>, id: &str) -> Result<NodeId, Error> {
    id_map
        .get(id)
        .copied()
        .ok_or_else(|| Error::InvalidUri(format!("no element with ID '{id}'")))
}

/// Parse an `xpointer(id('...'))` expression and return the ID value.
fn parse_xpointer_id(expr: &str) -> Option<&str> {
    let inner = expr.strip_prefix("xpointer(id(")?.strip_suffix("))")?;
    let quoted = (inner.starts_with('\'') && inner.ends_with('\''))
        || (inner.starts_with('"') && inner.ends_with('"'));
    (quoted && inner.len() >= 2).then(|| &inner[1..inner.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Document, HashMap<String, NodeId>) {
        let doc = Document::parse(r#"<r><a Id="x"><!--c--></a></r>"#).unwrap();
        let map = doc.build_id_map(&["Id".to_owned()]);
        (doc, map)
    }

    #[test]
    fn test_empty_and_fragment() {
        let (doc, map) = fixture();
        let whole = resolve_uri("", &doc, &map).unwrap();
        assert_eq!(whole.apex(), doc.root());
        assert!(!whole.with_comments());

        let x = resolve_uri("#x", &doc, &map).unwrap();
        assert_eq!(Some(&x.apex()), map.get("x"));
        assert!(!x.with_comments());
    }

    #[test]
    fn test_xpointer_forms() {
        let (doc, map) = fixture();
        assert!(resolve_uri("#xpointer(/)", &doc, &map).unwrap().with_comments());
        let x = resolve_uri("#xpointer(id('x'))", &doc, &map).unwrap();
        assert!(x.with_comments());
        assert_eq!(Some(&x.apex()), map.get("x"));
    }

    #[test]
    fn test_unresolvable() {
        let (doc, map) = fixture();
        assert!(matches!(resolve_uri("#nope", &doc, &map), Err(Error::InvalidUri(_))));
        assert!(matches!(
            resolve_uri("http://example.com/x", &doc, &map),
            Err(Error::InvalidUri(_))
        ));
    }
}
