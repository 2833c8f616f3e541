#![forbid(unsafe_code)]

//! DSig context: configuration shared by signing and validation.

use gostsig_core::ns;

/// Context for XML-DSig operations.
#[derive(Debug, Clone)]
pub struct DsigContext {
    /// Attribute names that carry element IDs for `#id` references.
    ///
    /// Plain names match un-namespaced attributes; `{uri}local` matches a
    /// namespaced one.
    pub id_attrs: Vec<String>,
    /// Prefix bindings available to signing path expressions.
    pub namespaces: Vec<(String, String)>,
}

impl Default for DsigContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DsigContext {
    /// Create a context with the standard ID attributes and the `ds` and
    /// `wsu` prefixes bound.
    pub fn new() -> Self {
        Self {
            id_attrs: vec![
                "Id".to_owned(),
                "ID".to_owned(),
                "id".to_owned(),
                format!("{{{}}}Id", ns::WSU),
            ],
            namespaces: vec![
                (ns::DSIG_PREFIX.to_owned(), ns::DSIG.to_owned()),
                ("wsu".to_owned(), ns::WSU.to_owned()),
            ],
        }
    }

    /// Add an ID attribute name to register during processing.
    pub fn add_id_attr(&mut self, name: &str) {
        if !self.id_attrs.iter().any(|a| a == name) {
            self.id_attrs.push(name.to_owned());
        }
    }

    /// Bind `prefix` for path expressions; a later binding wins.
    pub fn add_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.push((prefix.to_owned(), uri.to_owned()));
    }

    /// Resolve a path-expression prefix.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<String> {
        self.namespaces
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
    }
}
