#![forbid(unsafe_code)]

//! Escaping and the output-ordering rules shared by canonical serializers.
//!
//! Text escapes `&`, `<`, `>` and CR.  Attribute values additionally
//! escape `"`, TAB and LF, but not `>`.  Processing-instruction data only
//! escapes CR.  Input that needs no escaping is returned borrowed.

use std::borrow::Cow;
use std::cmp::Ordering;

fn escape_with(s: &str, replace: fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = s.find(|c| replace(c).is_some()) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len() + 8);
    out.push_str(&s[..first]);
    for ch in s[first..].chars() {
        match replace(ch) {
            Some(entity) => out.push_str(entity),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Escape character data.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

/// Escape an attribute value (also used for namespace URIs).
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

/// Escape processing-instruction data.
pub fn escape_pi(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| (c == '\r').then_some("&#xD;"))
}

// ── Namespace declarations ───────────────────────────────────────────

/// A namespace declaration about to be written; `prefix` is `""` for the
/// default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b" xmlns");
        if !self.prefix.is_empty() {
            out.push(b':');
            out.extend_from_slice(self.prefix.as_bytes());
        }
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape_attr(&self.uri).as_bytes());
        out.push(b'"');
    }
}

/// The default namespace first, then by prefix.
impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        (!self.prefix.is_empty(), &self.prefix).cmp(&(!other.prefix.is_empty(), &other.prefix))
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── Attributes ───────────────────────────────────────────────────────

/// An attribute about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// `""` when the attribute is in no namespace.
    pub ns_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape_attr(&self.value).as_bytes());
        out.push(b'"');
    }
}

/// Unqualified attributes first, then by (namespace URI, local name).
impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        (!self.ns_uri.is_empty(), &self.ns_uri, &self.local_name).cmp(&(
            !other.ns_uri.is_empty(),
            &other.ns_uri,
            &other.local_name,
        ))
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
