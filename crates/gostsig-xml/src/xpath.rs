#![forbid(unsafe_code)]

//! XPath 1.0 location paths over a [`Document`].
//!
//! Callers use these to point at the element to sign.  Supported:
//! - absolute and relative paths, `//`, `.`, `..` and unions with `|`
//! - every axis except `attribute` and `namespace`
//! - name tests (`name`, `p:name`, `*`, `p:*`) and `node()`
//! - predicates with positions, `and`, `or`, comparisons
//!   (`= != < <= > >=`), attribute tests and relative paths
//! - the functions `position()`, `last()`, `count()`, `not()`,
//!   `local-name()`, `namespace-uri()`, `name()`, `text()`, `string()`,
//!   `contains()` and `starts-with()`
//!
//! Prefixes are resolved at compile time through a caller-supplied lookup.

use crate::document::{Document, NodeId, NodeKind};
use gostsig_core::Error;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfNode,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "self" => Self::SelfNode,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "following" => Self::Following,
            "preceding" => Self::Preceding,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    /// `node()`: any node on the axis.
    Node,
    /// `*`: any element.
    Any,
    AnyInNamespace(String),
    Name { namespace: String, local: String },
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

impl Step {
    fn bare(axis: Axis) -> Self {
        Self {
            axis,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Box<Expr>, CmpOp, Box<Expr>),
    Literal(String),
    Number(f64),
    Position,
    Last,
    Count(LocationPath),
    LocalName,
    NamespaceUri,
    Name,
    Text,
    StringOf(Box<Expr>),
    Contains(Box<Expr>, Box<Expr>),
    StartsWith(Box<Expr>, Box<Expr>),
    Attribute { namespace: String, local: String },
    Path(LocationPath),
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    paths: Vec<LocationPath>,
}

impl PathExpr {
    /// Compile `expr`, resolving prefixes with `resolve_prefix`.
    pub fn compile<F>(expr: &str, resolve_prefix: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tokens = tokenize(expr)?;
        if tokens.is_empty() {
            return Err(Error::InvalidPath("empty path".into()));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            resolve: resolve_prefix,
            expr,
        };
        let mut paths = vec![parser.location_path()?];
        while parser.eat(&Token::Pipe) {
            paths.push(parser.location_path()?);
        }
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(Self { paths })
    }

    /// Evaluate against `context`, returning matches in document order.
    pub fn select(&self, doc: &Document, context: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for path in &self.paths {
            out.extend(select_path(doc, path, context));
        }
        document_order(doc, out)
    }

    /// The first match in document order.
    pub fn select_first(&self, doc: &Document, context: NodeId) -> Option<NodeId> {
        self.select(doc, context).into_iter().next()
    }
}

// ── Evaluation ───────────────────────────────────────────────────────

fn select_path(doc: &Document, path: &LocationPath, context: NodeId) -> Vec<NodeId> {
    let mut current = vec![if path.absolute { doc.root() } else { context }];
    for step in &path.steps {
        let mut next = Vec::new();
        for &node in &current {
            next.extend(apply_step(doc, step, node));
        }
        current = document_order(doc, next);
    }
    current
}

fn apply_step(doc: &Document, step: &Step, node: NodeId) -> Vec<NodeId> {
    let mut candidates: Vec<NodeId> = axis_nodes(doc, step.axis, node)
        .into_iter()
        .filter(|&n| test_matches(doc, n, &step.test))
        .collect();
    for predicate in &step.predicates {
        let size = candidates.len();
        candidates = candidates
            .into_iter()
            .enumerate()
            .filter(|&(i, n)| {
                let ctx = Context {
                    doc,
                    node: n,
                    position: i + 1,
                    size,
                };
                match ctx.eval(predicate) {
                    Value::Num(p) => p == ctx.position as f64,
                    other => other.to_bool(),
                }
            })
            .map(|(_, n)| n)
            .collect();
    }
    candidates
}

/// Nodes on `axis` from `node`, in axis order (reverse axes nearest first).
fn axis_nodes(doc: &Document, axis: Axis, node: NodeId) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(node).collect(),
        Axis::Descendant => doc.descendants(node).into_iter().skip(1).collect(),
        Axis::DescendantOrSelf => doc.descendants(node),
        Axis::SelfNode => vec![node],
        Axis::Parent => doc.parent(node).into_iter().collect(),
        Axis::Ancestor => ancestors(doc, node),
        Axis::AncestorOrSelf => {
            let mut out = vec![node];
            out.extend(ancestors(doc, node));
            out
        }
        Axis::FollowingSibling => match siblings(doc, node) {
            Some((all, pos)) => all[pos + 1..].to_vec(),
            None => Vec::new(),
        },
        Axis::PrecedingSibling => match siblings(doc, node) {
            Some((all, pos)) => all[..pos].iter().rev().copied().collect(),
            None => Vec::new(),
        },
        Axis::Following => {
            let all = doc.descendants(doc.root());
            let Some(at) = all.iter().position(|&n| n == node) else {
                return Vec::new();
            };
            all[at + 1..]
                .iter()
                .copied()
                .filter(|&n| !doc.is_ancestor_or_self(node, n))
                .collect()
        }
        Axis::Preceding => {
            let all = doc.descendants(doc.root());
            let Some(at) = all.iter().position(|&n| n == node) else {
                return Vec::new();
            };
            all[..at]
                .iter()
                .rev()
                .copied()
                .filter(|&n| !doc.is_ancestor_or_self(n, node))
                .collect()
        }
    }
}

fn ancestors(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut current = doc.parent(node);
    while let Some(n) = current {
        out.push(n);
        current = doc.parent(n);
    }
    out
}

fn siblings(doc: &Document, node: NodeId) -> Option<(Vec<NodeId>, usize)> {
    let parent = doc.parent(node)?;
    let all: Vec<NodeId> = doc.children(parent).collect();
    let pos = all.iter().position(|&n| n == node)?;
    Some((all, pos))
}

fn test_matches(doc: &Document, node: NodeId, test: &NodeTest) -> bool {
    if *test == NodeTest::Node {
        return true;
    }
    let Some(elem) = doc.element(node) else {
        return false;
    };
    match test {
        NodeTest::Node | NodeTest::Any => true,
        NodeTest::AnyInNamespace(ns) => elem.name.namespace() == ns,
        NodeTest::Name { namespace, local } => elem.name.matches(namespace, local),
    }
}

fn document_order(doc: &Document, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    if nodes.len() < 2 {
        return nodes;
    }
    let order: HashMap<NodeId, usize> = doc
        .descendants(doc.root())
        .into_iter()
        .enumerate()
        .map(|(i, n)| (n, i))
        .collect();
    nodes.sort_by_key(|n| order.get(n).copied().unwrap_or(usize::MAX));
    nodes.dedup();
    nodes
}

enum Value {
    Bool(bool),
    Num(f64),
    Str(String),
    /// String values of a node set.
    Nodes(Vec<String>),
}

impl Value {
    fn to_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Nodes(n) => !n.is_empty(),
        }
    }

    fn to_num(&self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Num(n) => *n,
            Value::Str(s) => parse_number(s),
            Value::Nodes(n) => n.first().map_or(f64::NAN, |s| parse_number(s)),
        }
    }

    fn to_str(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Num(n) if n.is_finite() && n.fract() == 0.0 => format!("{}", *n as i64),
            Value::Num(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Nodes(n) => n.first().cloned().unwrap_or_default(),
        }
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

struct Context<'d> {
    doc: &'d Document,
    node: NodeId,
    position: usize,
    size: usize,
}

impl Context<'_> {
    fn eval(&self, expr: &Expr) -> Value {
        let doc = self.doc;
        let elem = doc.element(self.node);
        match expr {
            Expr::Or(a, b) => Value::Bool(self.eval(a).to_bool() || self.eval(b).to_bool()),
            Expr::And(a, b) => Value::Bool(self.eval(a).to_bool() && self.eval(b).to_bool()),
            Expr::Not(a) => Value::Bool(!self.eval(a).to_bool()),
            Expr::Compare(a, op, b) => Value::Bool(compare(self.eval(a), *op, self.eval(b))),
            Expr::Literal(s) => Value::Str(s.clone()),
            Expr::Number(n) => Value::Num(*n),
            Expr::Position => Value::Num(self.position as f64),
            Expr::Last => Value::Num(self.size as f64),
            Expr::Count(path) => Value::Num(select_path(doc, path, self.node).len() as f64),
            Expr::LocalName => Value::Str(elem.map(|e| e.name.local_name.clone()).unwrap_or_default()),
            Expr::NamespaceUri => {
                Value::Str(elem.map(|e| e.name.namespace().to_owned()).unwrap_or_default())
            }
            Expr::Name => Value::Str(elem.map(|e| e.name.qualified()).unwrap_or_default()),
            Expr::Text => Value::Nodes(
                doc.children(self.node)
                    .filter_map(|c| match doc.kind(c) {
                        Some(NodeKind::Text(t)) => Some(t.clone()),
                        _ => None,
                    })
                    .collect(),
            ),
            Expr::StringOf(a) => Value::Str(self.eval(a).to_str()),
            Expr::Contains(a, b) => Value::Bool(self.eval(a).to_str().contains(&self.eval(b).to_str())),
            Expr::StartsWith(a, b) => {
                Value::Bool(self.eval(a).to_str().starts_with(&self.eval(b).to_str()))
            }
            Expr::Attribute { namespace, local } => Value::Nodes(
                elem.into_iter()
                    .flat_map(|e| e.attributes.iter())
                    .filter(|a| a.name.matches(namespace, local))
                    .map(|a| a.value.clone())
                    .collect(),
            ),
            Expr::Path(path) => Value::Nodes(
                select_path(doc, path, self.node)
                    .into_iter()
                    .map(|n| doc.text(n))
                    .collect(),
            ),
        }
    }
}

fn compare(left: Value, op: CmpOp, right: Value) -> bool {
    match (left, right) {
        (Value::Nodes(l), Value::Nodes(r)) => l.iter().any(|a| {
            r.iter()
                .any(|b| compare_atoms(&Value::Str(a.clone()), op, &Value::Str(b.clone())))
        }),
        (Value::Nodes(l), Value::Bool(b)) => {
            compare_atoms(&Value::Bool(!l.is_empty()), op, &Value::Bool(b))
        }
        (Value::Bool(b), Value::Nodes(r)) => {
            compare_atoms(&Value::Bool(b), op, &Value::Bool(!r.is_empty()))
        }
        (Value::Nodes(l), other) => l
            .iter()
            .any(|a| compare_atoms(&atom_like(a, &other), op, &other)),
        (other, Value::Nodes(r)) => r
            .iter()
            .any(|b| compare_atoms(&other, op, &atom_like(b, &other))),
        (l, r) => compare_atoms(&l, op, &r),
    }
}

/// A node's string value converted to the kind of `other`.
fn atom_like(s: &str, other: &Value) -> Value {
    match other {
        Value::Num(_) => Value::Num(parse_number(s)),
        _ => Value::Str(s.to_owned()),
    }
}

fn compare_atoms(l: &Value, op: CmpOp, r: &Value) -> bool {
    match op {
        CmpOp::Eq | CmpOp::Ne => {
            let equal = match (l, r) {
                (Value::Bool(_), _) | (_, Value::Bool(_)) => l.to_bool() == r.to_bool(),
                (Value::Num(_), _) | (_, Value::Num(_)) => l.to_num() == r.to_num(),
                _ => l.to_str() == r.to_str(),
            };
            equal == (op == CmpOp::Eq)
        }
        CmpOp::Lt => l.to_num() < r.to_num(),
        CmpOp::Le => l.to_num() <= r.to_num(),
        CmpOp::Gt => l.to_num() > r.to_num(),
        CmpOp::Ge => l.to_num() >= r.to_num(),
    }
}

// ── Parsing ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Star,
    Dot,
    DotDot,
    Op(CmpOp),
    /// An axis name; the `::` has been consumed.
    Axis(String),
    Name(String),
    Literal(String),
    Number(f64),
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn tokenize(expr: &str) -> Result<Vec<Token>, Error> {
    let chars: Vec<char> = expr.chars().collect();
    let at = |i: usize| chars.get(i).copied();
    let mut tokens = Vec::new();
    let mut i = 0;
    while let Some(c) = at(i) {
        let next = at(i + 1);
        let (token, width) = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '/' if next == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '@' => (Token::At, 1),
            ',' => (Token::Comma, 1),
            '|' => (Token::Pipe, 1),
            '*' => (Token::Star, 1),
            '=' => (Token::Op(CmpOp::Eq), 1),
            '!' if next == Some('=') => (Token::Op(CmpOp::Ne), 2),
            '<' if next == Some('=') => (Token::Op(CmpOp::Le), 2),
            '<' => (Token::Op(CmpOp::Lt), 1),
            '>' if next == Some('=') => (Token::Op(CmpOp::Ge), 2),
            '>' => (Token::Op(CmpOp::Gt), 1),
            '.' if next == Some('.') => (Token::DotDot, 2),
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => (Token::Dot, 1),
            '\'' | '"' => {
                let end = (i + 1..chars.len())
                    .find(|&j| chars[j] == c)
                    .ok_or_else(|| Error::InvalidPath(format!("unterminated literal in '{expr}'")))?;
                let literal: String = chars[i + 1..end].iter().collect();
                (Token::Literal(literal), end + 1 - i)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let end = (i..chars.len())
                    .find(|&j| !(chars[j].is_ascii_digit() || chars[j] == '.'))
                    .unwrap_or(chars.len());
                let text: String = chars[i..end].iter().collect();
                let n = text
                    .parse()
                    .map_err(|_| Error::InvalidPath(format!("bad number '{text}' in '{expr}'")))?;
                (Token::Number(n), end - i)
            }
            c if is_name_start(c) => {
                let end = (i..chars.len())
                    .find(|&j| !is_name_char(chars[j]))
                    .unwrap_or(chars.len());
                let name: String = chars[i..end].iter().collect();
                match (at(end), at(end + 1)) {
                    (Some(':'), Some(':')) => (Token::Axis(name), end + 2 - i),
                    (Some(':'), Some('*')) => (Token::Name(format!("{name}:*")), end + 2 - i),
                    (Some(':'), Some(n)) if is_name_start(n) => {
                        let local_end = (end + 1..chars.len())
                            .find(|&j| !is_name_char(chars[j]))
                            .unwrap_or(chars.len());
                        let local: String = chars[end + 1..local_end].iter().collect();
                        (Token::Name(format!("{name}:{local}")), local_end - i)
                    }
                    _ => (Token::Name(name), end - i),
                }
            }
            other => {
                return Err(Error::InvalidPath(format!("unexpected '{other}' in '{expr}'")));
            }
        };
        tokens.push(token);
        i += width;
    }
    Ok(tokens)
}

struct Parser<'e, F> {
    tokens: Vec<Token>,
    pos: usize,
    resolve: F,
    expr: &'e str,
}

impl<F> Parser<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn error(&self, message: &str) -> Error {
        Error::InvalidPath(format!("{message} in '{}'", self.expr))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(n)) if n == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), Error> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::Star
                    | Token::Axis(_)
                    | Token::Name(_)
            )
        )
    }

    fn location_path(&mut self) -> Result<LocationPath, Error> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if !self.starts_step() {
                    return Ok(LocationPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::bare(Axis::DescendantOrSelf));
                true
            }
            _ => false,
        };
        steps.push(self.step()?);
        loop {
            if self.eat(&Token::DoubleSlash) {
                steps.push(Step::bare(Axis::DescendantOrSelf));
            } else if !self.eat(&Token::Slash) {
                break;
            }
            steps.push(self.step()?);
        }
        Ok(LocationPath { absolute, steps })
    }

    fn step(&mut self) -> Result<Step, Error> {
        let axis = match self.peek().cloned() {
            Some(Token::Dot) => {
                self.pos += 1;
                return Ok(Step::bare(Axis::SelfNode));
            }
            Some(Token::DotDot) => {
                self.pos += 1;
                return Ok(Step::bare(Axis::Parent));
            }
            Some(Token::At) => return Err(self.error("attribute steps select no elements")),
            Some(Token::Axis(name)) => {
                self.pos += 1;
                Axis::from_name(&name)
                    .ok_or_else(|| self.error(&format!("unsupported axis '{name}'")))?
            }
            _ => Axis::Child,
        };
        let test = self.node_test()?;
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.or_expr()?);
            self.expect(&Token::RBracket, "']'")?;
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> Result<NodeTest, Error> {
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Any),
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    if name != "node" {
                        return Err(self.error(&format!("unsupported node test '{name}()'")));
                    }
                    self.pos += 1;
                    self.expect(&Token::RParen, "')'")?;
                    return Ok(NodeTest::Node);
                }
                let (namespace, local) = resolve_qname(&name, &self.resolve, self.expr)?;
                Ok(if local == "*" {
                    NodeTest::AnyInNamespace(namespace)
                } else {
                    NodeTest::Name { namespace, local }
                })
            }
            _ => Err(self.error("expected a name test")),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, Error> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, Error> {
        let mut left = self.comparison()?;
        while self.eat_keyword("and") {
            let right = self.comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, Error> {
        let left = self.operand()?;
        if let Some(Token::Op(op)) = self.peek().cloned() {
            self.pos += 1;
            let right = self.operand()?;
            return Ok(Expr::Compare(Box::new(left), op, Box::new(right)));
        }
        Ok(left)
    }

    fn operand(&mut self) -> Result<Expr, Error> {
        match self.peek().cloned() {
            Some(Token::Literal(s)) => {
                self.pos += 1;
                Ok(Expr::Literal(s))
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.or_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::At) => {
                self.pos += 1;
                match self.advance() {
                    Some(Token::Name(name)) => {
                        let (namespace, local) = resolve_qname(&name, &self.resolve, self.expr)?;
                        if local == "*" {
                            return Err(self.error("wildcard attribute tests are not supported"));
                        }
                        Ok(Expr::Attribute { namespace, local })
                    }
                    _ => Err(self.error("expected an attribute name")),
                }
            }
            Some(Token::Name(name))
                if name != "node" && self.tokens.get(self.pos + 1) == Some(&Token::LParen) =>
            {
                self.pos += 2;
                self.function(&name)
            }
            _ => Ok(Expr::Path(self.location_path()?)),
        }
    }

    /// Parse the arguments of `name(` up to and including the `)`.
    fn function(&mut self, name: &str) -> Result<Expr, Error> {
        let expr = match name {
            "position" => Expr::Position,
            "last" => Expr::Last,
            "local-name" => Expr::LocalName,
            "namespace-uri" => Expr::NamespaceUri,
            "name" => Expr::Name,
            "text" => Expr::Text,
            "not" => Expr::Not(Box::new(self.or_expr()?)),
            "count" => Expr::Count(self.location_path()?),
            "string" if self.peek() == Some(&Token::RParen) => {
                Expr::StringOf(Box::new(Expr::Path(LocationPath {
                    absolute: false,
                    steps: vec![Step::bare(Axis::SelfNode)],
                })))
            }
            "string" => Expr::StringOf(Box::new(self.or_expr()?)),
            "contains" | "starts-with" => {
                let haystack = Box::new(self.or_expr()?);
                self.expect(&Token::Comma, "','")?;
                let needle = Box::new(self.or_expr()?);
                if name == "contains" {
                    Expr::Contains(haystack, needle)
                } else {
                    Expr::StartsWith(haystack, needle)
                }
            }
            _ => return Err(self.error(&format!("unsupported function '{name}()'"))),
        };
        self.expect(&Token::RParen, "')'")?;
        Ok(expr)
    }
}

/// Resolve `prefix:local` to `(namespace, local)`; unprefixed names are in no namespace.
fn resolve_qname<F>(name: &str, resolve: &F, expr: &str) -> Result<(String, String), Error>
where
    F: Fn(&str) -> Option<String>,
{
    match name.split_once(':') {
        Some((prefix, local)) => {
            let uri = resolve(prefix).ok_or_else(|| {
                Error::InvalidPath(format!("unbound prefix '{prefix}' in '{expr}'"))
            })?;
            Ok((uri, local.to_owned()))
        }
        None => Ok((String::new(), name.to_owned())),
    }
}
