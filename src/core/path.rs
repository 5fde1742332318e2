//! Property paths locating a value inside a validated graph.
//!
//! Paths are immutable and structurally shared: appending a node allocates
//! one link and reuses the parent chain, so value cursors can fork paths
//! cheaply while traversing.

use crate::core::error::{PathError, PathResult};
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

/// Kind of graph element a path node designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// The bean itself (class-level constraints)
    Bean,
    /// A property of a bean
    Property,
    /// A method
    Method,
    /// A constructor
    Constructor,
    /// A single executable parameter
    Parameter,
    /// The full parameter list of an executable
    CrossParameter,
    /// The return value of an executable
    ReturnValue,
    /// An element of a container value
    ContainerElement,
}

/// Position of an element inside an iterable container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementPosition {
    /// Element of a list or array
    Index(usize),
    /// Value of a map entry
    Key(String),
    /// Element of a collection without positional access
    Unindexed,
}

/// A single node of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub struct PathNode {
    /// Node name; bean nodes have none.
    pub name: Option<String>,
    /// What the node designates.
    pub kind: ElementKind,
    /// Whether the node is an element of an iterable container.
    pub in_iterable: bool,
    /// Index within a list or array.
    pub index: Option<usize>,
    /// Key within a map.
    pub key: Option<String>,
    /// Position of a parameter node in its executable.
    pub parameter_index: Option<usize>,
}

impl PathNode {
    fn named(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            in_iterable: false,
            index: None,
            key: None,
            parameter_index: None,
        }
    }

    /// A property node.
    pub fn property(name: impl Into<String>) -> Self {
        Self::named(name, ElementKind::Property)
    }

    /// A nameless node standing for the bean itself.
    pub fn bean() -> Self {
        Self {
            name: None,
            kind: ElementKind::Bean,
            in_iterable: false,
            index: None,
            key: None,
            parameter_index: None,
        }
    }

    /// A method node.
    pub fn method(name: impl Into<String>) -> Self {
        Self::named(name, ElementKind::Method)
    }

    /// A constructor node.
    pub fn constructor(name: impl Into<String>) -> Self {
        Self::named(name, ElementKind::Constructor)
    }

    /// A parameter node.
    pub fn parameter(name: impl Into<String>, index: usize) -> Self {
        let mut node = Self::named(name, ElementKind::Parameter);
        node.parameter_index = Some(index);
        node
    }

    /// The node designating all parameters of an executable.
    pub fn cross_parameter() -> Self {
        Self::named("<cross-parameter>", ElementKind::CrossParameter)
    }

    /// The node designating an executable's return value.
    pub fn return_value() -> Self {
        Self::named("<return value>", ElementKind::ReturnValue)
    }

    /// Mark this node as an element of an iterable at the given position.
    pub fn at_position(mut self, position: &ElementPosition) -> Self {
        self.in_iterable = true;
        self.index = None;
        self.key = None;
        match position {
            ElementPosition::Index(i) => self.index = Some(*i),
            ElementPosition::Key(k) => self.key = Some(k.clone()),
            ElementPosition::Unindexed => {}
        }
        self
    }

    /// Selector of this node, if it is an iterable element.
    pub fn position(&self) -> Option<ElementPosition> {
        if !self.in_iterable {
            return None;
        }
        Some(match (&self.index, &self.key) {
            (Some(i), _) => ElementPosition::Index(*i),
            (None, Some(k)) => ElementPosition::Key(k.clone()),
            (None, None) => ElementPosition::Unindexed,
        })
    }
}

impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}", name)?;
        }
        if self.in_iterable {
            match (&self.index, &self.key) {
                (Some(i), _) => write!(f, "[{}]", i)?,
                (None, Some(k)) if is_plain_key(k) => write!(f, "[{}]", k)?,
                (None, Some(k)) => {
                    write!(f, "[\"")?;
                    for c in k.chars() {
                        if c == '"' || c == '\\' {
                            write!(f, "\\")?;
                        }
                        write!(f, "{}", c)?;
                    }
                    write!(f, "\"]")?;
                }
                (None, None) => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

struct Link {
    node: PathNode,
    parent: Option<Arc<Link>>,
}

/// An immutable, structurally shared sequence of path nodes.
#[derive(Clone, Default)]
pub struct Path {
    leaf: Option<Arc<Link>>,
    len: usize,
}

impl Path {
    /// The empty path designating the root object.
    pub fn root() -> Self {
        Self::default()
    }

    /// A path starting at a method.
    pub fn for_method(name: impl Into<String>) -> Self {
        Self::root().append(PathNode::method(name))
    }

    /// A path starting at a constructor.
    pub fn for_constructor(name: impl Into<String>) -> Self {
        Self::root().append(PathNode::constructor(name))
    }

    /// Parse a dotted property path such as `orders[2].lines[sku].price`.
    ///
    /// Keys that would not read back as the same key are quoted, as in
    /// `lines["a.b"]`; inside quotes `\` escapes the next character.
    pub fn parse(input: &str) -> PathResult<Self> {
        if input.trim().is_empty() {
            return Err(PathError::Empty);
        }
        let unparsable = || PathError::Unparsable {
            path: input.to_string(),
        };

        let mut path = Self::root();
        let mut chars = input.chars().peekable();
        loop {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' || c == '[' {
                    break;
                }
                name.push(c);
                chars.next();
            }
            if !is_identifier(&name) {
                return Err(PathError::InvalidIdentifier {
                    identifier: name,
                    path: input.to_string(),
                });
            }

            let mut node = PathNode::property(name);
            if chars.peek() == Some(&'[') {
                chars.next();
                let position = parse_selector(&mut chars).ok_or_else(unparsable)?;
                node = node.at_position(&position);
            }
            path = path.append(node);

            match chars.next() {
                None => return Ok(path),
                Some('.') => {}
                Some(_) => return Err(unparsable()),
            }
        }
    }

    /// Return a new path with `node` appended.
    pub fn append(&self, node: PathNode) -> Self {
        Self {
            leaf: Some(Arc::new(Link {
                node,
                parent: self.leaf.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Return a new path whose leaf is replaced by `node`.
    ///
    /// On the root path this is the same as appending.
    pub fn with_leaf(&self, node: PathNode) -> Self {
        match &self.leaf {
            Some(link) => Self {
                leaf: Some(Arc::new(Link {
                    node,
                    parent: link.parent.clone(),
                })),
                len: self.len,
            },
            None => self.append(node),
        }
    }

    /// The path without its leaf node.
    pub fn parent(&self) -> Self {
        match &self.leaf {
            Some(link) => Self {
                leaf: link.parent.clone(),
                len: self.len - 1,
            },
            None => Self::root(),
        }
    }

    /// The last node, if any.
    pub fn leaf(&self) -> Option<&PathNode> {
        self.leaf.as_deref().map(|link| &link.node)
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Alias of [`Path::is_root`].
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Nodes from the root to the leaf.
    pub fn nodes(&self) -> Vec<&PathNode> {
        let mut nodes = Vec::with_capacity(self.len);
        let mut current = self.leaf.as_deref();
        while let Some(link) = current {
            nodes.push(&link.node);
            current = link.parent.as_deref();
        }
        nodes.reverse();
        nodes
    }

    /// Whether this path is a (non-strict) prefix of `other`.
    ///
    /// The root path is a prefix of every path.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        if self.len > other.len {
            return false;
        }
        let mut link = other.leaf.as_deref();
        for _ in self.len..other.len {
            link = link.and_then(|l| l.parent.as_deref());
        }
        same_chain(self.leaf.as_deref(), link)
    }
}

// Compare two chains of equal length from the leaf up.
fn same_chain(mut a: Option<&Link>, mut b: Option<&Link>) -> bool {
    while let (Some(x), Some(y)) = (a, b) {
        if std::ptr::eq(x, y) {
            return true;
        }
        if x.node != y.node {
            return false;
        }
        a = x.parent.as_deref();
        b = y.parent.as_deref();
    }
    a.is_none() && b.is_none()
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && same_chain(self.leaf.as_deref(), other.leaf.as_deref())
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for node in self.nodes() {
            node.hash(state);
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in self.nodes() {
            if node.name.is_none() && !node.in_iterable {
                continue;
            }
            if !first && node.name.is_some() {
                write!(f, ".")?;
            }
            write!(f, "{}", node)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path(\"{}\")", self)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.nodes())
    }
}

/// Read a selector after `[`, up to and including the closing `]`.
fn parse_selector(chars: &mut Peekable<Chars<'_>>) -> Option<ElementPosition> {
    if chars.peek() == Some(&'"') {
        chars.next();
        let mut key = String::new();
        loop {
            match chars.next()? {
                '\\' => key.push(chars.next()?),
                '"' => break,
                c => key.push(c),
            }
        }
        return (chars.next()? == ']').then_some(ElementPosition::Key(key));
    }

    let mut raw = String::new();
    loop {
        match chars.next()? {
            ']' => break,
            '[' | '"' => return None,
            c => raw.push(c),
        }
    }
    Some(if raw.is_empty() {
        ElementPosition::Unindexed
    } else if let Ok(index) = raw.parse::<usize>() {
        ElementPosition::Index(index)
    } else {
        ElementPosition::Key(raw)
    })
}

/// Keys printed without quotes must parse back as the same key.
fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key.parse::<usize>().is_err()
        && !key.chars().any(|c| matches!(c, '.' | '[' | ']' | '"' | '\\'))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
