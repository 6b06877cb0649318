//! Dotted field-path traversal.
//!
//! A path such as `reference.authors.author` is walked one segment at a time.
//! Lists met along the way fan out: the rest of the path is resolved against
//! every element and the results are flattened in element order. Scalars end
//! the walk wherever they are met, so a path may safely run past a terminal
//! field.
//!
//! The walk does not care whether a node is a raw JSON mapping or a
//! schema-backed record; both implement [`FieldSource`].

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Converts a JSON scalar. Returns `None` for null, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::String(s) => Some(Scalar::Str(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Int(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

// Floats compare by bit pattern so scalars can key hash maps.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Str(s) => s.hash(state),
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::Float(f) => f.to_bits().hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

/// Anything a path segment can be looked up on.
pub trait FieldSource<'a> {
    /// Looks up `name`. An undeclared name is an error; a declared but empty
    /// field is [`Node::Absent`].
    fn field(&self, name: &str) -> Result<Node<'a>>;
}

impl<'a> FieldSource<'a> for &'a Map<String, Value> {
    fn field(&self, name: &str) -> Result<Node<'a>> {
        let map: &'a Map<String, Value> = *self;
        match map.get(name) {
            Some(value) => Ok(Node::from_json(value)),
            None => Err(Error::UnknownField {
                field: name.to_string(),
                owner: "mapping".to_string(),
            }),
        }
    }
}

pub enum Node<'a> {
    /// Explicit null, or a declared field with no value.
    Absent,
    Scalar(Scalar),
    List(Vec<Node<'a>>),
    Object(Box<dyn FieldSource<'a> + 'a>),
}

impl<'a> Node<'a> {
    pub fn from_json(value: &'a Value) -> Node<'a> {
        match value {
            Value::Null => Node::Absent,
            Value::Array(items) => Node::List(items.iter().map(Node::from_json).collect()),
            Value::Object(map) => Node::Object(Box::new(map)),
            scalar => Scalar::from_json(scalar).map_or(Node::Absent, Node::Scalar),
        }
    }

    pub fn object<S: FieldSource<'a> + 'a>(source: S) -> Node<'a> {
        Node::Object(Box::new(source))
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Absent => f.write_str("Absent"),
            Node::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Node::List(items) => f.debug_tuple("List").field(items).finish(),
            Node::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Lazy iterator over the leaves reached by a field path.
///
/// Yields at most one error, after which it is exhausted.
pub struct Leaves<'a, 'p> {
    stack: Vec<(Node<'a>, Option<&'p str>)>,
}

impl<'a, 'p> Iterator for Leaves<'a, 'p> {
    type Item = Result<Scalar>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, path)) = self.stack.pop() {
            match node {
                Node::Absent => {}
                Node::Scalar(value) => return Some(Ok(value)),
                Node::List(items) => {
                    // Reversed so the first element is popped first.
                    for item in items.into_iter().rev() {
                        self.stack.push((item, path));
                    }
                }
                Node::Object(source) => {
                    let Some(path) = path else { continue };
                    let (head, rest) = match path.split_once('.') {
                        Some((head, rest)) => (head, Some(rest)),
                        None => (path, None),
                    };
                    match source.field(head) {
                        Ok(child) => self.stack.push((child, rest)),
                        Err(e) => {
                            self.stack.clear();
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
        None
    }
}

/// Resolves `path` against `node`. An empty path only yields `node` itself
/// when it is a scalar.
pub fn resolve<'a, 'p>(node: Node<'a>, path: &'p str) -> Leaves<'a, 'p> {
    let path = if path.is_empty() { None } else { Some(path) };
    Leaves {
        stack: vec![(node, path)],
    }
}

pub fn resolve_json<'a, 'p>(value: &'a Value, path: &'p str) -> Leaves<'a, 'p> {
    resolve(Node::from_json(value), path)
}
