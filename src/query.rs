//! Query Tree
//!
//! Untyped, arbitrarily nested query body as a closed tagged union, plus a
//! recursive visitor used by the risk scorer to search the whole tree.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Key under which generators conventionally wrap a query body.
pub const WRAPPER_KEY: &str = "dsl";

/// Leaf value of a query tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// Query body: mapping, sequence or scalar, nested to any depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Query {
    Mapping(BTreeMap<String, Query>),
    Sequence(Vec<Query>),
    Scalar(Scalar),
}

/// Visitor over a query tree.
///
/// Every mapping key is reported before its value is walked. `finished`
/// lets a visitor stop the walk once it has seen enough.
pub trait Visitor {
    fn visit_key(&mut self, key: &str);

    fn finished(&self) -> bool {
        false
    }
}

impl Query {
    /// An empty mapping, `{}`.
    pub fn empty() -> Self {
        Query::Mapping(BTreeMap::new())
    }

    /// Look up a key on a mapping node. Non-mapping nodes have no keys.
    pub fn get(&self, key: &str) -> Option<&Query> {
        match self {
            Query::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Query::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Query::Mapping(_))
    }

    /// Set a top-level key. No-op on sequences and scalars.
    pub fn set(&mut self, key: &str, value: Query) {
        if let Query::Mapping(map) = self {
            map.insert(key.to_string(), value);
        }
    }

    /// Strip the conventional `{"dsl": ...}` wrapper if present.
    pub fn unwrap_wrapped(self) -> Query {
        match self {
            Query::Mapping(mut map) if map.contains_key(WRAPPER_KEY) => {
                map.remove(WRAPPER_KEY).unwrap_or_else(Query::empty)
            }
            other => other,
        }
    }

    /// Walk the tree depth-first, mappings and sequences alike.
    pub fn accept<V: Visitor>(&self, visitor: &mut V) {
        self.walk(visitor);
    }

    fn walk<V: Visitor>(&self, visitor: &mut V) {
        if visitor.finished() {
            return;
        }
        match self {
            Query::Mapping(map) => {
                for (key, value) in map {
                    visitor.visit_key(key);
                    if visitor.finished() {
                        return;
                    }
                    value.walk(visitor);
                }
            }
            Query::Sequence(items) => {
                for item in items {
                    item.walk(visitor);
                    if visitor.finished() {
                        return;
                    }
                }
            }
            Query::Scalar(_) => {}
        }
    }

    /// Whether `key` appears on any mapping anywhere in the tree.
    pub fn contains_key(&self, key: &str) -> bool {
        struct KeyFinder<'a> {
            key: &'a str,
            found: bool,
        }

        impl Visitor for KeyFinder<'_> {
            fn visit_key(&mut self, key: &str) {
                if key == self.key {
                    self.found = true;
                }
            }

            fn finished(&self) -> bool {
                self.found
            }
        }

        let mut finder = KeyFinder { key, found: false };
        self.accept(&mut finder);
        finder.found
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Query {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Query::Mapping(
                map.into_iter().map(|(k, v)| (k, Query::from(v))).collect(),
            ),
            Value::Array(items) => Query::Sequence(items.into_iter().map(Query::from).collect()),
            Value::Null => Query::Scalar(Scalar::Null),
            Value::Bool(b) => Query::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Query::Scalar(Scalar::Number(n)),
            Value::String(s) => Query::Scalar(Scalar::String(s)),
        }
    }
}

impl From<Query> for Value {
    fn from(query: Query) -> Self {
        match query {
            Query::Mapping(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
            Query::Sequence(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Query::Scalar(Scalar::Null) => Value::Null,
            Query::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            Query::Scalar(Scalar::Number(n)) => Value::Number(n),
            Query::Scalar(Scalar::String(s)) => Value::String(s),
        }
    }
}

impl From<u64> for Query {
    fn from(n: u64) -> Self {
        Query::Scalar(Scalar::Number(Number::from(n)))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = Value::from(self.clone());
        write!(f, "{}", value)
    }
}
