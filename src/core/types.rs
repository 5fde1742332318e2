//! Core value types that make up a validated object graph.
//!
//! The graph model uses an enum-based approach:
//! - Closed set of shapes: scalars, containers and typed objects
//! - Objects are shared through `Arc` so graphs may contain cycles
//! - Identity is explicit (`BeanId`) rather than pointer based

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity of a bean instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeanId(pub Uuid);

impl BeanId {
    /// Create a new random bean ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BeanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BeanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Shared handle to a bean.
pub type BeanRef = Arc<Bean>;

/// A typed node of the object graph.
///
/// Properties sit behind a lock so that references between beans can be
/// wired after construction, which is the only way to build a cycle out of
/// `Arc`s.
pub struct Bean {
    id: BeanId,
    type_name: String,
    properties: RwLock<IndexMap<String, Value>>,
}

impl Bean {
    /// Create an empty bean of the given type.
    pub fn new(type_name: impl Into<String>) -> BeanRef {
        Arc::new(Self {
            id: BeanId::new(),
            type_name: type_name.into(),
            properties: RwLock::new(IndexMap::new()),
        })
    }

    /// Create a bean with an initial set of properties.
    pub fn with_properties<I, K>(type_name: impl Into<String>, properties: I) -> BeanRef
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let bean = Self::new(type_name);
        for (name, value) in properties {
            bean.set(name, value);
        }
        bean
    }

    /// Identity of this bean.
    pub fn id(&self) -> BeanId {
        self.id
    }

    /// Name of the bean's runtime type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Read a property. Missing properties read as `Value::Null`.
    pub fn get(&self, name: &str) -> Value {
        self.properties
            .read()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Set (or replace) a property.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.properties.write().insert(name.into(), value);
    }

    /// Names of all properties currently set.
    pub fn property_names(&self) -> Vec<String> {
        self.properties.read().keys().cloned().collect()
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Properties are left out; they may point back at this bean.
        f.debug_struct("Bean")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Values that can appear in an object graph.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered, indexable collection
    List(Vec<Value>),
    /// Unordered collection without positional access
    Set(Vec<Value>),
    /// Fixed-size indexable array
    Array(Vec<Value>),
    /// Key-value map with insertion order
    Map(IndexMap<String, Value>),
    /// Reference to a typed bean
    Object(BeanRef),
}

/// Runtime kind of a value, used to pick a validator implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Absent value
    Null,
    /// Boolean
    Boolean,
    /// Signed integer
    Integer,
    /// Floating point number
    Float,
    /// String
    String,
    /// Ordered list
    List,
    /// Unordered set
    Set,
    /// Fixed array
    Array,
    /// String-keyed map
    Map,
    /// Object of the named type
    Object(String),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Object(type_name) => write!(f, "Object<{}>", type_name),
            other => write!(f, "{:?}", other),
        }
    }
}

// ============================================================================
// Value Accessors
// ============================================================================

impl Value {
    /// Convenience constructor for string values.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Get the runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::Object(bean) => ValueKind::Object(bean.type_name().to_string()),
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float.
    /// Integers are automatically converted to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Try to get this value as a bean reference.
    pub fn as_bean(&self) -> Option<&BeanRef> {
        if let Value::Object(bean) = self {
            Some(bean)
        } else {
            None
        }
    }

    /// Identity of the referenced bean, if this value is an object.
    pub fn identity(&self) -> Option<BeanId> {
        self.as_bean().map(|bean| bean.id())
    }

    /// Number of elements for strings and containers.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List(items) | Value::Set(items) | Value::Array(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Check whether a string or container has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Element access by position for lists and arrays.
    pub fn element_at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) | Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Entry access by key for maps.
    pub fn entry(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Render this value as JSON for reports.
    ///
    /// Objects are rendered as a type/id stub so cyclic graphs stay finite.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => json!(b),
            Value::Integer(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::String(s) => json!(s),
            Value::List(items) | Value::Set(items) | Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Object(bean) => json!({
                "type": bean.type_name(),
                "id": bean.id().to_string(),
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b))
            | (Value::Set(a), Value::Set(b))
            | (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(self, state);
    }
}

/// Hash a Value consistently with its `PartialEq` implementation.
fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    std::mem::discriminant(value).hash(hasher);

    match value {
        Value::Null => {}
        Value::Integer(i) => i.hash(hasher),
        Value::Float(f) => f.to_bits().hash(hasher),
        Value::String(s) => s.hash(hasher),
        Value::Boolean(b) => b.hash(hasher),
        Value::List(items) | Value::Set(items) | Value::Array(items) => {
            items.len().hash(hasher);
            for v in items {
                hash_value(v, hasher);
            }
        }
        Value::Map(map) => {
            map.len().hash(hasher);
            for (k, v) in map {
                k.hash(hasher);
                hash_value(v, hasher);
            }
        }
        Value::Object(bean) => bean.id().hash(hasher),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::List(items) => write!(f, "List[{}]", items.len()),
            Value::Set(items) => write!(f, "Set[{}]", items.len()),
            Value::Array(items) => write!(f, "Array[{}]", items.len()),
            Value::Map(map) => write!(f, "Map{{{} entries}}", map.len()),
            Value::Object(bean) => write!(f, "{}@{}", bean.type_name(), bean.id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<BeanRef> for Value {
    fn from(bean: BeanRef) -> Self {
        Value::Object(bean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_bean_properties() {
        let bean = Bean::with_properties("Person", [("name", Value::string("Ada"))]);
        assert_eq!(bean.get("name"), Value::string("Ada"));
        assert_eq!(bean.get("missing"), Value::Null);

        bean.set("age", Value::Integer(36));
        assert_eq!(bean.property_names(), vec!["name", "age"]);
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = Bean::new("Person");
        let b = Bean::new("Person");

        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a.clone()), Value::Object(b));
        assert_eq!(
            hash_of(&Value::Object(a.clone())),
            hash_of(&Value::Object(a))
        );
    }

    #[test]
    fn test_cyclic_graph_debug_terminates() {
        let a = Bean::new("A");
        let b = Bean::new("B");
        a.set("b", Value::Object(b.clone()));
        b.set("a", Value::Object(a.clone()));

        let rendered = format!("{:?}", Value::Object(a.clone()));
        assert!(rendered.contains("\"A\""));

        let json = Value::Object(a).to_json();
        assert_eq!(json["type"], "A");
    }

    #[test]
    fn test_value_kind_and_len() {
        assert_eq!(Value::Integer(1).kind(), ValueKind::Integer);
        assert_eq!(
            Value::Object(Bean::new("Car")).kind(),
            ValueKind::Object("Car".to_string())
        );
        assert_eq!(Value::string("héllo").len(), Some(5));
        assert!(Value::List(vec![]).is_empty());
        assert_eq!(Value::Boolean(true).len(), None);
        assert_eq!(Value::Integer(3).as_float(), Some(3.0));
    }
}
