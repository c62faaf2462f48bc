use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// An ordered mapping from field name to value, the output of every schema.
pub type Record = IndexMap<String, Value>;

/// Attribute access for values that are neither mappings, sequences nor sets.
///
/// This is the fallback navigation target: a step against an opaque object is
/// resolved by name through `attr`.
pub trait Opaque: fmt::Debug + Send + Sync {
    /// Returns the named attribute, or `None` if the object has no such attribute.
    fn attr(&self, name: &str) -> Option<Value>;

    /// Short type description used in error messages.
    fn type_name(&self) -> &str {
        "object"
    }
}

/// A node of semi-structured data.
///
/// The container shape is decided once, when data enters the crate (for example
/// through `From<serde_json::Value>`), so navigation dispatches on a closed tag.
///
/// `Absent` is the sentinel for "nothing here" and is distinct from a present
/// `Null`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered sequence.
    Seq(Vec<Value>),
    /// Unordered set. Elements are unique; navigation only tests membership.
    Set(Vec<Value>),
    /// Ordered mapping with string keys.
    Map(Record),
    Object(Arc<dyn Opaque>),
}

impl Value {
    /// Builds a set, dropping duplicate elements.
    pub fn set(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Builds a sequence.
    pub fn seq(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Builds a mapping, keeping insertion order.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, impl Into<Value>)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps an opaque object.
    pub fn object(obj: impl Opaque + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether navigation should treat this value as empty.
    ///
    /// Absent, null, empty strings and empty containers are empty; scalars
    /// such as `0` or `false` are not.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Absent | Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::Seq(items) | Value::Set(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Truthiness in the usual dynamic-language sense.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Object(_) => true,
            other => !other.is_empty(),
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Set(_) => "set",
            Value::Map(_) => "mapping",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Elements of a sequence or set.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Text form of a scalar. Containers, objects and absent values have none.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Value::Null => Some("None".to_string()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "Absent"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "{b:?}"),
            Value::Int(i) => write!(f, "{i:?}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Seq(items) => f.debug_list().entries(items).finish(),
            Value::Set(items) => f.debug_set().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Absent | Value::Null | Value::Object(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Seq(items) | Value::Set(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::Seq(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Record> for Value {
    fn from(map: Record) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::seq(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_deduplicates() {
        let set = Value::set(["e", "f", "e"]);
        assert_eq!(set.as_items().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn set_equality_ignores_order() {
        assert_eq!(Value::set(["a", "b"]), Value::set(["b", "a"]));
        assert_ne!(Value::seq(["a", "b"]), Value::seq(["b", "a"]));
    }

    #[test]
    fn absent_differs_from_null() {
        assert_ne!(Value::Absent, Value::Null);
        assert!(Value::Absent.is_empty());
        assert!(Value::Null.is_empty());
    }

    #[test]
    fn zero_is_not_empty_but_falsy() {
        assert!(!Value::Int(0).is_empty());
        assert!(!Value::Int(0).is_truthy());
    }

    #[test]
    fn from_json_keeps_key_order() {
        let json: serde_json::Value = serde_json::from_str(r#"{"z": 1, "a": [true, null, 1.5]}"#).unwrap();
        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["z", "a"]);
        assert_eq!(map["a"], Value::seq([Value::Bool(true), Value::Null, Value::Float(1.5)]));
    }

    #[test]
    fn absent_serializes_as_null() {
        let value = Value::map([("a", Value::Absent), ("b", Value::set([1]))]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":null,"b":[1]}"#);
    }
}
