//! Typed document values.
//!
//! A [`Document`] is an ordered field map; a [`Value`] is the tagged union
//! stored in it. Mutation of nested values goes through a [`ValuePath`] so
//! the tree always has a single owner.

mod object_id;
mod path;

pub use object_id::{ObjectId, ObjectIdError};
pub use path::{Node, PathError, PathSegment, ValuePath};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// A value stored in a document field or list slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// UTC instant with millisecond precision.
    Timestamp(DateTime<Utc>),
    /// Cross-document reference.
    Reference(DbRef),
    ObjectId(ObjectId),
    List(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Lists and documents can be descended into; everything else is edited in place.
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Document(_))
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Timestamp(_) => "datetime",
            Self::Reference(_) => "reference",
            Self::ObjectId(_) => "objectid",
            Self::List(_) => "list",
            Self::Document(_) => "document",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Self::ObjectId(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Self::Document(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

/// Reference to a document in another collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    pub collection: String,
    pub id: Box<Value>,
}

impl DbRef {
    pub fn new(collection: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            collection: collection.into(),
            id: Box::new(id.into()),
        }
    }
}

/// Ordered mapping from field name to value.
///
/// Field order is the order the store yielded, which is also the display
/// order. Keys are unique: inserting an existing key replaces in place.
#[derive(Debug, Clone, Default)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove a field; later fields keep their relative order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Field at a display position.
    pub fn field_at(&self, idx: usize) -> Option<(&str, &Value)> {
        self.fields.get_index(idx).map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The identifier field, if present.
    pub fn id(&self) -> Option<&Value> {
        self.get(ID_FIELD)
    }
}

/// Equal documents hold the same fields in the same order.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.insert("_id", 7);
        doc.insert("name", "a");
        doc.insert("tags", vec![Value::from("x"), Value::from("y")]);
        doc
    }

    #[test]
    fn test_insert_preserves_order_and_replaces_in_place() {
        let mut doc = sample();
        let previous = doc.insert("_id", 8);
        assert_eq!(previous, Some(Value::Int(7)));
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, ["_id", "name", "tags"]);
        assert_eq!(doc.get("_id"), Some(&Value::Int(8)));
    }

    #[test]
    fn test_field_at_follows_insertion_order() {
        let doc = sample();
        assert_eq!(doc.field_at(1), Some(("name", &Value::from("a"))));
        assert_eq!(doc.field_at(3), None);
    }

    #[test]
    fn test_remove_drops_field() {
        let mut doc = sample();
        assert_eq!(doc.remove("name"), Some(Value::from("a")));
        assert_eq!(doc.len(), 2);
        assert!(doc.get("name").is_none());
    }

    #[test]
    fn test_remove_keeps_order_of_remaining_fields() {
        let mut doc = sample();
        doc.remove("_id");
        doc.insert("extra", true);
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, ["name", "tags", "extra"]);
        assert_eq!(doc.field_at(0), Some(("name", &Value::from("a"))));
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let forward: Document = [("a".to_string(), Value::Int(1)), ("b".to_string(), Value::Int(2))]
            .into_iter()
            .collect();
        let backward: Document = [("b".to_string(), Value::Int(2)), ("a".to_string(), Value::Int(1))]
            .into_iter()
            .collect();
        assert_ne!(forward, backward);
        assert_eq!(forward, forward.clone());
    }

    #[test]
    fn test_from_iter_keeps_last_duplicate_in_first_position() {
        let doc: Document = [
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
            ("a".to_string(), Value::Int(3)),
        ]
        .into_iter()
        .collect();
        assert_eq!(doc.field_at(0), Some(("a", &Value::Int(3))));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_is_container() {
        assert!(Value::List(vec![]).is_container());
        assert!(Value::Document(Document::new()).is_container());
        assert!(!Value::Null.is_container());
        assert!(!Value::from("x").is_container());
    }

    #[test]
    fn test_id_reads_identifier_field() {
        assert_eq!(sample().id(), Some(&Value::Int(7)));
        assert_eq!(Document::new().id(), None);
    }
}
