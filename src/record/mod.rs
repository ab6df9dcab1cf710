use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One data item of the list being displayed.
///
/// Records are free-form JSON objects. The renderer only looks at the
/// `first` and `last` fields; everything else travels through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Display text of a scalar field. Strings come back unquoted, numbers and
    /// booleans in their JSON notation. Null, arrays and objects have no text.
    pub fn text(&self, field: &str) -> Option<String> {
        scalar_text(self.0.get(field)?)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The value records are clustered by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Text(String),
    Integer(i64),
}

impl GroupKey {
    /// Key for a scalar JSON value. Integers that fit `i64` stay numeric,
    /// every other scalar is keyed by its display text.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(n) = value.as_i64() {
            return Some(Self::Integer(n));
        }
        scalar_text(value).map(Self::Text)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<char> for GroupKey {
    fn from(value: char) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for GroupKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for GroupKey {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

/// Ordered group key -> member record positions.
///
/// Keys keep the order in which they were first inserted; that order drives
/// render order. Inserting an existing key appends to its index list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Groups(IndexMap<GroupKey, Vec<usize>>);

impl Groups {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn push(&mut self, key: impl Into<GroupKey>, index: usize) {
        self.0.entry(key.into()).or_default().push(index);
    }

    pub fn append(&mut self, key: impl Into<GroupKey>, indexes: Vec<usize>) {
        self.0.entry(key.into()).or_default().extend(indexes);
    }

    pub fn get(&self, key: &GroupKey) -> Option<&[usize]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[usize])> {
        self.0.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<GroupKey>> FromIterator<(K, Vec<usize>)> for Groups {
    fn from_iter<I: IntoIterator<Item = (K, Vec<usize>)>>(iter: I) -> Self {
        let mut groups = Groups::new();
        groups.extend(iter);
        groups
    }
}

impl<K: Into<GroupKey>> Extend<(K, Vec<usize>)> for Groups {
    fn extend<I: IntoIterator<Item = (K, Vec<usize>)>>(&mut self, iter: I) {
        for (key, indexes) in iter {
            self.append(key, indexes);
        }
    }
}

impl IntoIterator for Groups {
    type Item = (GroupKey, Vec<usize>);
    type IntoIter = indexmap::map::IntoIter<GroupKey, Vec<usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Groups {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            key: &'a GroupKey,
            indexes: &'a [usize],
        }
        serializer.collect_seq(self.iter().map(|(key, indexes)| Entry { key, indexes }))
    }
}
