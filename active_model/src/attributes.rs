//! Attribute bag
//!
//! An insertion-ordered field map carried by every model instance. Keys are not
//! declared up front; the order keys were first set in becomes the column order
//! of generated INSERT statements.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primary key column every model table is expected to have
pub const PRIMARY_KEY: &str = "id";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    fields: IndexMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its original position when it already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Value of a field, `None` when it was never set
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// True when the field is set to something other than null
    pub fn has(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|value| !value.is_null())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields that are written by INSERT/UPDATE: everything except the primary key
    pub fn writable(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter().filter(|(name, _)| name.as_str() != PRIMARY_KEY)
    }

    /// Copy of the bag with the write filter applied.
    ///
    /// Null stays null and scalars pass through untouched. Arrays and objects
    /// are stored as their JSON text.
    pub fn sanitized(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), sanitize_value(value)))
            .collect();
        Self { fields }
    }

    /// True when the primary key holds anything but null or a blank string
    pub fn has_primary_key(&self) -> bool {
        match self.fields.get(PRIMARY_KEY) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Interpret the primary key as a row id.
    ///
    /// Integers and integer strings are accepted; anything else gives `None`,
    /// including a key that [`Attributes::has_primary_key`] reports as set.
    pub fn primary_key(&self) -> Option<i64> {
        match self.fields.get(PRIMARY_KEY)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields.into_iter().collect())
    }

    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        }
    }
}

fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
