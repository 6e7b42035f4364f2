//! Member record as served to callers

use crate::field_schema::CanonicalField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a single canonical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Mapping from canonical field to value; never holds raw export names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord {
    fields: BTreeMap<CanonicalField, FieldValue>,
}

impl UserRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Text value of a field, if present and scalar
    pub fn text(&self, field: CanonicalField) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn set(&mut self, field: CanonicalField, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    pub fn remove(&mut self, field: CanonicalField) -> Option<FieldValue> {
        self.fields.remove(&field)
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.fields.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(CanonicalField, FieldValue)> for UserRecord {
    fn from_iter<I: IntoIterator<Item = (CanonicalField, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
