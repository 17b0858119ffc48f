use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Column holding the chipset stamp in the source datasets
pub const DEFAULT_IDENTIFIER_FIELD: &str = "Chipset SP";

/// Column names used for manually entered records
pub const CUSTOMER_FIELD: &str = "Customer";
pub const PDM_FIELD: &str = "PDM Name";

/// One chipset observation in one period
///
/// Fields are kept in their input order so that tables built from records
/// show columns the way the dataset listed them. Only the identifier field
/// has meaning to the comparator; everything else is carried through as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipsetRecord {
    fields: Vec<(String, String)>,
}

impl ChipsetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from (column, value) pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.set(k, v);
        }
        record
    }

    /// Builder-style setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing the value in place if the column already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Remove a column, returning its value if it was present
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Identifier under `field`, or None when absent, empty or blank
    pub fn identifier(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.trim().is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Serialized as a JSON object with columns in record order.
impl Serialize for ChipsetRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = ChipsetRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of column names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut record = ChipsetRecord::new();
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            record.set(key, value_to_cell(value));
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for ChipsetRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Flatten a JSON value into a table cell
fn value_to_cell(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
