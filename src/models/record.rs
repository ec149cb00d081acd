//! Status record data model
//!
//! A tracking page reports its history as a table. Each row becomes a
//! [`StatusRecord`]: an ordered list of `field -> value` pairs. Records have no
//! key of their own, so two records are the same event iff every field matches.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque string naming one tracked entity (e.g. a shipment tracking id)
pub type Identifier = String;

/// Everything known about one identifier as of the last successful poll,
/// in the order the fetcher produced it
pub type Snapshot = Vec<StatusRecord>;

/// One row of status data
#[derive(Debug, Clone, Default)]
pub struct StatusRecord {
    fields: Vec<(String, String)>,
}

impl StatusRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing the value in place if the field already exists
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Builder-style variant of [`StatusRecord::insert`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Look up a field value
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate fields in their original order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Field order is presentation only; equality is over the field -> value mapping.
impl PartialEq for StatusRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, value)| other.get(name) == Some(value.as_str()))
    }
}

impl Eq for StatusRecord {}

impl<K, V> FromIterator<(K, V)> for StatusRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = StatusRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{}: {}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for StatusRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StatusRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = StatusRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat map of field names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut record = StatusRecord::new();
                // Older state files may hold null for cells that had no text
                while let Some((name, value)) = access.next_entry::<String, Option<String>>()? {
                    record.insert(name, value.unwrap_or_default());
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_field_order() {
        let a = StatusRecord::new().with("date", "01-02").with("status", "Shipped");
        let b = StatusRecord::new().with("status", "Shipped").with("date", "01-02");
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_detects_value_change() {
        let a = StatusRecord::new().with("status", "Shipped");
        let b = StatusRecord::new().with("status", "Shipped ");
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_detects_extra_field() {
        let a = StatusRecord::new().with("status", "Shipped");
        let b = a.clone().with("place", "Hub");
        assert_ne!(a, b);
        assert_ne!(b, a);
    }

    #[test]
    fn test_insert_replaces_existing_field() {
        let mut record = StatusRecord::new().with("status", "Shipped");
        record.insert("status", "Delivered");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("status"), Some("Delivered"));
    }

    #[test]
    fn test_json_keeps_field_order() {
        let record = StatusRecord::new()
            .with("Date", "Mon")
            .with("Time", "10:00")
            .with("Status", "Out for delivery");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Date":"Mon","Time":"10:00","Status":"Out for delivery"}"#
        );

        let parsed: StatusRecord = serde_json::from_str(&json).unwrap();
        let names: Vec<&str> = parsed.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Date", "Time", "Status"]);
    }

    #[test]
    fn test_null_values_load_as_empty() {
        let parsed: StatusRecord = serde_json::from_str(r#"{"status":null}"#).unwrap();
        assert_eq!(parsed.get("status"), Some(""));
    }

    #[test]
    fn test_display() {
        let record = StatusRecord::new().with("status", "Shipped").with("place", "Hub");
        assert_eq!(record.to_string(), "status: Shipped | place: Hub");
    }
}
