//! Form State Container: every value a wizard collects, across all of its steps.
//!
//! The form is a flat map keyed by field name. Variable-length sections (work
//! experience, education) are lists of [`Record`]s with stable ids so entries can be
//! removed or edited without relying on their position.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single field value. Serialized untagged so a saved draft looks like the form
/// a browser would have produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Tags(Vec<String>),
    Records(Vec<Record>),
}

/// One entry of a repeatable section, e.g. a single work-experience item.
///
/// Serialized as `{"id", "fields": {..}}`. Deserialization also takes the flat
/// `{"id"?, "company": .., ..}` shape a browser form posts; a missing id gets a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: Uuid,
    pub fields: BTreeMap<String, FieldValue>,
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;

        let id = match object.remove("id") {
            Some(Value::String(raw)) => Uuid::parse_str(raw.trim()).map_err(D::Error::custom)?,
            Some(Value::Null) | None => Uuid::new_v4(),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "record id must be a string, got {other}"
                )))
            }
        };

        let raw_fields = match object.remove("fields") {
            Some(Value::Object(nested)) if object.is_empty() => nested,
            Some(other) => {
                object.insert("fields".to_string(), other);
                object
            }
            None => object,
        };

        let fields = raw_fields
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_value::<FieldValue>(value)
                    .map(|v| (key.clone(), v))
                    .map_err(|e| D::Error::custom(format!("record field `{key}`: {e}")))
            })
            .collect::<Result<BTreeMap<_, _>, D::Error>>()?;

        Ok(Self { id, fields })
    }
}

impl Record {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl FieldValue {
    /// True when the value carries nothing a user typed: blank text or an empty list.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Tags(items) => items.iter().all(|t| t.trim().is_empty()),
            FieldValue::Records(records) => records.is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    /// Numeric view. Form inputs often arrive as text, so numeric strings count.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Plain-text rendering used for prompts and summaries.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => s.trim().to_string(),
            FieldValue::Tags(items) => items
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            FieldValue::Records(records) => records
                .iter()
                .map(|r| {
                    r.fields
                        .iter()
                        .filter(|(_, v)| !v.is_blank())
                        .map(|(k, v)| format!("{k}: {}", v.render()))
                        .collect::<Vec<_>>()
                        .join("; ")
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::Tags(items)
    }
}

/// The full set of field values for a wizard, independent of the current step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.values.remove(key)
    }

    /// Partial update: every key in `patch` overwrites, everything else is kept.
    pub fn merge(&mut self, patch: BTreeMap<String, FieldValue>) {
        self.values.extend(patch);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    /// Trimmed text value; `None` when absent, not text, or blank.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(FieldValue::Text(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(FieldValue::as_number)
    }

    /// Non-blank list items. A single text value is treated as a comma-separated list.
    pub fn tags(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(FieldValue::Tags(items)) => items
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            Some(FieldValue::Text(s)) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn records(&self, key: &str) -> &[Record] {
        match self.values.get(key) {
            Some(FieldValue::Records(records)) => records,
            _ => &[],
        }
    }

    /// Appends a record to a repeatable section and returns its id.
    /// An absent or empty list (which deserializes as `Tags([])`) becomes a record list.
    pub fn append_record(&mut self, key: &str, fields: BTreeMap<String, FieldValue>) -> Uuid {
        let record = Record::new(fields);
        let id = record.id;
        match self.values.get_mut(key) {
            Some(FieldValue::Records(records)) => records.push(record),
            _ => {
                self.values
                    .insert(key.to_string(), FieldValue::Records(vec![record]));
            }
        }
        id
    }

    /// Removes the record with `id`. Returns false when no such record exists.
    pub fn remove_record(&mut self, key: &str, id: Uuid) -> bool {
        match self.values.get_mut(key) {
            Some(FieldValue::Records(records)) => {
                let before = records.len();
                records.retain(|r| r.id != id);
                records.len() != before
            }
            _ => false,
        }
    }

    /// Merges `patch` into the fields of record `id`.
    pub fn update_record(
        &mut self,
        key: &str,
        id: Uuid,
        patch: BTreeMap<String, FieldValue>,
    ) -> bool {
        match self.values.get_mut(key) {
            Some(FieldValue::Records(records)) => match records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.fields.extend(patch);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Renders the named fields as plain text, skipping blank ones.
    pub fn snapshot(&self, keys: &[&str]) -> BTreeMap<String, String> {
        keys.iter()
            .filter_map(|k| {
                self.values
                    .get(*k)
                    .filter(|v| !v.is_blank())
                    .map(|v| (k.to_string(), v.render()))
            })
            .collect()
    }
}
