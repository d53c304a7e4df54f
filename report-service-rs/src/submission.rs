// report-service-rs/src/submission.rs
// Captured form field values, kept in submission order

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Field {key} has unsupported value type {kind}")]
    UnsupportedValue { key: String, kind: &'static str },
}

/// Ordered field key/value pairs from one form submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Capture a JSON object's fields
    ///
    /// Strings are taken as-is, numbers and booleans are stringified.
    /// Nulls, arrays and nested objects are rejected.
    pub fn from_json_map(map: &Map<String, Value>) -> Result<Self, SubmissionError> {
        let mut fields = Vec::with_capacity(map.len());

        for (key, value) in map {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => return Err(unsupported(key, "null")),
                Value::Array(_) => return Err(unsupported(key, "array")),
                Value::Object(_) => return Err(unsupported(key, "object")),
            };
            fields.push((key.clone(), text));
        }

        Ok(Self { fields })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn unsupported(key: &str, kind: &'static str) -> SubmissionError {
    SubmissionError::UnsupportedValue {
        key: key.to_string(),
        kind,
    }
}

impl<'de> Deserialize<'de> for FormSubmission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        FormSubmission::from_json_map(&map).map_err(de::Error::custom)
    }
}

impl Serialize for FormSubmission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        map.serialize(serializer)
    }
}
