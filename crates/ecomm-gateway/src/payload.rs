//! Request payloads and their `application/x-www-form-urlencoded` encoding.

use std::fmt;

/// A single request field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(u64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        FieldValue::Number(value.into())
    }
}

/// Ordered set of request fields.
///
/// Fields may be pushed without a value; those are kept in the list but
/// never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(&'static str, Option<FieldValue>)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field that always has a value.
    pub fn with(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name, Some(value.into())));
        self
    }

    /// Append a field that may be absent.
    pub fn with_opt<V: Into<FieldValue>>(mut self, name: &'static str, value: Option<V>) -> Self {
        self.fields.push((name, value.map(Into::into)));
        self
    }

    /// Value of a defined field, if present.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.defined().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Iterate over the fields that carry a value, in insertion order.
    pub fn defined(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> + '_ {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (*name, v)))
    }

    /// Number of fields that will be serialized.
    pub fn len(&self) -> usize {
        self.defined().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Percent-encode the defined fields as `name=value` pairs joined by `&`.
    pub fn encode(&self) -> String {
        self.defined()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(&value.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
