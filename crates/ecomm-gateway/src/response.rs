//! Parser for the merchant handler's line-oriented responses.
//!
//! The gateway answers with plain text, one `KEY: value` pair per line:
//!
//! ```text
//! RESULT: OK
//! RESULT_CODE: 000
//! RRN: 123456789012
//! APPROVAL_CODE: 7F3A2B
//! ```
//!
//! Keys are re-cased to camelCase (`RESULT_CODE` becomes `resultCode`) so
//! callers see one consistent naming scheme whatever the gateway sends.

use std::collections::BTreeMap;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Parsed gateway response: camel-cased key to trimmed value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayResponse {
    fields: BTreeMap<String, String>,
}

impl GatewayResponse {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.fields
    }

    /// `TRANSACTION_ID`, returned by create-transaction commands.
    pub fn transaction_id(&self) -> Option<&str> {
        self.get("transactionId")
    }

    /// `RESULT`, decoded into a [`TransactionResult`].
    pub fn result(&self) -> Option<TransactionResult> {
        self.get("result").map(TransactionResult::from_wire)
    }

    /// `RESULT_CODE`, the three-digit processor code.
    pub fn result_code(&self) -> Option<&str> {
        self.get("resultCode")
    }

    /// `error`, sent instead of a result when the gateway rejects a command.
    pub fn error(&self) -> Option<&str> {
        self.get("error")
    }
}

impl From<BTreeMap<String, String>> for GatewayResponse {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}

/// Value of the `RESULT` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResult {
    Ok,
    Failed,
    Created,
    Pending,
    Declined,
    Reversed,
    AutoReversed,
    Timeout,
    Other(String),
}

impl TransactionResult {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "OK" => Self::Ok,
            "FAILED" => Self::Failed,
            "CREATED" => Self::Created,
            "PENDING" => Self::Pending,
            "DECLINED" => Self::Declined,
            "REVERSED" => Self::Reversed,
            "AUTOREVERSED" => Self::AutoReversed,
            "TIMEOUT" => Self::Timeout,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Parse a raw response body.
///
/// Blank lines are ignored. A non-blank line without a `:` separator, or
/// with nothing before or after it, fails the whole parse; the reported
/// line number counts from the first line of `raw`. On duplicate keys the
/// last line wins.
pub fn parse_response(raw: &str) -> Result<GatewayResponse, ParseError> {
    let mut fields = BTreeMap::new();

    for (index, line) in raw.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let number = index + 1;

        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::MissingSeparator {
                line: number,
                content: line.to_string(),
            })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::EmptyKey {
                line: number,
                content: line.to_string(),
            });
        }

        let value = value.trim();
        if value.is_empty() {
            return Err(ParseError::EmptyValue {
                line: number,
                content: line.to_string(),
            });
        }

        fields.insert(camel_key(key), value.to_string());
    }

    Ok(GatewayResponse { fields })
}

/// `TRANSACTION_ID` -> `transactionId`.
pub fn camel_key(key: &str) -> String {
    key.to_case(Case::Camel)
}
