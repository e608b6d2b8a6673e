use std::fmt;

use thiserror::Error;

/// Transaction fields an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Amount,
    Currency,
    ClientIp,
    Language,
    TransactionId,
    BillerClientId,
}

impl Field {
    /// Name of the field on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Field::Amount => crate::constants::AMOUNT,
            Field::Currency => crate::constants::CURRENCY,
            Field::ClientIp => crate::constants::CLIENT_IP_ADDR,
            Field::Language => crate::constants::LANGUAGE,
            Field::TransactionId => crate::constants::TRANS_ID,
            Field::BillerClientId => crate::constants::BILLER_CLIENT_ID,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Errors returned by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required field: {0}")]
    MissingField(Field),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed gateway response: {0}")]
    Parse(#[from] ParseError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to deliver a request or to get a successful HTTP answer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// A response line that does not follow the `KEY: value` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: no ':' separator in {content:?}")]
    MissingSeparator { line: usize, content: String },

    #[error("line {line}: empty key in {content:?}")]
    EmptyKey { line: usize, content: String },

    #[error("line {line}: empty value in {content:?}")]
    EmptyValue { line: usize, content: String },
}
