//! Client for the ECOMM card-payment merchant handler.
//!
//! The gateway speaks a small legacy protocol: every command is an HTTPS POST
//! of `application/x-www-form-urlencoded` fields, authenticated with a client
//! certificate, and every answer is plain text with one `KEY: value` pair per
//! line.
//!
//! # Layers
//!
//! - [`Command`]: collects transaction parameters and runs one operation
//! - [`Payload`]: ordered request fields and their form encoding
//! - [`Transport`]: delivers an encoded body ([`HttpsTransport`] over mutual TLS)
//! - [`parse_response`]: turns the text answer into a [`GatewayResponse`]
//!
//! # Quick example
//!
//! ```no_run
//! use ecomm::{GatewayClient, GatewayConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = GatewayConfig::from_env().unwrap();
//! let client = GatewayClient::new(config).unwrap();
//!
//! let status = client
//!     .command()
//!     .client_ip("1.2.3.4")
//!     .transaction_status("2Lt8d2b5/ipzS2ohnwu+Rp0xVVg=")
//!     .await
//!     .unwrap();
//!
//! println!("{:?} {:?}", status.result(), status.result_code());
//! # }
//! ```

pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod identity;
pub mod payload;
pub mod response;
pub mod transport;

// Re-exports
pub use command::{
    redirect_url, Command, CommandState, GatewayClient, Operation, TransactionType,
};
pub use config::{GatewayConfig, IdentityFormat};
pub use error::{Field, GatewayError, ParseError, TransportError};
pub use identity::TlsBackend;
pub use payload::{FieldValue, Payload};
pub use response::{parse_response, GatewayResponse, TransactionResult};
pub use transport::{HttpsTransport, Transport};

pub use url::Url;
