//! Transaction command builder.
//!
//! A [`Command`] collects the parameters of one logical transaction through
//! chained setters and then runs exactly one gateway operation:
//!
//! ```no_run
//! use ecomm::{GatewayClient, GatewayConfig, TransactionType};
//!
//! # async fn run() -> Result<(), ecomm::GatewayError> {
//! let config = GatewayConfig::load("merchant.pem", "", "https://gateway.example.com/MerchantHandler")?;
//! let client = GatewayClient::new(config)?;
//!
//! let response = client
//!     .command()
//!     .amount(100)
//!     .currency(498)
//!     .client_ip("1.2.3.4")
//!     .language("en")
//!     .create_transaction(TransactionType::Sms)
//!     .await?;
//!
//! println!("transaction: {:?}", response.transaction_id());
//! # Ok(())
//! # }
//! ```
//!
//! Required fields are checked when the operation is invoked, not when they
//! are set, since each operation needs a different subset.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::config::GatewayConfig;
use crate::constants::*;
use crate::error::{Field, GatewayError};
use crate::payload::Payload;
use crate::response::{parse_response, GatewayResponse};
use crate::transport::{HttpsTransport, Transport};

/// Single- or dual-message transaction mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionType {
    /// Authorization and capture in one step.
    #[default]
    Sms,
    /// Authorization now, capture later with a commit.
    Dms,
}

impl TransactionType {
    pub fn msg_type(self) -> &'static str {
        match self {
            TransactionType::Sms => "SMS",
            TransactionType::Dms => "DMS",
        }
    }

    pub fn command_code(self) -> &'static str {
        match self {
            TransactionType::Sms => "v",
            TransactionType::Dms => "a",
        }
    }
}

/// One gateway operation with its operation-specific arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    CreateTransaction(TransactionType),
    TransactionStatus { trans_id: &'a str },
    CommitTransaction { trans_id: &'a str },
    RegisterCard { card_id: &'a str },
    ReverseTransaction { trans_id: &'a str },
    CloseBusinessDay,
    RegularPayment { card_id: &'a str },
    DeleteRegularPayment { card_id: &'a str },
}

impl Operation<'_> {
    /// Value of the `command` field.
    pub fn command_code(&self) -> &'static str {
        match self {
            Operation::CreateTransaction(kind) => kind.command_code(),
            Operation::TransactionStatus { .. } => "c",
            Operation::CommitTransaction { .. } => "t",
            Operation::RegisterCard { .. } => "p",
            Operation::ReverseTransaction { .. } => "r",
            Operation::CloseBusinessDay => "b",
            Operation::RegularPayment { .. } => "e",
            Operation::DeleteRegularPayment { .. } => "x",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateTransaction(_) => "create_transaction",
            Operation::TransactionStatus { .. } => "transaction_status",
            Operation::CommitTransaction { .. } => "commit_transaction",
            Operation::RegisterCard { .. } => "register_card",
            Operation::ReverseTransaction { .. } => "reverse_transaction",
            Operation::CloseBusinessDay => "close_business_day",
            Operation::RegularPayment { .. } => "regular_payment",
            Operation::DeleteRegularPayment { .. } => "delete_regular_payment",
        }
    }
}

impl fmt::Display for Operation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional transaction parameters accumulated by a [`Command`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandState {
    pub amount: Option<u64>,
    pub currency: Option<u16>,
    pub client_ip: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl CommandState {
    fn amount(&self) -> Result<u64, GatewayError> {
        self.amount.ok_or(GatewayError::MissingField(Field::Amount))
    }

    fn currency(&self) -> Result<u16, GatewayError> {
        self.currency.ok_or(GatewayError::MissingField(Field::Currency))
    }

    fn client_ip(&self) -> Result<&str, GatewayError> {
        self.client_ip
            .as_deref()
            .ok_or(GatewayError::MissingField(Field::ClientIp))
    }

    fn language(&self) -> Result<&str, GatewayError> {
        self.language
            .as_deref()
            .ok_or(GatewayError::MissingField(Field::Language))
    }

    /// Validate the state for `op` and assemble its payload.
    ///
    /// Required state fields are checked in a fixed order per operation,
    /// then the transaction or card id argument; the first missing one is
    /// reported.
    pub fn payload_for(&self, op: &Operation<'_>) -> Result<Payload, GatewayError> {
        let payload = Payload::new().with(COMMAND, op.command_code());

        let payload = match *op {
            Operation::CreateTransaction(kind) => {
                let amount = self.amount()?;
                let currency = self.currency()?;
                let client_ip = self.client_ip()?;
                let language = self.language()?;
                payload
                    .with(MSG_TYPE, kind.msg_type())
                    .with(AMOUNT, amount)
                    .with(CURRENCY, currency)
                    .with(CLIENT_IP_ADDR, client_ip)
                    .with_opt(DESCRIPTION, self.description.as_deref())
                    .with(LANGUAGE, language)
            }
            Operation::TransactionStatus { trans_id } => {
                let client_ip = self.client_ip()?;
                let trans_id = non_empty(trans_id, Field::TransactionId)?;
                payload
                    .with(TRANS_ID, trans_id)
                    .with(CLIENT_IP_ADDR, client_ip)
            }
            Operation::CommitTransaction { trans_id } => {
                let amount = self.amount()?;
                let currency = self.currency()?;
                let client_ip = self.client_ip()?;
                let language = self.language()?;
                let trans_id = non_empty(trans_id, Field::TransactionId)?;
                payload
                    .with(TRANS_ID, trans_id)
                    .with(AMOUNT, amount)
                    .with(CURRENCY, currency)
                    .with(CLIENT_IP_ADDR, client_ip)
                    .with_opt(DESCRIPTION, self.description.as_deref())
                    .with(LANGUAGE, language)
            }
            Operation::RegisterCard { card_id } => {
                let currency = self.currency()?;
                let client_ip = self.client_ip()?;
                let card_id = non_empty(card_id, Field::BillerClientId)?;
                payload
                    .with(BILLER_CLIENT_ID, card_id)
                    .with_opt(AMOUNT, self.amount)
                    .with(CURRENCY, currency)
                    .with(CLIENT_IP_ADDR, client_ip)
                    .with_opt(DESCRIPTION, self.description.as_deref())
                    .with_opt(LANGUAGE, self.language.as_deref())
                    .with(PERSPAYEE_EXPIRY, PERSPAYEE_EXPIRY_VALUE)
                    .with(PERSPAYEE_GEN, 1u64)
                    .with(PERSPAYEE_OVERWRITE, 1u64)
                    .with(MSG_TYPE, REGISTER_CARD_MSG_TYPE)
            }
            Operation::ReverseTransaction { trans_id } => {
                let amount = self.amount()?;
                let trans_id = non_empty(trans_id, Field::TransactionId)?;
                payload.with(TRANS_ID, trans_id).with(AMOUNT, amount)
            }
            Operation::CloseBusinessDay => payload,
            Operation::RegularPayment { card_id } => {
                let amount = self.amount()?;
                let currency = self.currency()?;
                let client_ip = self.client_ip()?;
                let card_id = non_empty(card_id, Field::BillerClientId)?;
                payload
                    .with(BILLER_CLIENT_ID, card_id)
                    .with(AMOUNT, amount)
                    .with(CURRENCY, currency)
                    .with(CLIENT_IP_ADDR, client_ip)
                    .with_opt(DESCRIPTION, self.description.as_deref())
                    .with_opt(LANGUAGE, self.language.as_deref())
            }
            Operation::DeleteRegularPayment { card_id } => {
                let card_id = non_empty(card_id, Field::BillerClientId)?;
                payload.with(BILLER_CLIENT_ID, card_id)
            }
        };

        Ok(payload)
    }
}

fn non_empty(value: &str, field: Field) -> Result<&str, GatewayError> {
    if value.trim().is_empty() {
        Err(GatewayError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Entry point: owns the transport and hands out fresh commands.
#[derive(Debug, Clone)]
pub struct GatewayClient<T: Transport = HttpsTransport> {
    transport: T,
    client_handler_url: Option<Url>,
}

impl GatewayClient<HttpsTransport> {
    /// Build a client that talks HTTPS with the configured client identity.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let config = Arc::new(config);
        let client_handler_url = config.client_handler_url().cloned();
        Ok(Self {
            transport: HttpsTransport::new(config)?,
            client_handler_url,
        })
    }
}

impl<T: Transport> GatewayClient<T> {
    /// Build a client around any transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            client_handler_url: None,
        }
    }

    pub fn with_client_handler_url(mut self, url: Url) -> Self {
        self.client_handler_url = Some(url);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start a new transaction with empty state.
    pub fn command(&self) -> Command<'_, T> {
        self.command_with_state(CommandState::default())
    }

    /// Start a new transaction from parameters collected elsewhere.
    pub fn command_with_state(&self, state: CommandState) -> Command<'_, T> {
        Command {
            transport: &self.transport,
            state,
        }
    }

    /// URL the cardholder is redirected to for entering card details.
    pub fn client_handler_url(&self, trans_id: &str) -> Result<Url, GatewayError> {
        let base = self.client_handler_url.as_ref().ok_or_else(|| {
            GatewayError::Config("no client handler URL configured".to_string())
        })?;
        redirect_url(base, trans_id)
    }
}

/// `client_handler_url` with the encoded `trans_id` query parameter appended.
pub fn redirect_url(client_handler_url: &Url, trans_id: &str) -> Result<Url, GatewayError> {
    let trans_id = non_empty(trans_id, Field::TransactionId)?;
    let mut url = client_handler_url.clone();
    url.query_pairs_mut().append_pair(TRANS_ID, trans_id);
    Ok(url)
}

/// Parameters of one in-flight transaction plus the operations that use them.
#[derive(Debug)]
pub struct Command<'a, T: Transport> {
    transport: &'a T,
    state: CommandState,
}

impl<'a, T: Transport> Command<'a, T> {
    /// Amount in minor currency units.
    pub fn amount(&mut self, amount: u64) -> &mut Self {
        self.state.amount = Some(amount);
        self
    }

    /// Numeric ISO 4217 currency code (498 for MDL).
    pub fn currency(&mut self, currency: u16) -> &mut Self {
        self.state.currency = Some(currency);
        self
    }

    pub fn client_ip(&mut self, client_ip: impl Into<String>) -> &mut Self {
        self.state.client_ip = Some(client_ip.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.state.description = Some(description.into());
        self
    }

    /// Two-letter ISO 639-1 language code for the payment page.
    pub fn language(&mut self, language: impl Into<String>) -> &mut Self {
        self.state.language = Some(language.into());
        self
    }

    pub fn state(&self) -> &CommandState {
        &self.state
    }

    /// Validate and assemble the payload for `op` without sending it.
    pub fn payload_for(&self, op: &Operation<'_>) -> Result<Payload, GatewayError> {
        self.state.payload_for(op)
    }

    /// Register a new SMS or DMS transaction.
    pub async fn create_transaction(
        &self,
        kind: TransactionType,
    ) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::CreateTransaction(kind)).await
    }

    pub async fn transaction_status(
        &self,
        trans_id: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::TransactionStatus { trans_id }).await
    }

    /// Capture a previously authorized DMS transaction.
    pub async fn commit_transaction(
        &self,
        trans_id: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::CommitTransaction { trans_id }).await
    }

    /// Register a card under `card_id` for later recurring payments.
    pub async fn register_card(&self, card_id: &str) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::RegisterCard { card_id }).await
    }

    pub async fn reverse_transaction(
        &self,
        trans_id: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::ReverseTransaction { trans_id }).await
    }

    pub async fn close_business_day(&self) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::CloseBusinessDay).await
    }

    /// Charge a card registered with [`Command::register_card`].
    pub async fn regular_payment(&self, card_id: &str) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::RegularPayment { card_id }).await
    }

    pub async fn delete_regular_payment(
        &self,
        card_id: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        self.execute(Operation::DeleteRegularPayment { card_id })
            .await
    }

    /// Validate, encode, send and parse.
    pub async fn execute(&self, op: Operation<'_>) -> Result<GatewayResponse, GatewayError> {
        let payload = self.payload_for(&op)?;

        tracing::debug!(
            operation = %op,
            command = op.command_code(),
            fields = ?payload.defined().map(|(name, _)| name).collect::<Vec<_>>(),
            "sending gateway command"
        );

        let raw = self.transport.send(payload.encode()).await.map_err(|e| {
            tracing::error!(operation = %op, error = %e, "gateway request failed");
            e
        })?;

        let response = parse_response(&raw).map_err(|e| {
            tracing::error!(operation = %op, error = %e, "gateway returned a malformed response");
            e
        })?;

        tracing::info!(
            operation = %op,
            result = response.get("result").unwrap_or("-"),
            result_code = response.result_code().unwrap_or("-"),
            "gateway command completed"
        );

        Ok(response)
    }
}
