use std::time::Duration;

// Request field names.
pub const COMMAND: &str = "command";
pub const MSG_TYPE: &str = "msg_type";
pub const AMOUNT: &str = "amount";
pub const CURRENCY: &str = "currency";
pub const CLIENT_IP_ADDR: &str = "client_ip_addr";
pub const DESCRIPTION: &str = "description";
pub const LANGUAGE: &str = "language";
pub const TRANS_ID: &str = "trans_id";
pub const BILLER_CLIENT_ID: &str = "biller_client_id";
pub const PERSPAYEE_EXPIRY: &str = "perspayee_expiry";
pub const PERSPAYEE_GEN: &str = "perspayee_gen";
pub const PERSPAYEE_OVERWRITE: &str = "perspayee_overwrite";

/// Expiry (MMYY) sent when registering a card for recurring payments.
pub const PERSPAYEE_EXPIRY_VALUE: &str = "1299";

/// Message type sent with card registration.
pub const REGISTER_CARD_MSG_TYPE: &str = "AUTH";

/// Content type of every request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// Environment variables read by `GatewayConfig::from_env`.
pub const ENV_CERT_PATH: &str = "ECOMM_CERT_PATH";
pub const ENV_CERT_PASSPHRASE: &str = "ECOMM_CERT_PASSPHRASE";
pub const ENV_MERCHANT_URL: &str = "ECOMM_MERCHANT_URL";
pub const ENV_CLIENT_HANDLER_URL: &str = "ECOMM_CLIENT_HANDLER_URL";
pub const ENV_INSECURE_SKIP_VERIFY: &str = "ECOMM_INSECURE_SKIP_VERIFY";
pub const ENV_TIMEOUT_SECS: &str = "ECOMM_TIMEOUT_SECS";
