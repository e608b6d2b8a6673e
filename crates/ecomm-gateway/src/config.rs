//! Gateway configuration: client identity, endpoints and TLS policy.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::constants::{
    DEFAULT_TIMEOUT, ENV_CERT_PASSPHRASE, ENV_CERT_PATH, ENV_CLIENT_HANDLER_URL,
    ENV_INSECURE_SKIP_VERIFY, ENV_MERCHANT_URL, ENV_TIMEOUT_SECS,
};
use crate::error::GatewayError;

/// Encoding of the client identity file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityFormat {
    /// PEM bundle holding the certificate chain and a private key, optionally
    /// encrypted with the passphrase.
    Pem,
    /// PKCS#12 / PFX archive protected by the passphrase.
    Pkcs12,
}

/// Immutable gateway configuration, built once at startup and shared
/// read-only by every command.
#[derive(Clone)]
pub struct GatewayConfig {
    identity: Vec<u8>,
    passphrase: String,
    merchant_url: Url,
    client_handler_url: Option<Url>,
    /// Skip server certificate verification. Defaults to `true`; the merchant
    /// endpoint is pinned operationally, not through CA trust.
    insecure_skip_verify: bool,
    timeout: Duration,
}

impl GatewayConfig {
    /// Build a config from identity bytes already in memory.
    pub fn new(
        identity: Vec<u8>,
        passphrase: impl Into<String>,
        merchant_url: &str,
    ) -> Result<Self, GatewayError> {
        if identity.is_empty() {
            return Err(GatewayError::Config("client identity is empty".to_string()));
        }

        Ok(Self {
            identity,
            passphrase: passphrase.into(),
            merchant_url: parse_https_url(merchant_url)?,
            client_handler_url: None,
            insecure_skip_verify: true,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read the certificate file (certificate and key in one PEM or PFX)
    /// and build a config around it.
    pub fn load(
        cert_path: impl AsRef<Path>,
        passphrase: impl Into<String>,
        merchant_url: &str,
    ) -> Result<Self, GatewayError> {
        let identity = std::fs::read(cert_path.as_ref())?;
        Self::new(identity, passphrase, merchant_url)
    }

    /// Load configuration from `ECOMM_*` environment variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let cert_path = var(ENV_CERT_PATH)
            .ok_or_else(|| GatewayError::Config(format!("{ENV_CERT_PATH} is required")))?;
        let merchant_url = var(ENV_MERCHANT_URL)
            .ok_or_else(|| GatewayError::Config(format!("{ENV_MERCHANT_URL} is required")))?;
        let passphrase = lookup(ENV_CERT_PASSPHRASE).unwrap_or_default();

        let mut config = Self::load(&cert_path, passphrase, &merchant_url)?;

        if let Some(url) = var(ENV_CLIENT_HANDLER_URL) {
            config = config.with_client_handler_url(&url)?;
        }

        if let Some(flag) = var(ENV_INSECURE_SKIP_VERIFY) {
            config.insecure_skip_verify = parse_bool(ENV_INSECURE_SKIP_VERIFY, &flag)?;
        }

        if let Some(secs) = var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                GatewayError::Config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds: {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the cardholder redirect endpoint.
    pub fn with_client_handler_url(mut self, url: &str) -> Result<Self, GatewayError> {
        self.client_handler_url = Some(parse_https_url(url)?);
        Ok(self)
    }

    pub fn with_insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn identity(&self) -> &[u8] {
        &self.identity
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn merchant_url(&self) -> &Url {
        &self.merchant_url
    }

    pub fn client_handler_url(&self) -> Option<&Url> {
        self.client_handler_url.as_ref()
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// PEM if the file starts with a PEM armor line, PKCS#12 otherwise.
    pub fn identity_format(&self) -> IdentityFormat {
        if self.identity.trim_ascii_start().starts_with(b"-----BEGIN") {
            IdentityFormat::Pem
        } else {
            IdentityFormat::Pkcs12
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("identity", &format_args!("<{} bytes>", self.identity.len()))
            .field("passphrase", &"<redacted>")
            .field("merchant_url", &self.merchant_url.as_str())
            .field(
                "client_handler_url",
                &self.client_handler_url.as_ref().map(Url::as_str),
            )
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_https_url(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| GatewayError::Config(format!("invalid URL '{raw}': {e}")))?;
    if url.scheme() != "https" {
        return Err(GatewayError::Config(format!(
            "URL '{raw}' must use https, got {}",
            url.scheme()
        )));
    }
    Ok(url)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, GatewayError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(GatewayError::Config(format!(
            "{name} must be true or false, got '{other}'"
        ))),
    }
}
