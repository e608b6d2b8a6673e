//! Delivery of encoded commands to the merchant handler.

use std::future::Future;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::config::GatewayConfig;
use crate::constants::FORM_CONTENT_TYPE;
use crate::error::{GatewayError, TransportError};
use crate::identity::{client_identity, TlsBackend};

/// Sends one form-encoded body and returns the raw response text.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        body: String,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// HTTPS transport authenticating with the configured client certificate.
///
/// Wraps `reqwest::Client`. PEM identities (encrypted keys included) go
/// through rustls; PKCS#12 archives go through native-tls.
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    http: reqwest::Client,
    config: Arc<GatewayConfig>,
    tls_backend: TlsBackend,
}

impl HttpsTransport {
    pub fn new(config: Arc<GatewayConfig>) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.timeout());

        let (identity, tls_backend) = client_identity(&config)?;
        builder = match tls_backend {
            TlsBackend::Rustls => builder.use_rustls_tls(),
            TlsBackend::NativeTls => builder.use_native_tls(),
        }
        .identity(identity);

        if config.insecure_skip_verify() {
            tracing::warn!(
                endpoint = %config.merchant_url(),
                "server certificate verification is disabled (insecure_skip_verify)"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            tls_backend,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn tls_backend(&self) -> TlsBackend {
        self.tls_backend
    }
}

impl Transport for HttpsTransport {
    async fn send(&self, body: String) -> Result<String, TransportError> {
        let resp = self
            .http
            .post(self.config.merchant_url().clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        check_status(status, text)
    }
}

/// Pass a 2xx body through; anything else becomes [`TransportError::Status`].
fn check_status(status: StatusCode, body: String) -> Result<String, TransportError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERCHANT_URL: &str = "https://gateway.example.com/ecomm/MerchantHandler";
    const PASSPHRASE: &str = "fixture-pass";

    fn transport(identity: &[u8], passphrase: &str) -> Result<HttpsTransport, GatewayError> {
        let config = GatewayConfig::new(identity.to_vec(), passphrase, MERCHANT_URL)?;
        HttpsTransport::new(Arc::new(config))
    }

    #[test]
    fn builds_from_plain_pem() {
        let transport = transport(include_bytes!("../tests/fixtures/client.pem"), "").unwrap();
        assert_eq!(transport.tls_backend(), TlsBackend::Rustls);
    }

    #[test]
    fn builds_from_pem_with_encrypted_key() {
        let transport = transport(
            include_bytes!("../tests/fixtures/client-encrypted.pem"),
            PASSPHRASE,
        )
        .unwrap();
        assert_eq!(transport.tls_backend(), TlsBackend::Rustls);
    }

    #[test]
    fn builds_from_pkcs12() {
        let transport =
            transport(include_bytes!("../tests/fixtures/client.p12"), PASSPHRASE).unwrap();
        assert_eq!(transport.tls_backend(), TlsBackend::NativeTls);
    }

    #[test]
    fn bad_identity_is_config_error() {
        let err = transport(b"-----BEGIN CERTIFICATE-----\nMIIB\n", "").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));

        let err = transport(&[0x30, 0x82, 0x00, 0x01], PASSPHRASE).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn builds_with_and_without_certificate_verification() {
        let identity = include_bytes!("../tests/fixtures/client.pem").to_vec();
        for skip in [true, false] {
            let config = GatewayConfig::new(identity.clone(), "", MERCHANT_URL)
                .unwrap()
                .with_insecure_skip_verify(skip);
            let transport = HttpsTransport::new(Arc::new(config)).unwrap();
            assert_eq!(transport.config().insecure_skip_verify(), skip);
        }
    }

    #[test]
    fn success_status_passes_body_through() {
        let body = check_status(StatusCode::OK, "RESULT: OK".to_string()).unwrap();
        assert_eq!(body, "RESULT: OK");
    }

    #[test]
    fn non_success_status_is_status_error() {
        for code in [
            StatusCode::MOVED_PERMANENTLY,
            StatusCode::FORBIDDEN,
            StatusCode::BAD_GATEWAY,
        ] {
            let err = check_status(code, "denied".to_string()).unwrap_err();
            match err {
                TransportError::Status { status, body } => {
                    assert_eq!(status, code.as_u16());
                    assert_eq!(body, "denied");
                }
                other => panic!("expected Status error, got {other:?}"),
            }
        }
    }
}
