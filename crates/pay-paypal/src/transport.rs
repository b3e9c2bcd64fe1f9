//! # HTTPS Transport
//!
//! reqwest-backed [`Transport`] for the NVP endpoints.
//!
//! PayPal's NVP gateway historically required `CURL_SSLVERSION_TLSv1`,
//! i.e. "any TLS 1.x". The clients here allow TLS 1.0 and later; the
//! rustls backend then negotiates the highest version both sides speak.

use async_trait::async_trait;
use pay_core::{
    CheckoutError, CheckoutResult, Transport, TransportError, TransportInfo, TransportRequest,
    TransportResponse,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{tls, Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, error};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP transport with a verifying and a non-verifying client.
///
/// The non-verifying client is only used when the request explicitly asks
/// for it, which the engine does for sandbox hosts alone.
pub struct ReqwestTransport {
    verified: Client,
    relaxed: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> CheckoutResult<Self> {
        let verified = Self::builder(timeout).build().map_err(|e| {
            CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        let relaxed = Self::builder(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create sandbox HTTP client: {}", e))
            })?;

        Ok(Self { verified, relaxed })
    }

    fn builder(timeout: Duration) -> ClientBuilder {
        Client::builder()
            .timeout(timeout)
            .min_tls_version(tls::Version::TLS_1_0)
    }

    fn client_for(&self, request: &TransportRequest) -> &Client {
        if request.accept_invalid_certs {
            &self.relaxed
        } else {
            &self.verified
        }
    }
}

fn classify(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        TransportError::other(err)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let started = Instant::now();

        debug!(
            "POST {} ({} bytes, verify_certs={})",
            request.url,
            request.body.len(),
            !request.accept_invalid_certs
        );

        let response = self
            .client_for(request)
            .post(&request.url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| classify(&request.url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify(&request.url, e))?;

        if !status.is_success() {
            error!("PayPal NVP HTTP error: status={}, body={}", status, body);
            return Err(TransportError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(TransportResponse {
            body,
            info: TransportInfo {
                url: request.url.clone(),
                status: Some(status.as_u16()),
                elapsed: started.elapsed(),
            },
        })
    }
}
