//! # Transport Seam
//!
//! The engine talks to PayPal only through the [`Transport`] trait, and
//! reads the buyer's return request only through [`ReturnQuery`]. Both
//! are swapped for stubs in tests.
//!
//! ```text
//! ┌────────────────┐   TransportRequest    ┌──────────────────┐
//! │ ExpressCheckout│ ────────────────────▶ │ Transport (trait)│ ──▶ PayPal NVP
//! │    (engine)    │ ◀──────────────────── │  ReqwestTransport│
//! └────────────────┘ TransportResponse/Err └──────────────────┘
//! ```

use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One outbound NVP call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// API endpoint
    pub url: String,
    /// Form-urlencoded body
    pub body: String,
    /// Skip certificate verification. Only ever set for sandbox hosts.
    pub accept_invalid_certs: bool,
}

/// Diagnostics about a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportInfo {
    pub url: String,
    pub status: Option<u16>,
    pub elapsed: Duration,
}

/// Raw response body plus diagnostics
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub body: String,
    pub info: TransportInfo,
}

/// HTTPS POST primitive the engine depends on.
///
/// Implementations must be safe to share between tasks; the engine issues
/// exactly one `send` per remote operation and never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Type alias for a shared transport (dynamic dispatch)
pub type SharedTransport = Arc<dyn Transport>;

/// Query parameters of the request PayPal redirected the buyer back with
pub trait ReturnQuery {
    fn query_param(&self, name: &str) -> Option<String>;
}

impl ReturnQuery for HashMap<String, String> {
    fn query_param(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl ReturnQuery for url::Url {
    fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl<T: ReturnQuery + ?Sized> ReturnQuery for &T {
    fn query_param(&self, name: &str) -> Option<String> {
        (**self).query_param(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_map() {
        let mut query = HashMap::new();
        query.insert("token".to_string(), "EC-9".to_string());

        assert_eq!(query.query_param("token"), Some("EC-9".to_string()));
        assert_eq!(query.query_param("PayerID"), None);
    }

    #[test]
    fn test_query_from_url() {
        let url = url::Url::parse("https://shop.cz/checkout/return?token=EC-9&PayerID=ABC").unwrap();

        assert_eq!(url.query_param("token"), Some("EC-9".to_string()));
        assert_eq!(url.query_param("PayerID"), Some("ABC".to_string()));
        assert_eq!(url.query_param("missing"), None);
    }
}
