//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the Express Checkout client and the server configuration.

use pay_core::LoggingObserver;
use pay_paypal::{ExpressCheckout, PayPalConfig};
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

/// Path PayPal sends the buyer back to after approval
pub const RETURN_PATH: &str = "/checkout/return";
/// Path PayPal sends the buyer to after cancelling
pub const CANCEL_PATH: &str = "/checkout/cancel";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used for the PayPal return/cancel callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Default PayPal return URL
    pub fn return_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), RETURN_PATH)
    }

    /// Default PayPal cancel URL
    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CANCEL_PATH)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PayPal Express Checkout client
    pub checkout: Arc<ExpressCheckout>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create the state from environment variables (`PAYPAL_*`, `HOST`, ...)
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let mut paypal = PayPalConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load PayPal config: {}", e))?;
        paypal.return_url.get_or_insert_with(|| config.return_url());
        paypal.cancel_url.get_or_insert_with(|| config.cancel_url());

        let checkout = ExpressCheckout::from_config(&paypal)
            .map_err(|e| anyhow::anyhow!("Failed to initialize PayPal: {}", e))?
            .with_observer(Arc::new(LoggingObserver));

        Ok(Self::from_parts(config, checkout))
    }

    /// Assemble state from an already built client.
    ///
    /// A client without a return address gets the server's callback URLs.
    pub fn from_parts(config: AppConfig, mut checkout: ExpressCheckout) -> Self {
        if checkout.return_url().is_empty() {
            checkout.set_return_address(config.return_url(), Some(config.cancel_url()));
        }

        Self {
            checkout: Arc::new(checkout),
            config,
        }
    }
}
