//! # Checkout Error Types
//!
//! Typed error handling for the Express Checkout client.
//! All checkout operations return `Result<T, CheckoutError>`.

use crate::nvp::{NvpFields, NvpResponse};
use thiserror::Error;

/// Failure raised by a [`Transport`](crate::transport::Transport) before a
/// usable response body was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, TCP or TLS handshake failure
    #[error("connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    /// No response within the transport timeout
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Endpoint answered with a non-2xx status
    #[error("{url} responded with HTTP {status}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Anything else the HTTP client reports
    #[error("transport failure: {message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TransportError {
    /// Wrap an arbitrary client error
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TransportError::Other {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// HTTP status, when the endpoint answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Missing or invalid credentials/settings, raised before any network activity
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The buyer's return request carried no checkout token
    #[error("Missing checkout token in return request")]
    MissingToken,

    /// Transport-level failure talking to PayPal
    #[error("Communication with PayPal failed: {source}")]
    Communication {
        #[source]
        source: TransportError,
        request: NvpFields,
    },

    /// `SetExpressCheckout` answered with a non-success ACK
    #[error("Checkout initiation failed: {}", api_failure_summary(.response))]
    CheckoutInitiation {
        response: NvpResponse,
        request: NvpFields,
    },

    /// `DoExpressCheckoutPayment` answered with a non-success ACK
    #[error("Payment completion failed: {}", api_failure_summary(.response))]
    PaymentCompletion {
        response: NvpResponse,
        request: NvpFields,
    },
}

fn api_failure_summary(response: &NvpResponse) -> String {
    let ack = response.ack().unwrap_or("<no ACK>");
    match response.errors().first() {
        Some(err) => format!(
            "ACK={} [{}] {}",
            ack,
            err.code,
            err.long_message.as_deref().or(err.short_message.as_deref()).unwrap_or("")
        ),
        None => format!("ACK={}", ack),
    }
}

impl CheckoutError {
    /// Fields that were sent with the failing request, if a request was made.
    ///
    /// Credential fields are included verbatim; use
    /// [`NvpFields::redacted`] before logging them.
    pub fn request(&self) -> Option<&NvpFields> {
        match self {
            CheckoutError::Communication { request, .. }
            | CheckoutError::CheckoutInitiation { request, .. }
            | CheckoutError::PaymentCompletion { request, .. } => Some(request),
            _ => None,
        }
    }

    /// Decoded PayPal response for API-level rejections
    pub fn response(&self) -> Option<&NvpResponse> {
        match self {
            CheckoutError::CheckoutInitiation { response, .. }
            | CheckoutError::PaymentCompletion { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns true if a caller-side retry is reasonable.
    ///
    /// Only connection failures and timeouts qualify. API rejections are
    /// never retryable, and nothing here retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Communication {
                source: TransportError::Connect { .. } | TransportError::Timeout { .. },
                ..
            }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::MissingToken => 400,
            CheckoutError::Communication { .. } => 502,
            CheckoutError::CheckoutInitiation { .. } | CheckoutError::PaymentCompletion { .. } => {
                402
            }
        }
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
