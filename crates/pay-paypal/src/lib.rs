//! # pay-paypal
//!
//! PayPal Express Checkout over the classic NVP API.
//!
//! The flow is three calls, sequenced by the caller:
//!
//! 1. **initiate_checkout** - `SetExpressCheckout`, returns the buyer
//!    redirect
//! 2. **fetch_checkout_details** - `GetExpressCheckoutDetails` for a token
//! 3. **complete_payment** - reads the token from the return request and
//!    issues `DoExpressCheckoutPayment` unless the payment is already done
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_core::{LineItem, LineItemCart};
//! use pay_paypal::ExpressCheckout;
//!
//! // Credentials from PAYPAL_* environment variables
//! let checkout = ExpressCheckout::from_env()?
//!     .with_return_address("https://shop.cz/paypal/return", None);
//!
//! let cart = LineItemCart::new().with_item(LineItem::new("Rang Play RS", 2999, 1));
//! let target = checkout.initiate_checkout(&cart).await?;
//!
//! // Redirect the buyer to target.approval_url
//! ```
//!
//! ## Completing
//!
//! ```rust,ignore
//! // In the return handler, with the query string PayPal appended:
//! let url = url::Url::parse(&full_return_url)?;
//! match checkout.complete_payment(&url).await? {
//!     PaymentOutcome::Completed(payment) => fulfil(payment.transaction_id()),
//!     PaymentOutcome::AlreadyCompleted(details) => show_receipt(details),
//! }
//! ```

pub mod checkout;
pub mod config;
pub mod transport;

// Re-exports
pub use checkout::{ExpressCheckout, RETURN_TOKEN_PARAM};
pub use config::{
    CredentialContext, Endpoints, PayPalConfig, PayPalCredentials, API_VERSION,
    DEFAULT_CURRENCY, DEFAULT_TIMEOUT_SECS, LIVE_API_HOST, LIVE_GATE_URL, SANDBOX_API_HOST,
    SANDBOX_GATE_URL,
};
pub use transport::ReqwestTransport;
